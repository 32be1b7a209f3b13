//! sitereport: camera-backed field service reports for Tauri applications
//!
//! A field worker photographs a work site, attaches the photo to a short
//! structured report, and pushes the formatted report to a messaging app.
//! The webview owns the form; this crate owns camera negotiation, still
//! capture, report assembly and delivery.
//!
//! # Usage
//! ```rust,ignore
//! fn main() {
//!     tauri::Builder::default()
//!         .plugin(sitereport::init())
//!         .run(tauri::generate_context!())
//!         .expect("error while running tauri application");
//! }
//! ```
pub mod commands;
pub mod config;
pub mod controller;
pub mod controls;
pub mod digitizer;
pub mod errors;
pub mod media;
pub mod negotiator;
pub mod platform;
pub mod report;
pub mod session;
pub mod share;
pub mod types;

// Testing utilities - scripted backend and synthetic frames
pub mod testing;

pub use config::SiteReportConfig;
pub use controller::ReportController;
pub use digitizer::{FrameDigitizer, ImageArtifact};
pub use errors::ReportError;
pub use negotiator::CaptureNegotiator;
pub use report::{format_report, ReportRecord};
pub use share::{ShareDispatcher, ShareOutcome};
pub use types::Platform;

use std::sync::Arc;
use tauri::{
    plugin::{Builder, TauriPlugin},
    Manager, Runtime,
};

/// Initialize the sitereport plugin with all commands
pub fn init<R: Runtime>() -> TauriPlugin<R> {
    Builder::new("sitereport")
        .invoke_handler(tauri::generate_handler![
            // Device commands
            commands::init::get_available_cameras,
            commands::init::get_current_platform,
            // Camera session commands
            commands::camera::open_camera,
            commands::camera::close_camera,
            commands::camera::switch_camera,
            commands::camera::next_camera,
            commands::camera::zoom_in,
            commands::camera::zoom_out,
            commands::camera::enable_macro,
            commands::camera::get_track_settings,
            // Capture commands
            commands::capture::capture_photo,
            commands::capture::retake_photo,
            commands::capture::confirm_photo,
            commands::capture::remove_photo,
            commands::capture::get_attached_photo,
            // Report commands
            commands::report::update_report,
            commands::report::set_round_inspection,
            commands::report::preview_report,
            commands::report::submit_report,
            // Configuration commands
            commands::config::get_config,
            commands::config::update_config,
            commands::config::reset_config,
        ])
        .setup(|app, _api| {
            let controller = ReportController::new(
                Arc::new(platform::NativeMediaDevices::new()),
                commands::config::current_config(),
            );
            app.manage(commands::ControllerState::new(controller));
            log::info!("sitereport plugin ready on {}", Platform::current().as_str());
            Ok(())
        })
        .build()
}

pub fn current_platform() -> Platform {
    Platform::current()
}

/// Initialize env_logger, defaulting to `sitereport=info`
pub fn init_logging() {
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "sitereport=info");
    }
    let _ = env_logger::try_init();
}

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
pub const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");

pub fn get_info() -> CrateInfo {
    CrateInfo {
        name: NAME.to_string(),
        version: VERSION.to_string(),
        description: DESCRIPTION.to_string(),
        platform: Platform::current(),
    }
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct CrateInfo {
    pub name: String,
    pub version: String,
    pub description: String,
    pub platform: Platform,
}
