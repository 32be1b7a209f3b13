pub mod camera;
pub mod capture;
pub mod config;
pub mod init;
pub mod report;

pub use camera::*;
pub use capture::*;
pub use config::*;
pub use init::*;
pub use report::*;

use crate::controller::ReportController;

/// Managed Tauri state wrapping the single report controller
pub type ControllerState = tokio::sync::Mutex<ReportController>;
