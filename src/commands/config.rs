use super::ControllerState;
use crate::config::SiteReportConfig;
use std::sync::{Arc, RwLock};
use tauri::{command, State};

lazy_static::lazy_static! {
    static ref GLOBAL_CONFIG: Arc<RwLock<SiteReportConfig>> = Arc::new(RwLock::new(SiteReportConfig::load_or_default()));
}

/// Configuration currently in effect
pub fn current_config() -> SiteReportConfig {
    GLOBAL_CONFIG
        .read()
        .map(|c| c.clone())
        .unwrap_or_default()
}

fn store(state: &SiteReportConfig) -> Result<(), String> {
    let mut config = GLOBAL_CONFIG
        .write()
        .map_err(|e| format!("Failed to write config: {}", e))?;
    *config = state.clone();
    Ok(())
}

#[command]
pub async fn get_config() -> Result<SiteReportConfig, String> {
    let config = GLOBAL_CONFIG.read().map_err(|e| e.to_string())?;
    Ok(config.clone())
}

/// Validate, persist and apply a new configuration
#[command]
pub async fn update_config(
    state: State<'_, ControllerState>,
    new_config: SiteReportConfig,
) -> Result<(), String> {
    new_config.validate()?;
    store(&new_config)?;

    new_config
        .save_to_file(SiteReportConfig::default_path())
        .map_err(|e| e.to_string())?;

    state.lock().await.set_config(new_config);
    Ok(())
}

#[command]
pub async fn reset_config(
    state: State<'_, ControllerState>,
) -> Result<SiteReportConfig, String> {
    let default_config = SiteReportConfig::default();
    store(&default_config)?;

    default_config
        .save_to_file(SiteReportConfig::default_path())
        .map_err(|e| e.to_string())?;

    state.lock().await.set_config(default_config.clone());
    Ok(default_config)
}
