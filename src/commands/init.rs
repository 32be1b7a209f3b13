use crate::platform;
use crate::types::{MediaDeviceInfo, Platform};
use tauri::command;

/// Video inputs visible to the native backend
#[command]
pub async fn get_available_cameras() -> Result<Vec<MediaDeviceInfo>, String> {
    let result = tokio::task::spawn_blocking(platform::list_cameras)
        .await
        .map_err(|e| format!("Task join error: {}", e))?;

    match result {
        Ok(cameras) => {
            log::info!("Found {} cameras", cameras.len());
            for camera in &cameras {
                log::debug!("Camera: {} - {}", camera.device_id, camera.display_label());
            }
            Ok(cameras)
        }
        Err(e) => {
            log::error!("Failed to list cameras: {}", e);
            Err(format!("Failed to list cameras: {}", e))
        }
    }
}

#[command]
pub async fn get_current_platform() -> Result<String, String> {
    Ok(Platform::current().as_str().to_string())
}
