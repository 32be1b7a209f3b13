use super::ControllerState;
use crate::digitizer::ImageArtifact;
use tauri::{command, State};

/// Digitize the current frame into the preview slot
#[command]
pub async fn capture_photo(state: State<'_, ControllerState>) -> Result<ImageArtifact, String> {
    let mut controller = state.lock().await;
    match controller.capture_photo() {
        Ok(artifact) => Ok(artifact),
        Err(e) => {
            log::error!("Failed to capture photo: {}", e);
            Err(e.user_message())
        }
    }
}

#[command]
pub async fn retake_photo(state: State<'_, ControllerState>) -> Result<(), String> {
    state.lock().await.retake();
    Ok(())
}

/// Attach the preview to the report and close the camera
#[command]
pub async fn confirm_photo(state: State<'_, ControllerState>) -> Result<ImageArtifact, String> {
    let mut controller = state.lock().await;
    controller.confirm_photo().map_err(|e| e.user_message())
}

#[command]
pub async fn remove_photo(state: State<'_, ControllerState>) -> Result<bool, String> {
    Ok(state.lock().await.remove_photo().is_some())
}

#[command]
pub async fn get_attached_photo(
    state: State<'_, ControllerState>,
) -> Result<Option<ImageArtifact>, String> {
    Ok(state.lock().await.attached_photo().cloned())
}
