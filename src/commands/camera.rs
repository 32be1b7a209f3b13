use super::ControllerState;
use crate::controller::{CameraView, ZoomChange};
use crate::negotiator::MacroOutcome;
use crate::types::{Facing, TrackSettings};
use tauri::{command, State};

/// Open the camera, rear-facing unless told otherwise
#[command]
pub async fn open_camera(
    state: State<'_, ControllerState>,
    facing: Option<Facing>,
) -> Result<CameraView, String> {
    let mut controller = state.lock().await;
    controller
        .open_camera(facing.unwrap_or_default())
        .await
        .map_err(|e| {
            log::error!("Failed to open camera: {}", e);
            e.user_message()
        })
}

#[command]
pub async fn close_camera(state: State<'_, ControllerState>) -> Result<(), String> {
    state.lock().await.close_camera();
    Ok(())
}

#[command]
pub async fn switch_camera(
    state: State<'_, ControllerState>,
    device_id: String,
) -> Result<CameraView, String> {
    let mut controller = state.lock().await;
    controller.switch_camera(&device_id).await.map_err(|e| {
        log::error!("Failed to switch to camera {}: {}", device_id, e);
        e.user_message()
    })
}

/// Cycle to the next enumerated camera
#[command]
pub async fn next_camera(state: State<'_, ControllerState>) -> Result<CameraView, String> {
    let mut controller = state.lock().await;
    controller.next_camera().await.map_err(|e| e.user_message())
}

#[command]
pub async fn zoom_in(state: State<'_, ControllerState>) -> Result<ZoomChange, String> {
    Ok(state.lock().await.zoom_in().await)
}

#[command]
pub async fn zoom_out(state: State<'_, ControllerState>) -> Result<ZoomChange, String> {
    Ok(state.lock().await.zoom_out().await)
}

#[command]
pub async fn enable_macro(state: State<'_, ControllerState>) -> Result<MacroOutcome, String> {
    Ok(state.lock().await.enable_macro().await)
}

/// Realized settings of the live track, if any
#[command]
pub async fn get_track_settings(
    state: State<'_, ControllerState>,
) -> Result<Option<TrackSettings>, String> {
    Ok(state.lock().await.settings())
}
