use super::ControllerState;
use crate::controller::Submission;
use crate::report::{format_report, ReportRecord};
use tauri::{command, State};

/// Replace the form fields sent by the webview
#[command]
pub async fn update_report(
    state: State<'_, ControllerState>,
    fields: ReportRecord,
) -> Result<(), String> {
    state.lock().await.update_fields(fields);
    Ok(())
}

/// Toggle the round-inspection preset, returning the updated fields
#[command]
pub async fn set_round_inspection(
    state: State<'_, ControllerState>,
    enabled: bool,
) -> Result<ReportRecord, String> {
    Ok(state.lock().await.set_round(enabled))
}

/// Render the report text without sending it
#[command]
pub async fn preview_report(state: State<'_, ControllerState>) -> Result<String, String> {
    let controller = state.lock().await;
    Ok(format_report(
        controller.form().record(),
        chrono::Local::now().date_naive(),
    ))
}

#[command]
pub async fn submit_report(
    state: State<'_, ControllerState>,
    user_agent: Option<String>,
) -> Result<Submission, String> {
    let mut controller = state.lock().await;
    match controller.submit(user_agent.as_deref()).await {
        Ok(submission) => Ok(submission),
        Err(e) => {
            log::warn!("Report submission refused: {}", e);
            Err(e.user_message())
        }
    }
}
