//! Single owner of the report flow: camera session, pending preview,
//! attached photo and form state.

use crate::config::SiteReportConfig;
use crate::controls::{ControlSet, ZoomStepper};
use crate::digitizer::{FrameDigitizer, ImageArtifact};
use crate::errors::ReportError;
use crate::media::MediaDevices;
use crate::negotiator::{CaptureNegotiator, MacroOutcome};
use crate::report::{format_report, FormState, ReportRecord};
use crate::session::SessionInfo;
use crate::share::{DeviceClass, ShareDependencies, ShareDispatcher, ShareOutcome};
use crate::types::{Facing, TrackSettings};
use chrono::Local;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// What the camera modal needs to render after an open or switch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CameraView {
    pub session: SessionInfo,
    pub controls: ControlSet,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZoomChange {
    pub factor: f64,
    pub applied: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Submission {
    pub text: String,
    pub outcome: ShareOutcome,
    pub message: String,
}

pub struct ReportController {
    negotiator: CaptureNegotiator,
    pending: Option<ImageArtifact>,
    form: FormState,
    zoom: ZoomStepper,
    config: SiteReportConfig,
    share: ShareDependencies,
}

impl ReportController {
    pub fn new(devices: Arc<dyn MediaDevices>, config: SiteReportConfig) -> Self {
        let share = ShareDependencies::for_storage(&config.storage);
        Self {
            negotiator: CaptureNegotiator::new(devices, config.camera.clone()),
            pending: None,
            form: FormState::new(),
            zoom: ZoomStepper::from_config(&config.camera),
            config,
            share,
        }
    }

    pub fn with_share_dependencies(mut self, share: ShareDependencies) -> Self {
        self.share = share;
        self
    }

    pub fn config(&self) -> &SiteReportConfig {
        &self.config
    }

    /// Takes effect on the next camera open
    pub fn set_config(&mut self, config: SiteReportConfig) {
        self.negotiator.set_config(config.camera.clone());
        self.zoom = ZoomStepper::from_config(&config.camera);
        if config.storage != self.config.storage {
            self.share = ShareDependencies::for_storage(&config.storage);
        }
        self.config = config;
    }

    pub fn negotiator(&self) -> &CaptureNegotiator {
        &self.negotiator
    }

    pub fn form(&self) -> &FormState {
        &self.form
    }

    pub fn pending_photo(&self) -> Option<&ImageArtifact> {
        self.pending.as_ref()
    }

    pub fn attached_photo(&self) -> Option<&ImageArtifact> {
        self.form.record().photo.as_ref()
    }

    fn camera_view(&self) -> Result<CameraView, ReportError> {
        let session = self
            .negotiator
            .session()
            .ok_or_else(|| ReportError::SourceNotReady("camera is not open".to_string()))?;
        let info = session.info();
        let controls = ControlSet::for_session(&info.capabilities, info.cameras.len());
        Ok(CameraView {
            session: info,
            controls,
        })
    }

    pub async fn open_camera(&mut self, facing: Facing) -> Result<CameraView, ReportError> {
        self.pending = None;
        self.zoom.reset();
        self.negotiator.open(facing).await?;
        self.camera_view()
    }

    pub async fn switch_camera(&mut self, device_id: &str) -> Result<CameraView, ReportError> {
        self.pending = None;
        self.zoom.reset();
        self.negotiator.switch_device(device_id).await?;
        self.camera_view()
    }

    pub async fn next_camera(&mut self) -> Result<CameraView, ReportError> {
        self.pending = None;
        self.zoom.reset();
        self.negotiator.next_device().await?;
        self.camera_view()
    }

    /// Digitize the current frame into the pending preview
    pub fn capture_photo(&mut self) -> Result<ImageArtifact, ReportError> {
        let session = self
            .negotiator
            .session()
            .ok_or_else(|| ReportError::SourceNotReady("camera is not open".to_string()))?;
        let digitizer =
            FrameDigitizer::from_config(&self.config.capture, session.profile().capture_quality());
        let artifact = digitizer.capture_frame(session.track())?;
        self.pending = Some(artifact.clone());
        Ok(artifact)
    }

    /// Drop the preview and keep the camera running
    pub fn retake(&mut self) {
        if self.pending.take().is_some() {
            log::debug!("Pending photo discarded");
        }
    }

    /// Attach the pending preview to the report and close the camera
    pub fn confirm_photo(&mut self) -> Result<ImageArtifact, ReportError> {
        let artifact = self
            .pending
            .take()
            .ok_or_else(|| ReportError::SourceNotReady("no photo captured".to_string()))?;
        self.form.attach_photo(artifact.clone());
        self.negotiator.close();
        log::info!("Photo {} attached to report", artifact.id);
        Ok(artifact)
    }

    pub fn remove_photo(&mut self) -> Option<ImageArtifact> {
        self.form.take_photo()
    }

    pub fn close_camera(&mut self) {
        self.pending = None;
        self.negotiator.close();
    }

    pub async fn zoom_in(&mut self) -> ZoomChange {
        let factor = self.zoom.zoom_in();
        let applied = self.negotiator.set_zoom(factor).await;
        ZoomChange { factor, applied }
    }

    pub async fn zoom_out(&mut self) -> ZoomChange {
        let factor = self.zoom.zoom_out();
        let applied = self.negotiator.set_zoom(factor).await;
        ZoomChange { factor, applied }
    }

    pub async fn enable_macro(&self) -> MacroOutcome {
        self.negotiator.enable_macro().await
    }

    pub fn settings(&self) -> Option<TrackSettings> {
        self.negotiator.settings()
    }

    pub fn update_fields(&mut self, fields: ReportRecord) {
        self.form.update_fields(fields);
    }

    pub fn set_round(&mut self, enabled: bool) -> ReportRecord {
        self.form.set_round(enabled, &self.config.round);
        self.form.record().clone()
    }

    /// Validate, stamp, format and deliver the report.
    ///
    /// The attached photo is released once delivery reaches the user.
    pub async fn submit(&mut self, user_agent: Option<&str>) -> Result<Submission, ReportError> {
        let now = Local::now();
        self.form.record().ready_for_submission()?;
        self.form.record_mut().stamp_times(now.time());

        let record = self.form.record();
        let text = format_report(record, now.date_naive());
        let photo = record.ready_for_submission()?.clone();
        let device = DeviceClass::from_user_agent(user_agent);

        let dispatcher = ShareDispatcher::new(self.share.clone(), self.config.share.clone());
        let outcome = dispatcher.deliver(&text, &photo, device).await;
        if outcome.delivered() {
            self.form.take_photo();
        }

        log::info!("Report submitted: {:?}", outcome);
        Ok(Submission {
            message: outcome.user_message(),
            text,
            outcome,
        })
    }
}
