//! Capture negotiation.
//!
//! Opens a device stream by walking an ordered ladder of constraint
//! candidates, snapshots what the granted track can do, and drives the
//! zoom/macro/device-switch controls gated by that snapshot. At most one
//! [`CaptureSession`] is live; every open releases the previous one first.

use crate::config::CameraConfig;
use crate::errors::ReportError;
use crate::media::{MediaDevices, MediaTrack};
use crate::session::CaptureSession;
use crate::types::{
    CapabilitySet, ConstraintBundle, DeviceSelector, DimensionConstraint, ExposureMode, Facing,
    FocusMode, MediaConstraints, MediaDeviceInfo, NegotiatedProfile, NumericRange,
    TrackSettings, WhiteBalanceMode,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

const DEFAULT_ZOOM_MIN: f64 = 1.0;
const DEFAULT_ZOOM_MAX: f64 = 5.0;

/// One rung of the acquisition ladder
#[derive(Debug, Clone, PartialEq)]
pub struct ConstraintCandidate {
    pub profile: NegotiatedProfile,
    pub constraints: MediaConstraints,
}

/// Which focus strategy `enable_macro` managed to apply
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MacroOutcome {
    Macro,
    ManualNearFocus,
    Unsupported,
}

impl MacroOutcome {
    pub fn succeeded(&self) -> bool {
        !matches!(self, MacroOutcome::Unsupported)
    }
}

/// Advanced bundles in priority order: macro, manual near focus, continuous
pub fn advanced_bundles(config: &CameraConfig) -> Vec<ConstraintBundle> {
    vec![
        ConstraintBundle::focus(FocusMode::Macro)
            .with_exposure(ExposureMode::Continuous, None)
            .with_white_balance(WhiteBalanceMode::Continuous),
        ConstraintBundle::manual_focus(config.near_focus_distance)
            .with_exposure(ExposureMode::Manual, Some(config.manual_exposure_time)),
        ConstraintBundle::focus(FocusMode::Continuous)
            .with_exposure(ExposureMode::Continuous, None),
    ]
}

/// Ordered candidates for opening a camera by facing
pub fn constraint_ladder(facing: Facing, config: &CameraConfig) -> Vec<ConstraintCandidate> {
    let [ideal_w, ideal_h] = config.ideal_resolution;
    let [max_w, max_h] = config.max_resolution;
    let [base_w, base_h] = config.baseline_resolution;

    vec![
        ConstraintCandidate {
            profile: NegotiatedProfile::Advanced,
            constraints: MediaConstraints::new(DeviceSelector::Facing(facing))
                .with_size(
                    DimensionConstraint::ideal_max(ideal_w, max_w),
                    DimensionConstraint::ideal_max(ideal_h, max_h),
                )
                .with_frame_rate(config.frame_rate)
                .with_advanced(advanced_bundles(config)),
        },
        ConstraintCandidate {
            profile: NegotiatedProfile::Baseline,
            constraints: MediaConstraints::new(DeviceSelector::Facing(facing)).with_size(
                DimensionConstraint::ideal(base_w),
                DimensionConstraint::ideal(base_h),
            ),
        },
    ]
}

/// Single candidate bound to an explicit device
pub fn device_candidate(device_id: &str, config: &CameraConfig) -> ConstraintCandidate {
    let [w, h] = config.device_resolution;
    ConstraintCandidate {
        profile: NegotiatedProfile::DeviceBound,
        constraints: MediaConstraints::new(DeviceSelector::Exact(device_id.to_string()))
            .with_size(DimensionConstraint::ideal(w), DimensionConstraint::ideal(h)),
    }
}

/// Clamp a requested zoom factor into the advertised range.
///
/// Missing bounds default to 1.0 and 5.0; a NaN request resolves to the minimum.
pub fn clamp_zoom(factor: f64, range: &NumericRange) -> f64 {
    let mut min = range.min.unwrap_or(DEFAULT_ZOOM_MIN);
    let mut max = range.max.unwrap_or(DEFAULT_ZOOM_MAX);
    if min > max {
        std::mem::swap(&mut min, &mut max);
    }
    if factor.is_nan() {
        return min;
    }
    factor.max(min).min(max)
}

pub struct CaptureNegotiator {
    devices: Arc<dyn MediaDevices>,
    config: CameraConfig,
    session: Option<CaptureSession>,
}

impl CaptureNegotiator {
    pub fn new(devices: Arc<dyn MediaDevices>, config: CameraConfig) -> Self {
        Self {
            devices,
            config,
            session: None,
        }
    }

    pub fn set_config(&mut self, config: CameraConfig) {
        self.config = config;
    }

    pub fn is_open(&self) -> bool {
        self.session.is_some()
    }

    pub fn session(&self) -> Option<&CaptureSession> {
        self.session.as_ref()
    }

    pub fn capabilities(&self) -> CapabilitySet {
        self.session
            .as_ref()
            .map(|s| s.capabilities())
            .unwrap_or_default()
    }

    pub fn settings(&self) -> Option<TrackSettings> {
        self.session.as_ref().map(|s| s.settings())
    }

    pub fn cameras(&self) -> Vec<MediaDeviceInfo> {
        self.session
            .as_ref()
            .map(|s| s.cameras().to_vec())
            .unwrap_or_default()
    }

    /// Open the camera facing `prefer_facing`, falling back to baseline constraints
    pub async fn open(&mut self, prefer_facing: Facing) -> Result<TrackSettings, ReportError> {
        self.close();

        let cameras = self.detect_cameras().await;
        let ladder = constraint_ladder(prefer_facing, &self.config);
        let (track, profile) = self.acquire(ladder).await?;
        self.start_session(track, cameras, profile).await
    }

    /// Replace the live session with one bound to `device_id`
    pub async fn switch_device(&mut self, device_id: &str) -> Result<TrackSettings, ReportError> {
        let previous = self.cameras();
        self.close();

        let mut cameras = self.detect_cameras().await;
        if cameras.is_empty() {
            cameras = previous;
        }

        let candidate = device_candidate(device_id, &self.config);
        let (track, profile) = self.acquire(vec![candidate]).await?;
        log::info!("Camera switched to {}", device_id);
        self.start_session(track, cameras, profile).await
    }

    /// Switch to the camera after the current one, wrapping around
    pub async fn next_device(&mut self) -> Result<TrackSettings, ReportError> {
        let cameras = self.cameras();
        if cameras.len() < 2 {
            return Err(ReportError::CapabilityUnsupported(
                "only one camera available".to_string(),
            ));
        }

        let current = self.session.as_ref().map(|s| s.device_id());
        let next_index = current
            .and_then(|id| cameras.iter().position(|c| c.device_id == id))
            .map(|i| (i + 1) % cameras.len())
            .unwrap_or(0);
        let next_id = cameras[next_index].device_id.clone();
        self.switch_device(&next_id).await
    }

    /// Apply a zoom factor clamped into the track's range. Returns false when
    /// there is no session, zoom is unsupported, or the track rejects it.
    pub async fn set_zoom(&mut self, factor: f64) -> bool {
        let Some(session) = self.session.as_mut() else {
            return false;
        };
        if !session.capabilities().zoom {
            log::debug!("Zoom not supported by the current track");
            return false;
        }

        let range = session
            .track_capabilities()
            .and_then(|c| c.zoom)
            .unwrap_or_default();
        let value = clamp_zoom(factor, &range);

        match session
            .track()
            .apply_constraints(&ConstraintBundle::zoom(value))
            .await
        {
            Ok(()) => {
                session.record_zoom(value);
                log::info!("Zoom set to {}x", value);
                true
            }
            Err(e) => {
                log::warn!("Zoom rejected: {}", e);
                false
            }
        }
    }

    /// Try macro focus, then manual near focus
    pub async fn enable_macro(&self) -> MacroOutcome {
        let Some(session) = self.session.as_ref() else {
            return MacroOutcome::Unsupported;
        };
        let track = session.track();

        if track
            .apply_constraints(&ConstraintBundle::focus(FocusMode::Macro))
            .await
            .is_ok()
        {
            log::info!("Macro focus enabled");
            return MacroOutcome::Macro;
        }

        match track
            .apply_constraints(&ConstraintBundle::manual_focus(
                self.config.near_focus_distance,
            ))
            .await
        {
            Ok(()) => {
                log::info!("Manual near focus enabled");
                MacroOutcome::ManualNearFocus
            }
            Err(e) => {
                log::info!("Macro focus not supported on this device: {}", e);
                MacroOutcome::Unsupported
            }
        }
    }

    /// Stop all tracks and drop the session. Idempotent.
    pub fn close(&mut self) {
        if let Some(session) = self.session.take() {
            session.close();
        }
    }

    async fn detect_cameras(&self) -> Vec<MediaDeviceInfo> {
        match self.devices.enumerate_devices().await {
            Ok(devices) => {
                let cameras: Vec<_> = devices.into_iter().filter(|d| d.is_video_input()).collect();
                log::info!("Found {} cameras", cameras.len());
                for (i, camera) in cameras.iter().enumerate() {
                    log::debug!("Camera {}: {}", i + 1, camera.display_label());
                }
                cameras
            }
            Err(e) => {
                log::warn!("Device enumeration unavailable: {}", e);
                Vec::new()
            }
        }
    }

    async fn acquire(
        &self,
        ladder: Vec<ConstraintCandidate>,
    ) -> Result<(Box<dyn MediaTrack>, NegotiatedProfile), ReportError> {
        let mut last_error = None;
        for candidate in ladder {
            log::debug!("Requesting stream with {:?} constraints", candidate.profile);
            match self.devices.get_user_media(&candidate.constraints).await {
                Ok(track) => return Ok((track, candidate.profile)),
                Err(e) => {
                    log::warn!("{:?} constraints failed: {}", candidate.profile, e);
                    last_error = Some(e);
                }
            }
        }

        let reason = last_error
            .map(|e| e.to_string())
            .unwrap_or_else(|| "no constraint candidates".to_string());
        log::error!("Camera acquisition failed: {}", reason);
        Err(ReportError::AcquisitionDenied(reason))
    }

    async fn start_session(
        &mut self,
        track: Box<dyn MediaTrack>,
        cameras: Vec<MediaDeviceInfo>,
        profile: NegotiatedProfile,
    ) -> Result<TrackSettings, ReportError> {
        let session = CaptureSession::new(track, cameras, profile);
        let auto_macro = self.config.auto_macro && session.capabilities().focus_mode;
        self.session = Some(session);

        if auto_macro {
            let outcome = self.enable_macro().await;
            log::debug!("Automatic macro attempt: {:?}", outcome);
        }

        self.settings().ok_or_else(|| {
            ReportError::AcquisitionDenied("session closed during start".to_string())
        })
    }
}

impl Drop for CaptureNegotiator {
    fn drop(&mut self) {
        self.close();
    }
}
