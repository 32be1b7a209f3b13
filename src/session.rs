use crate::media::MediaTrack;
use crate::types::{
    CapabilitySet, MediaDeviceInfo, NegotiatedProfile, TrackCapabilities, TrackSettings,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One live device stream plus everything learned about it at open time.
///
/// Dropping the session stops its track.
pub struct CaptureSession {
    track: Box<dyn MediaTrack>,
    capabilities: CapabilitySet,
    cameras: Vec<MediaDeviceInfo>,
    profile: NegotiatedProfile,
    opened_at: DateTime<Utc>,
    zoom: Option<f64>,
}

impl CaptureSession {
    pub fn new(
        track: Box<dyn MediaTrack>,
        cameras: Vec<MediaDeviceInfo>,
        profile: NegotiatedProfile,
    ) -> Self {
        let capabilities = CapabilitySet::from_capabilities(track.capabilities().as_ref());
        let settings = track.settings();
        log::info!(
            "Capture session opened on {} at {}x{} ({:?})",
            settings.device_id,
            settings.width,
            settings.height,
            profile
        );
        log::debug!("Capabilities: {:?}", capabilities);

        Self {
            track,
            capabilities,
            cameras,
            profile,
            opened_at: Utc::now(),
            zoom: None,
        }
    }

    pub fn track(&self) -> &dyn MediaTrack {
        self.track.as_ref()
    }

    /// Realized settings, read live from the track
    pub fn settings(&self) -> TrackSettings {
        self.track.settings()
    }

    pub fn capabilities(&self) -> CapabilitySet {
        self.capabilities
    }

    /// Fresh capability descriptor from the track, for range lookups
    pub fn track_capabilities(&self) -> Option<TrackCapabilities> {
        self.track.capabilities()
    }

    pub fn cameras(&self) -> &[MediaDeviceInfo] {
        &self.cameras
    }

    pub fn profile(&self) -> NegotiatedProfile {
        self.profile
    }

    pub fn device_id(&self) -> String {
        self.track.device_id()
    }

    pub fn zoom(&self) -> Option<f64> {
        self.zoom
    }

    pub(crate) fn record_zoom(&mut self, value: f64) {
        self.zoom = Some(value);
    }

    pub fn info(&self) -> SessionInfo {
        SessionInfo {
            settings: self.settings(),
            capabilities: self.capabilities,
            cameras: self.cameras.clone(),
            profile: self.profile,
            opened_at: self.opened_at,
            zoom: self.zoom,
        }
    }

    /// Stop every track and release the device
    pub fn close(self) {
        drop(self);
    }
}

impl Drop for CaptureSession {
    fn drop(&mut self) {
        if self.track.is_live() {
            self.track.stop();
            log::info!("Capture session on {} closed", self.track.device_id());
        }
    }
}

/// Serializable view of a session for the webview
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionInfo {
    pub settings: TrackSettings,
    pub capabilities: CapabilitySet,
    pub cameras: Vec<MediaDeviceInfo>,
    pub profile: NegotiatedProfile,
    pub opened_at: DateTime<Utc>,
    pub zoom: Option<f64>,
}
