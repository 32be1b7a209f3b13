//! Device media seam.
//!
//! The negotiator and digitizer only talk to these traits. `platform` provides
//! the nokhwa-backed implementation and `testing` a scripted one.

use crate::errors::ReportError;
use crate::types::{
    ConstraintBundle, MediaConstraints, MediaDeviceInfo, TrackCapabilities, TrackSettings,
};
use async_trait::async_trait;
use image::RgbImage;

/// Abstraction over stream acquisition and device enumeration.
#[async_trait]
pub trait MediaDevices: Send + Sync {
    /// List every media device. Unlabeled entries are normal before permission is granted.
    async fn enumerate_devices(&self) -> Result<Vec<MediaDeviceInfo>, ReportError>;

    /// Acquire a live video track. Advanced bundles the device cannot honor are
    /// ignored; only a refused or unmatched request is an error.
    async fn get_user_media(
        &self,
        constraints: &MediaConstraints,
    ) -> Result<Box<dyn MediaTrack>, ReportError>;
}

/// Anything a still frame can be read from.
pub trait VideoSource: Send + Sync {
    /// Natural frame size; `(0, 0)` until the first frame has arrived
    fn dimensions(&self) -> (u32, u32);

    /// Read the current frame without pausing the source
    fn current_frame(&self) -> Result<RgbImage, ReportError>;
}

/// A granted video track.
#[async_trait]
pub trait MediaTrack: VideoSource {
    fn device_id(&self) -> String;

    fn settings(&self) -> TrackSettings;

    /// `None` when the platform has no capability introspection at all
    fn capabilities(&self) -> Option<TrackCapabilities>;

    /// Apply one bundle; an error means the track rejected it
    async fn apply_constraints(&self, bundle: &ConstraintBundle) -> Result<(), ReportError>;

    /// Release the device. Safe to call more than once.
    fn stop(&self);

    fn is_live(&self) -> bool;
}
