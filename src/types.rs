//! Core value types shared by the negotiator, the digitizer and the media backends.
//!
//! These mirror the shape of a device media API: constraint objects going in,
//! realized settings and optional capability descriptors coming back out.

use serde::{Deserialize, Serialize};

/// Host platform, used for deep-link selection when no user agent is known
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Platform {
    Windows,
    MacOS,
    Linux,
    Android,
    Ios,
    Unknown,
}

impl Platform {
    pub fn current() -> Self {
        if cfg!(target_os = "android") {
            Platform::Android
        } else if cfg!(target_os = "ios") {
            Platform::Ios
        } else if cfg!(target_os = "windows") {
            Platform::Windows
        } else if cfg!(target_os = "macos") {
            Platform::MacOS
        } else if cfg!(target_os = "linux") {
            Platform::Linux
        } else {
            Platform::Unknown
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Windows => "windows",
            Platform::MacOS => "macos",
            Platform::Linux => "linux",
            Platform::Android => "android",
            Platform::Ios => "ios",
            Platform::Unknown => "unknown",
        }
    }

    pub fn is_handheld(&self) -> bool {
        matches!(self, Platform::Android | Platform::Ios)
    }
}

/// Which way the requested camera should face
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Facing {
    User,
    #[default]
    Environment,
}

impl Facing {
    pub fn as_str(&self) -> &'static str {
        match self {
            Facing::User => "user",
            Facing::Environment => "environment",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaDeviceKind {
    VideoInput,
    AudioInput,
    AudioOutput,
}

/// One entry of a device enumeration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaDeviceInfo {
    pub device_id: String,
    pub label: String,
    pub kind: MediaDeviceKind,
}

impl MediaDeviceInfo {
    pub fn video(device_id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            device_id: device_id.into(),
            label: label.into(),
            kind: MediaDeviceKind::VideoInput,
        }
    }

    pub fn is_video_input(&self) -> bool {
        self.kind == MediaDeviceKind::VideoInput
    }

    /// Label for logs; permission-less enumerations come back unlabeled
    pub fn display_label(&self) -> &str {
        if self.label.is_empty() {
            "Sem nome"
        } else {
            &self.label
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeviceSelector {
    Facing(Facing),
    Exact(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct DimensionConstraint {
    pub ideal: Option<u32>,
    pub max: Option<u32>,
}

impl DimensionConstraint {
    pub fn ideal(value: u32) -> Self {
        Self {
            ideal: Some(value),
            max: None,
        }
    }

    pub fn ideal_max(ideal: u32, max: u32) -> Self {
        Self {
            ideal: Some(ideal),
            max: Some(max),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FocusMode {
    Macro,
    Manual,
    Continuous,
    SingleShot,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExposureMode {
    Continuous,
    Manual,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WhiteBalanceMode {
    Continuous,
    Manual,
}

/// A set of optional capture parameters tried as one unit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ConstraintBundle {
    pub focus_mode: Option<FocusMode>,
    pub focus_distance: Option<f64>,
    pub exposure_mode: Option<ExposureMode>,
    pub exposure_time: Option<f64>,
    pub white_balance_mode: Option<WhiteBalanceMode>,
    pub zoom: Option<f64>,
}

impl ConstraintBundle {
    pub fn focus(mode: FocusMode) -> Self {
        Self {
            focus_mode: Some(mode),
            ..Default::default()
        }
    }

    pub fn manual_focus(distance: f64) -> Self {
        Self {
            focus_mode: Some(FocusMode::Manual),
            focus_distance: Some(distance),
            ..Default::default()
        }
    }

    pub fn zoom(value: f64) -> Self {
        Self {
            zoom: Some(value),
            ..Default::default()
        }
    }

    pub fn with_exposure(mut self, mode: ExposureMode, time: Option<f64>) -> Self {
        self.exposure_mode = Some(mode);
        self.exposure_time = time;
        self
    }

    pub fn with_white_balance(mut self, mode: WhiteBalanceMode) -> Self {
        self.white_balance_mode = Some(mode);
        self
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Stream request passed to [`crate::media::MediaDevices::get_user_media`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaConstraints {
    pub device: DeviceSelector,
    pub width: DimensionConstraint,
    pub height: DimensionConstraint,
    pub frame_rate: Option<u32>,
    /// Tried in order; the backend keeps the first bundle it can honor and
    /// silently ignores the rest
    pub advanced: Vec<ConstraintBundle>,
}

impl MediaConstraints {
    pub fn new(device: DeviceSelector) -> Self {
        Self {
            device,
            width: DimensionConstraint::default(),
            height: DimensionConstraint::default(),
            frame_rate: None,
            advanced: Vec::new(),
        }
    }

    pub fn with_size(mut self, width: DimensionConstraint, height: DimensionConstraint) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn with_frame_rate(mut self, fps: u32) -> Self {
        self.frame_rate = Some(fps);
        self
    }

    pub fn with_advanced(mut self, bundles: Vec<ConstraintBundle>) -> Self {
        self.advanced = bundles;
        self
    }
}

/// Values the granted track actually runs with
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct TrackSettings {
    pub device_id: String,
    pub width: u32,
    pub height: u32,
    pub frame_rate: Option<f64>,
    pub focus_mode: Option<FocusMode>,
    pub focus_distance: Option<f64>,
    pub zoom: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct NumericRange {
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub step: Option<f64>,
}

impl NumericRange {
    pub fn new(min: f64, max: f64) -> Self {
        Self {
            min: Some(min),
            max: Some(max),
            step: None,
        }
    }
}

/// Capability descriptor as reported by the track.
///
/// Every field is optional: an absent entry means the platform does not
/// expose that control at all.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct TrackCapabilities {
    pub focus_mode: Option<Vec<FocusMode>>,
    pub focus_distance: Option<NumericRange>,
    pub zoom: Option<NumericRange>,
    pub torch: Option<Vec<bool>>,
    pub exposure_mode: Option<Vec<ExposureMode>>,
}

/// Snapshot of which advanced controls a granted track honors.
/// Built once per session and never mutated.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct CapabilitySet {
    pub focus_mode: bool,
    pub focus_distance: bool,
    pub zoom: bool,
    pub torch: bool,
    pub exposure_mode: bool,
}

impl CapabilitySet {
    pub fn from_capabilities(capabilities: Option<&TrackCapabilities>) -> Self {
        match capabilities {
            Some(caps) => Self {
                focus_mode: caps.focus_mode.is_some(),
                focus_distance: caps.focus_distance.is_some(),
                zoom: caps.zoom.is_some(),
                torch: caps.torch.is_some(),
                exposure_mode: caps.exposure_mode.is_some(),
            },
            None => Self::default(),
        }
    }
}

/// Which rung of the constraint ladder produced the live stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NegotiatedProfile {
    Advanced,
    Baseline,
    DeviceBound,
}

impl NegotiatedProfile {
    pub fn capture_quality(&self) -> CaptureQuality {
        match self {
            NegotiatedProfile::Baseline => CaptureQuality::Baseline,
            NegotiatedProfile::Advanced | NegotiatedProfile::DeviceBound => CaptureQuality::High,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CaptureQuality {
    High,
    Baseline,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capability_set_absent_means_unsupported() {
        let set = CapabilitySet::from_capabilities(None);
        assert_eq!(set, CapabilitySet::default());
        assert!(!set.zoom);
    }

    #[test]
    fn test_capability_set_presence() {
        let caps = TrackCapabilities {
            zoom: Some(NumericRange::new(1.0, 8.0)),
            torch: Some(vec![]),
            ..Default::default()
        };
        let set = CapabilitySet::from_capabilities(Some(&caps));
        assert!(set.zoom);
        assert!(set.torch);
        assert!(!set.focus_mode);
        assert!(!set.exposure_mode);
    }

    #[test]
    fn test_bundle_builders() {
        let bundle = ConstraintBundle::focus(FocusMode::Macro)
            .with_exposure(ExposureMode::Continuous, None)
            .with_white_balance(WhiteBalanceMode::Continuous);
        assert_eq!(bundle.focus_mode, Some(FocusMode::Macro));
        assert!(!bundle.is_empty());
        assert!(ConstraintBundle::default().is_empty());
    }

    #[test]
    fn test_baseline_profile_uses_baseline_quality() {
        assert_eq!(
            NegotiatedProfile::Baseline.capture_quality(),
            CaptureQuality::Baseline
        );
        assert_eq!(
            NegotiatedProfile::Advanced.capture_quality(),
            CaptureQuality::High
        );
    }

    #[test]
    fn test_platform_as_str() {
        assert_eq!(Platform::Linux.as_str(), "linux");
        assert_eq!(Platform::Unknown.as_str(), "unknown");
        assert!(Platform::Android.is_handheld());
        assert!(!Platform::Windows.is_handheld());
    }

    #[test]
    fn test_facing_serialization() {
        let json = serde_json::to_string(&Facing::Environment).unwrap();
        assert_eq!(json, "\"environment\"");
        let back: Facing = serde_json::from_str("\"user\"").unwrap();
        assert_eq!(back, Facing::User);
    }
}
