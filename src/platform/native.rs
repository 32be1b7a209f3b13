use crate::errors::ReportError;
use crate::media::{MediaTrack, VideoSource};
use crate::types::{
    ConstraintBundle, ExposureMode, FocusMode, MediaConstraints, MediaDeviceInfo, NumericRange,
    TrackCapabilities, TrackSettings,
};
use async_trait::async_trait;
use image::RgbImage;
use nokhwa::{
    pixel_format::RgbFormat,
    utils::{
        CameraFormat, CameraIndex, ControlValueDescription, ControlValueSetter, FrameFormat,
        KnownCameraControl, RequestedFormat, RequestedFormatType, Resolution,
    },
    CallbackCamera,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

const DEFAULT_WIDTH: u32 = 1280;
const DEFAULT_HEIGHT: u32 = 720;
const DEFAULT_FPS: u32 = 30;

/// Range of one hardware control, remembered so values can be mapped and clamped
#[derive(Debug, Clone, Copy)]
struct ControlRange {
    min: f64,
    max: f64,
    integer: bool,
}

impl ControlRange {
    fn new(a: f64, b: f64, integer: bool) -> Self {
        let (min, max) = ordered(a, b);
        Self { min, max, integer }
    }

    fn from_description(description: &ControlValueDescription) -> Option<Self> {
        match description {
            ControlValueDescription::IntegerRange { min, max, .. } => {
                Some(Self::new(*min as f64, *max as f64, true))
            }
            ControlValueDescription::FloatRange { min, max, .. } => {
                Some(Self::new(*min, *max, false))
            }
            _ => None,
        }
    }

    /// Drivers may report inverted or NaN bounds; a NaN bound leaves that side open
    fn clamp(&self, value: f64) -> f64 {
        let (lo, hi) = ordered(self.min, self.max);
        if value.is_nan() {
            return [lo, hi].into_iter().find(|b| !b.is_nan()).unwrap_or(0.0);
        }
        if value < lo {
            lo
        } else if value > hi {
            hi
        } else {
            value
        }
    }

    /// Map a normalized 0.0..=1.0 position onto the control range
    fn lerp(&self, position: f64) -> f64 {
        let position = if position.is_nan() {
            0.0
        } else {
            position.clamp(0.0, 1.0)
        };
        self.clamp(self.min + position * (self.max - self.min))
    }

    fn setter(&self, value: f64) -> ControlValueSetter {
        if self.integer {
            ControlValueSetter::Integer(value.round() as i64)
        } else {
            ControlValueSetter::Float(value)
        }
    }
}

fn ordered(a: f64, b: f64) -> (f64, f64) {
    if a > b {
        (b, a)
    } else {
        (a, b)
    }
}

#[derive(Debug, Default, Clone, Copy)]
struct HardwareControls {
    zoom: Option<ControlRange>,
    focus: Option<ControlRange>,
    exposure: Option<ControlRange>,
}

#[derive(Debug, Default, Clone)]
struct Realized {
    width: u32,
    height: u32,
    focus_mode: Option<FocusMode>,
    focus_distance: Option<f64>,
    zoom: Option<f64>,
}

/// Live nokhwa camera exposed as a [`MediaTrack`]
pub struct NativeTrack {
    camera: Mutex<CallbackCamera>,
    device_id: String,
    frame_rate: u32,
    controls: HardwareControls,
    negotiated: (u32, u32),
    realized: Mutex<Realized>,
    live: AtomicBool,
}

/// Size of the last decoded frame, or the negotiated format until one arrives
fn effective_size(realized: (u32, u32), negotiated: (u32, u32)) -> (u32, u32) {
    if realized.0 > 0 && realized.1 > 0 {
        realized
    } else {
        negotiated
    }
}

fn camera_index(device_id: &str) -> CameraIndex {
    match device_id.parse::<u32>() {
        Ok(index) => CameraIndex::Index(index),
        Err(_) => CameraIndex::String(device_id.to_string()),
    }
}

impl NativeTrack {
    /// Open and start streaming the given device, then try the advanced bundles
    pub fn open(
        device: &MediaDeviceInfo,
        constraints: &MediaConstraints,
    ) -> Result<Self, ReportError> {
        let width = constraints.width.ideal.unwrap_or(DEFAULT_WIDTH);
        let height = constraints.height.ideal.unwrap_or(DEFAULT_HEIGHT);
        let fps = constraints.frame_rate.unwrap_or(DEFAULT_FPS);

        let requested = RequestedFormat::new::<RgbFormat>(RequestedFormatType::Closest(
            CameraFormat::new(Resolution::new(width, height), FrameFormat::MJPEG, fps),
        ));

        let mut camera = CallbackCamera::new(camera_index(&device.device_id), requested, |_| {})
            .map_err(|e| {
                ReportError::AcquisitionDenied(format!("Failed to initialize camera: {}", e))
            })?;

        camera.open_stream().map_err(|e| {
            ReportError::AcquisitionDenied(format!("Failed to start stream: {}", e))
        })?;

        let negotiated = match camera.resolution() {
            Ok(resolution) => (resolution.width(), resolution.height()),
            Err(e) => {
                log::debug!("Negotiated resolution not available: {}", e);
                (0, 0)
            }
        };

        let controls = match camera.camera_controls() {
            Ok(list) => {
                let mut controls = HardwareControls::default();
                for control in list {
                    let range = ControlRange::from_description(control.description());
                    match control.control() {
                        KnownCameraControl::Zoom => controls.zoom = range,
                        KnownCameraControl::Focus => controls.focus = range,
                        KnownCameraControl::Exposure => controls.exposure = range,
                        _ => {}
                    }
                }
                controls
            }
            Err(e) => {
                log::debug!("Camera controls not available: {}", e);
                HardwareControls::default()
            }
        };

        let track = Self {
            camera: Mutex::new(camera),
            device_id: device.device_id.clone(),
            frame_rate: fps,
            controls,
            negotiated,
            realized: Mutex::new(Realized::default()),
            live: AtomicBool::new(true),
        };

        // Reading one frame fixes the realized resolution
        if let Err(e) = track.current_frame() {
            log::debug!("First frame not available yet: {}", e);
        }

        for bundle in &constraints.advanced {
            match track.apply_bundle(bundle) {
                Ok(()) => {
                    log::debug!("Advanced constraint bundle accepted: {:?}", bundle);
                    break;
                }
                Err(e) => log::debug!("Advanced constraint bundle ignored: {}", e),
            }
        }

        Ok(track)
    }

    fn apply_bundle(&self, bundle: &ConstraintBundle) -> Result<(), ReportError> {
        if bundle.white_balance_mode.is_some() {
            return Err(ReportError::CapabilityUnsupported(
                "white balance mode".to_string(),
            ));
        }

        let focus = match bundle.focus_mode {
            Some(FocusMode::Manual) => {
                let range = self.controls.focus.ok_or_else(|| {
                    ReportError::CapabilityUnsupported("manual focus".to_string())
                })?;
                let distance = bundle.focus_distance.unwrap_or(0.0);
                Some((range, distance, range.lerp(distance)))
            }
            Some(mode) => {
                return Err(ReportError::CapabilityUnsupported(format!(
                    "focus mode {:?}",
                    mode
                )))
            }
            None => None,
        };

        let exposure = match bundle.exposure_mode {
            Some(ExposureMode::Manual) => {
                let range = self.controls.exposure.ok_or_else(|| {
                    ReportError::CapabilityUnsupported("manual exposure".to_string())
                })?;
                bundle.exposure_time.map(|time| (range, range.clamp(time)))
            }
            Some(ExposureMode::Continuous) => {
                return Err(ReportError::CapabilityUnsupported(
                    "continuous exposure".to_string(),
                ))
            }
            None => None,
        };

        let zoom = match bundle.zoom {
            Some(value) => {
                let range = self
                    .controls
                    .zoom
                    .ok_or_else(|| ReportError::CapabilityUnsupported("zoom".to_string()))?;
                Some((range, range.clamp(value)))
            }
            None => None,
        };

        let mut camera = self
            .camera
            .lock()
            .map_err(|_| ReportError::ControlError("Failed to lock camera".to_string()))?;

        if let Some((range, _, value)) = focus {
            camera
                .set_camera_control(KnownCameraControl::Focus, range.setter(value))
                .map_err(|e| ReportError::ControlError(format!("Failed to set focus: {}", e)))?;
        }
        if let Some((range, value)) = exposure {
            camera
                .set_camera_control(KnownCameraControl::Exposure, range.setter(value))
                .map_err(|e| {
                    ReportError::ControlError(format!("Failed to set exposure: {}", e))
                })?;
        }
        if let Some((range, value)) = zoom {
            camera
                .set_camera_control(KnownCameraControl::Zoom, range.setter(value))
                .map_err(|e| ReportError::ControlError(format!("Failed to set zoom: {}", e)))?;
        }
        drop(camera);

        let mut realized = self
            .realized
            .lock()
            .map_err(|_| ReportError::ControlError("Failed to lock settings".to_string()))?;
        if let Some((_, distance, _)) = focus {
            realized.focus_mode = Some(FocusMode::Manual);
            realized.focus_distance = Some(distance);
        }
        if let Some((_, value)) = zoom {
            realized.zoom = Some(value);
        }
        Ok(())
    }
}

impl VideoSource for NativeTrack {
    fn dimensions(&self) -> (u32, u32) {
        let realized = self
            .realized
            .lock()
            .map(|r| (r.width, r.height))
            .unwrap_or((0, 0));
        effective_size(realized, self.negotiated)
    }

    fn current_frame(&self) -> Result<RgbImage, ReportError> {
        if !self.is_live() {
            return Err(ReportError::SourceNotReady("track stopped".to_string()));
        }

        let mut camera = self
            .camera
            .lock()
            .map_err(|_| ReportError::CaptureError("Failed to lock camera".to_string()))?;

        let buffer = camera
            .poll_frame()
            .map_err(|e| ReportError::CaptureError(format!("Failed to capture frame: {}", e)))?;
        drop(camera);

        let decoded = buffer
            .decode_image::<RgbFormat>()
            .map_err(|e| ReportError::CaptureError(format!("Failed to decode frame: {}", e)))?;
        let (width, height) = (decoded.width(), decoded.height());
        let image = RgbImage::from_raw(width, height, decoded.into_raw()).ok_or_else(|| {
            ReportError::CaptureError("Decoded frame has inconsistent size".to_string())
        })?;

        if let Ok(mut realized) = self.realized.lock() {
            realized.width = width;
            realized.height = height;
        }

        Ok(image)
    }
}

#[async_trait]
impl MediaTrack for NativeTrack {
    fn device_id(&self) -> String {
        self.device_id.clone()
    }

    fn settings(&self) -> TrackSettings {
        let realized = self
            .realized
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default();
        let (width, height) = effective_size((realized.width, realized.height), self.negotiated);
        TrackSettings {
            device_id: self.device_id.clone(),
            width,
            height,
            frame_rate: Some(self.frame_rate as f64),
            focus_mode: realized.focus_mode,
            focus_distance: realized.focus_distance,
            zoom: realized.zoom,
        }
    }

    fn capabilities(&self) -> Option<TrackCapabilities> {
        let controls = self.controls;
        if controls.zoom.is_none() && controls.focus.is_none() && controls.exposure.is_none() {
            return None;
        }
        Some(TrackCapabilities {
            focus_mode: controls.focus.map(|_| vec![FocusMode::Manual]),
            focus_distance: controls.focus.map(|_| NumericRange::new(0.0, 1.0)),
            zoom: controls.zoom.map(|r| NumericRange::new(r.min, r.max)),
            torch: None,
            exposure_mode: controls.exposure.map(|_| vec![ExposureMode::Manual]),
        })
    }

    async fn apply_constraints(&self, bundle: &ConstraintBundle) -> Result<(), ReportError> {
        self.apply_bundle(bundle)
    }

    fn stop(&self) {
        if self.live.swap(false, Ordering::SeqCst) {
            if let Ok(mut camera) = self.camera.lock() {
                if let Err(e) = camera.stop_stream() {
                    log::warn!("Failed to stop camera {}: {}", self.device_id, e);
                }
            }
            log::debug!("Camera {} released", self.device_id);
        }
    }

    fn is_live(&self) -> bool {
        self.live.load(Ordering::SeqCst)
    }
}

impl Drop for NativeTrack {
    fn drop(&mut self) {
        self.stop();
    }
}

// CallbackCamera is only touched behind the mutex
unsafe impl Send for NativeTrack {}
unsafe impl Sync for NativeTrack {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_control_range_clamp_and_lerp() {
        let range = ControlRange::new(100.0, 500.0, true);
        assert_eq!(range.clamp(900.0), 500.0);
        assert_eq!(range.clamp(10.0), 100.0);
        assert_eq!(range.lerp(0.0), 100.0);
        assert_eq!(range.lerp(0.5), 300.0);
        assert_eq!(range.lerp(2.0), 500.0);
    }

    #[test]
    fn test_control_range_with_bad_bounds() {
        let inverted = ControlRange::new(10.0, 1.0, false);
        assert_eq!((inverted.min, inverted.max), (1.0, 10.0));
        assert_eq!(inverted.clamp(20.0), 10.0);
        assert_eq!(inverted.clamp(f64::NAN), 1.0);

        let raw = ControlRange {
            min: 10.0,
            max: 1.0,
            integer: false,
        };
        assert_eq!(raw.clamp(0.0), 1.0);
        assert_eq!(raw.clamp(5.0), 5.0);

        let open_top = ControlRange {
            min: 1.0,
            max: f64::NAN,
            integer: false,
        };
        assert_eq!(open_top.clamp(0.5), 1.0);
        assert_eq!(open_top.clamp(7.0), 7.0);

        let unknown = ControlRange {
            min: f64::NAN,
            max: f64::NAN,
            integer: true,
        };
        assert_eq!(unknown.clamp(3.0), 3.0);
        assert_eq!(unknown.clamp(f64::NAN), 0.0);
        assert_eq!(unknown.lerp(0.5), 0.0);
    }

    #[test]
    fn test_size_falls_back_to_negotiated_format() {
        assert_eq!(effective_size((0, 0), (1280, 720)), (1280, 720));
        assert_eq!(effective_size((640, 0), (1280, 720)), (1280, 720));
        assert_eq!(effective_size((640, 480), (1280, 720)), (640, 480));
        assert_eq!(effective_size((0, 0), (0, 0)), (0, 0));
    }

    #[test]
    fn test_camera_index_parsing() {
        assert_eq!(camera_index("2"), CameraIndex::Index(2));
        assert_eq!(
            camera_index("/dev/video0"),
            CameraIndex::String("/dev/video0".to_string())
        );
    }
}
