//! Scripted [`MediaDevices`] backend.
//!
//! Every request and applied bundle is recorded so tests can assert on the
//! exact negotiation sequence and on which tracks are still live.

use super::synthetic_data::synthetic_video_frame;
use crate::errors::ReportError;
use crate::media::{MediaDevices, MediaTrack, VideoSource};
use crate::types::{
    ConstraintBundle, DeviceSelector, FocusMode, MediaConstraints, MediaDeviceInfo,
    TrackCapabilities, TrackSettings,
};
use async_trait::async_trait;
use image::RgbImage;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone)]
struct Script {
    devices: Vec<MediaDeviceInfo>,
    enumerate_fails: bool,
    deny_advanced: bool,
    deny_all: bool,
    capabilities: Option<TrackCapabilities>,
    frame_size: (u32, u32),
    frame_output: Option<(u32, u32)>,
    unsettled_queries: u64,
    rejected_focus: HashSet<FocusMode>,
    reject_zoom: bool,
}

impl Default for Script {
    fn default() -> Self {
        Self {
            devices: vec![MediaDeviceInfo::video("cam-0", "Synthetic Rear Camera")],
            enumerate_fails: false,
            deny_advanced: false,
            deny_all: false,
            capabilities: None,
            frame_size: (64, 48),
            frame_output: None,
            unsettled_queries: 0,
            rejected_focus: HashSet::new(),
            reject_zoom: false,
        }
    }
}

/// Shared, inspectable state of one synthetic track
#[derive(Debug)]
pub struct SyntheticTrackState {
    pub device_id: String,
    pub constraints: MediaConstraints,
    live: AtomicBool,
    frames_read: AtomicU64,
    size_queries: AtomicU64,
    applied: Mutex<Vec<ConstraintBundle>>,
}

impl SyntheticTrackState {
    pub fn is_live(&self) -> bool {
        self.live.load(Ordering::SeqCst)
    }

    pub fn applied(&self) -> Vec<ConstraintBundle> {
        self.applied.lock().expect("lock poisoned").clone()
    }

    pub fn frames_read(&self) -> u64 {
        self.frames_read.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Default)]
struct Journal {
    requests: Vec<MediaConstraints>,
    tracks: Vec<Arc<SyntheticTrackState>>,
}

/// Media backend driven by a script instead of hardware
#[derive(Debug, Clone, Default)]
pub struct SyntheticMediaDevices {
    script: Arc<Mutex<Script>>,
    journal: Arc<Mutex<Journal>>,
}

impl SyntheticMediaDevices {
    pub fn new() -> Self {
        Self::default()
    }

    fn edit(self, f: impl FnOnce(&mut Script)) -> Self {
        f(&mut self.script.lock().expect("lock poisoned"));
        self
    }

    pub fn with_devices(self, devices: Vec<MediaDeviceInfo>) -> Self {
        self.edit(|s| s.devices = devices)
    }

    pub fn failing_enumeration(self) -> Self {
        self.edit(|s| s.enumerate_fails = true)
    }

    /// Refuse any request that carries advanced bundles
    pub fn denying_advanced(self) -> Self {
        self.edit(|s| s.deny_advanced = true)
    }

    /// Refuse every request, as a denied permission prompt would
    pub fn denying_all(self) -> Self {
        self.edit(|s| s.deny_all = true)
    }

    pub fn with_capabilities(self, capabilities: TrackCapabilities) -> Self {
        self.edit(|s| s.capabilities = Some(capabilities))
    }

    pub fn with_frame_size(self, width: u32, height: u32) -> Self {
        self.edit(|s| s.frame_size = (width, height))
    }

    /// Make the track hand out frames of a different size than it reports
    pub fn with_frame_output(self, width: u32, height: u32) -> Self {
        self.edit(|s| s.frame_output = Some((width, height)))
    }

    /// Report a 0x0 size for the first `queries` dimension lookups
    pub fn settling_after(self, queries: u64) -> Self {
        self.edit(|s| s.unsettled_queries = queries)
    }

    pub fn rejecting_focus(self, mode: FocusMode) -> Self {
        self.edit(|s| {
            s.rejected_focus.insert(mode);
        })
    }

    pub fn rejecting_zoom(self) -> Self {
        self.edit(|s| s.reject_zoom = true)
    }

    pub fn requests(&self) -> Vec<MediaConstraints> {
        self.journal.lock().expect("lock poisoned").requests.clone()
    }

    pub fn tracks(&self) -> Vec<Arc<SyntheticTrackState>> {
        self.journal.lock().expect("lock poisoned").tracks.clone()
    }

    pub fn live_tracks(&self) -> usize {
        self.tracks().iter().filter(|t| t.is_live()).count()
    }

    pub fn last_track(&self) -> Option<Arc<SyntheticTrackState>> {
        self.tracks().last().cloned()
    }
}

#[async_trait]
impl MediaDevices for SyntheticMediaDevices {
    async fn enumerate_devices(&self) -> Result<Vec<MediaDeviceInfo>, ReportError> {
        let script = self.script.lock().expect("lock poisoned").clone();
        if script.enumerate_fails {
            return Err(ReportError::AcquisitionDenied(
                "enumeration unavailable".to_string(),
            ));
        }
        Ok(script.devices)
    }

    async fn get_user_media(
        &self,
        constraints: &MediaConstraints,
    ) -> Result<Box<dyn MediaTrack>, ReportError> {
        let script = self.script.lock().expect("lock poisoned").clone();
        self.journal
            .lock()
            .expect("lock poisoned")
            .requests
            .push(constraints.clone());

        if script.deny_all {
            return Err(ReportError::AcquisitionDenied("permission denied".to_string()));
        }
        if script.deny_advanced && !constraints.advanced.is_empty() {
            return Err(ReportError::AcquisitionDenied(
                "advanced constraints rejected".to_string(),
            ));
        }

        let device_id = match &constraints.device {
            DeviceSelector::Exact(id) => {
                if !script.devices.iter().any(|d| &d.device_id == id) {
                    return Err(ReportError::AcquisitionDenied(format!(
                        "no device with id {}",
                        id
                    )));
                }
                id.clone()
            }
            DeviceSelector::Facing(_) => script
                .devices
                .first()
                .map(|d| d.device_id.clone())
                .unwrap_or_else(|| "synthetic".to_string()),
        };

        let state = Arc::new(SyntheticTrackState {
            device_id,
            constraints: constraints.clone(),
            live: AtomicBool::new(true),
            frames_read: AtomicU64::new(0),
            size_queries: AtomicU64::new(0),
            applied: Mutex::new(Vec::new()),
        });
        self.journal
            .lock()
            .expect("lock poisoned")
            .tracks
            .push(state.clone());

        Ok(Box::new(SyntheticTrack { state, script }))
    }
}

struct SyntheticTrack {
    state: Arc<SyntheticTrackState>,
    script: Script,
}

impl VideoSource for SyntheticTrack {
    fn dimensions(&self) -> (u32, u32) {
        let query = self.state.size_queries.fetch_add(1, Ordering::SeqCst);
        if query < self.script.unsettled_queries {
            (0, 0)
        } else {
            self.script.frame_size
        }
    }

    fn current_frame(&self) -> Result<RgbImage, ReportError> {
        let frame_number = self.state.frames_read.fetch_add(1, Ordering::SeqCst);
        let (width, height) = self.script.frame_output.unwrap_or(self.script.frame_size);
        Ok(synthetic_video_frame(frame_number, width, height))
    }
}

#[async_trait]
impl MediaTrack for SyntheticTrack {
    fn device_id(&self) -> String {
        self.state.device_id.clone()
    }

    fn settings(&self) -> TrackSettings {
        let applied = self.state.applied();
        let (width, height) = self.script.frame_size;
        TrackSettings {
            device_id: self.state.device_id.clone(),
            width,
            height,
            frame_rate: self.state.constraints.frame_rate.map(f64::from),
            focus_mode: applied.iter().rev().find_map(|b| b.focus_mode),
            focus_distance: applied.iter().rev().find_map(|b| b.focus_distance),
            zoom: applied.iter().rev().find_map(|b| b.zoom),
        }
    }

    fn capabilities(&self) -> Option<TrackCapabilities> {
        self.script.capabilities.clone()
    }

    async fn apply_constraints(&self, bundle: &ConstraintBundle) -> Result<(), ReportError> {
        if let Some(mode) = bundle.focus_mode {
            if self.script.rejected_focus.contains(&mode) {
                return Err(ReportError::CapabilityUnsupported(format!(
                    "focus mode {:?}",
                    mode
                )));
            }
        }
        if bundle.zoom.is_some() && self.script.reject_zoom {
            return Err(ReportError::CapabilityUnsupported("zoom".to_string()));
        }
        self.state
            .applied
            .lock()
            .expect("lock poisoned")
            .push(bundle.clone());
        Ok(())
    }

    fn stop(&self) {
        self.state.live.store(false, Ordering::SeqCst);
    }

    fn is_live(&self) -> bool {
        self.state.is_live()
    }
}
