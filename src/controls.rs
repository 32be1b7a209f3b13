//! Camera controls the UI may offer for a session.

use crate::config::CameraConfig;
use crate::types::CapabilitySet;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CameraControlKind {
    Macro,
    ZoomIn,
    ZoomOut,
    SwitchCamera,
}

impl CameraControlKind {
    pub fn label(&self) -> &'static str {
        match self {
            CameraControlKind::Macro => "🔬 Macro",
            CameraControlKind::ZoomIn => "🔍 Zoom +",
            CameraControlKind::ZoomOut => "🔍 Zoom -",
            CameraControlKind::SwitchCamera => "🔄 Trocar Câmera",
        }
    }
}

/// Ordered list of controls; a control is absent when the session can't honor it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ControlSet {
    pub controls: Vec<CameraControlKind>,
}

impl ControlSet {
    pub fn for_session(capabilities: &CapabilitySet, camera_count: usize) -> Self {
        let mut controls = Vec::new();
        if capabilities.focus_mode {
            controls.push(CameraControlKind::Macro);
        }
        if capabilities.zoom {
            controls.push(CameraControlKind::ZoomIn);
            controls.push(CameraControlKind::ZoomOut);
        }
        if camera_count > 1 {
            controls.push(CameraControlKind::SwitchCamera);
        }
        Self { controls }
    }

    pub fn contains(&self, kind: CameraControlKind) -> bool {
        self.controls.contains(&kind)
    }

    pub fn is_empty(&self) -> bool {
        self.controls.is_empty()
    }
}

/// Zoom factor driven by the +/- buttons
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoomStepper {
    current: f64,
    step: f64,
    min: f64,
    max: f64,
}

impl ZoomStepper {
    pub fn new(step: f64, min: f64, max: f64) -> Self {
        Self {
            current: min,
            step,
            min,
            max,
        }
    }

    pub fn from_config(config: &CameraConfig) -> Self {
        Self::new(config.zoom_step, config.zoom_min, config.zoom_max)
    }

    pub fn current(&self) -> f64 {
        self.current
    }

    pub fn zoom_in(&mut self) -> f64 {
        self.current = (self.current + self.step).min(self.max);
        self.current
    }

    pub fn zoom_out(&mut self) -> f64 {
        self.current = (self.current - self.step).max(self.min);
        self.current
    }

    pub fn reset(&mut self) {
        self.current = self.min;
    }
}

impl Default for ZoomStepper {
    fn default() -> Self {
        Self::from_config(&CameraConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_capabilities_no_controls() {
        let set = ControlSet::for_session(&CapabilitySet::default(), 1);
        assert!(set.is_empty());
    }

    #[test]
    fn test_controls_follow_capabilities() {
        let caps = CapabilitySet {
            focus_mode: true,
            zoom: true,
            ..Default::default()
        };
        let set = ControlSet::for_session(&caps, 2);
        assert_eq!(
            set.controls,
            vec![
                CameraControlKind::Macro,
                CameraControlKind::ZoomIn,
                CameraControlKind::ZoomOut,
                CameraControlKind::SwitchCamera,
            ]
        );
    }

    #[test]
    fn test_switch_needs_two_cameras() {
        let set = ControlSet::for_session(&CapabilitySet::default(), 0);
        assert!(!set.contains(CameraControlKind::SwitchCamera));
    }

    #[test]
    fn test_zoom_stepper_bounds() {
        let mut stepper = ZoomStepper::default();
        assert_eq!(stepper.current(), 1.0);
        assert_eq!(stepper.zoom_out(), 1.0);
        assert_eq!(stepper.zoom_in(), 1.5);
        for _ in 0..20 {
            stepper.zoom_in();
        }
        assert_eq!(stepper.current(), 5.0);
        stepper.reset();
        assert_eq!(stepper.current(), 1.0);
    }
}
