//! Configuration management for sitereport
//!
//! Camera negotiation targets, JPEG quality per capture mode, share/deep-link
//! settings, download location and the round-inspection preset.

use crate::errors::ReportError;
use crate::types::CaptureQuality;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Root configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct SiteReportConfig {
    pub camera: CameraConfig,
    pub capture: CaptureConfig,
    pub share: ShareConfig,
    pub storage: StorageConfig,
    pub round: RoundConfig,
}

/// Constraint ladder targets and control behavior
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CameraConfig {
    /// Ideal resolution for the advanced rung [width, height]
    pub ideal_resolution: [u32; 2],
    /// Upper bound for the advanced rung [width, height]
    pub max_resolution: [u32; 2],
    /// Ideal resolution for the baseline rung [width, height]
    pub baseline_resolution: [u32; 2],
    /// Ideal resolution when binding to an explicit device id
    pub device_resolution: [u32; 2],
    pub frame_rate: u32,
    /// Focus distance used for the manual near-focus fallback (0.0-1.0)
    pub near_focus_distance: f64,
    /// Exposure time used by the manual-exposure bundle
    pub manual_exposure_time: f64,
    /// Try macro focus right after the stream opens
    pub auto_macro: bool,
    pub zoom_step: f64,
    pub zoom_min: f64,
    pub zoom_max: f64,
}

/// JPEG quality targets (1-100)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptureConfig {
    pub high_quality: u8,
    pub baseline_quality: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShareConfig {
    pub title: String,
    pub attachment_name: String,
    pub handheld_link: String,
    pub desktop_link: String,
    /// Pause between the photo download and opening the chat link
    pub deep_link_delay_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Where "downloaded" report photos are written
    pub output_directory: String,
}

/// Values applied when the round-inspection toggle is switched on
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundConfig {
    pub requester: Option<String>,
    pub area: String,
    pub stage: String,
    pub location: String,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            ideal_resolution: [1920, 1080],
            max_resolution: [3840, 2160],
            baseline_resolution: [1280, 720],
            device_resolution: [1920, 1080],
            frame_rate: 30,
            near_focus_distance: 0.1,
            manual_exposure_time: 10000.0,
            auto_macro: true,
            zoom_step: 0.5,
            zoom_min: 1.0,
            zoom_max: 5.0,
        }
    }
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            high_quality: 95,
            baseline_quality: 80,
        }
    }
}

impl Default for ShareConfig {
    fn default() -> Self {
        Self {
            title: "Relatório de Serviço".to_string(),
            attachment_name: "relatorio_foto.jpg".to_string(),
            handheld_link: "whatsapp://send".to_string(),
            desktop_link: "https://web.whatsapp.com/send".to_string(),
            deep_link_delay_ms: 1000,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            output_directory: "./captures".to_string(),
        }
    }
}

impl Default for RoundConfig {
    fn default() -> Self {
        Self {
            requester: None,
            area: "telhado".to_string(),
            stage: "depois".to_string(),
            location: "Banheiro".to_string(),
        }
    }
}

impl CaptureConfig {
    pub fn quality_for(&self, quality: CaptureQuality) -> u8 {
        match quality {
            CaptureQuality::High => self.high_quality,
            CaptureQuality::Baseline => self.baseline_quality,
        }
    }
}

impl SiteReportConfig {
    /// Load configuration from TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ReportError> {
        let path = path.as_ref();

        if !path.exists() {
            log::info!("Config file not found at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .map_err(|e| ReportError::ConfigError(format!("Failed to read config file: {}", e)))?;

        let config: SiteReportConfig = toml::from_str(&contents)
            .map_err(|e| ReportError::ConfigError(format!("Failed to parse config file: {}", e)))?;

        log::info!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    /// Save configuration to TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ReportError> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                ReportError::ConfigError(format!("Failed to create config directory: {}", e))
            })?;
        }

        let toml_string = toml::to_string_pretty(self)
            .map_err(|e| ReportError::ConfigError(format!("Failed to serialize config: {}", e)))?;

        fs::write(path, toml_string)
            .map_err(|e| ReportError::ConfigError(format!("Failed to write config file: {}", e)))?;

        log::info!("Saved configuration to {:?}", path);
        Ok(())
    }

    pub fn default_path() -> PathBuf {
        PathBuf::from("sitereport.toml")
    }

    /// Load from default location or fall back to defaults
    pub fn load_or_default() -> Self {
        Self::load_from_file(Self::default_path()).unwrap_or_else(|e| {
            log::warn!("Failed to load config, using defaults: {}", e);
            Self::default()
        })
    }

    pub fn validate(&self) -> Result<(), String> {
        let camera = &self.camera;
        for (name, [w, h]) in [
            ("ideal", camera.ideal_resolution),
            ("max", camera.max_resolution),
            ("baseline", camera.baseline_resolution),
            ("device", camera.device_resolution),
        ] {
            if w == 0 || h == 0 {
                return Err(format!("Invalid {} resolution", name));
            }
        }
        if camera.ideal_resolution[0] > camera.max_resolution[0]
            || camera.ideal_resolution[1] > camera.max_resolution[1]
        {
            return Err("Ideal resolution exceeds max resolution".to_string());
        }
        if camera.frame_rate == 0 || camera.frame_rate > 240 {
            return Err("Invalid frame rate (must be 1-240)".to_string());
        }
        if !(0.0..=1.0).contains(&camera.near_focus_distance) {
            return Err("Near focus distance must be between 0.0 and 1.0".to_string());
        }
        if camera.zoom_step <= 0.0 {
            return Err("Zoom step must be positive".to_string());
        }
        if camera.zoom_min > camera.zoom_max {
            return Err("Zoom min must not exceed zoom max".to_string());
        }

        for quality in [self.capture.high_quality, self.capture.baseline_quality] {
            if quality == 0 || quality > 100 {
                return Err("JPEG quality must be between 1 and 100".to_string());
            }
        }

        if self.share.handheld_link.is_empty() || self.share.desktop_link.is_empty() {
            return Err("Deep link bases must not be empty".to_string());
        }
        if self.storage.output_directory.is_empty() {
            return Err("Output directory must not be empty".to_string());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SiteReportConfig::default();
        assert_eq!(config.camera.ideal_resolution, [1920, 1080]);
        assert_eq!(config.camera.baseline_resolution, [1280, 720]);
        assert_eq!(config.capture.high_quality, 95);
        assert_eq!(config.capture.baseline_quality, 80);
        assert!(config.camera.auto_macro);
    }

    #[test]
    fn test_config_validation() {
        let config = SiteReportConfig::default();
        assert!(config.validate().is_ok());

        let mut bad = config.clone();
        bad.camera.baseline_resolution = [0, 720];
        assert!(bad.validate().is_err());

        let mut bad_quality = SiteReportConfig::default();
        bad_quality.capture.high_quality = 0;
        assert!(bad_quality.validate().is_err());

        let mut bad_zoom = SiteReportConfig::default();
        bad_zoom.camera.zoom_min = 6.0;
        assert!(bad_zoom.validate().is_err());
    }

    #[test]
    fn test_config_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("nested").join("sitereport.toml");

        let mut config = SiteReportConfig::default();
        config.round.requester = Some("Ana".to_string());
        config.save_to_file(&config_path).unwrap();

        let loaded = SiteReportConfig::load_from_file(&config_path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_config_toml_format() {
        let toml_string = toml::to_string_pretty(&SiteReportConfig::default()).unwrap();
        assert!(toml_string.contains("[camera]"));
        assert!(toml_string.contains("[capture]"));
        assert!(toml_string.contains("[share]"));
        assert!(toml_string.contains("[storage]"));
        assert!(toml_string.contains("[round]"));
        assert!(toml_string.contains("baseline_quality"));
    }

    #[test]
    fn test_load_nonexistent_file() {
        let result = SiteReportConfig::load_from_file("nonexistent_sitereport.toml");
        assert_eq!(result.unwrap().camera.frame_rate, 30);
    }

    #[test]
    fn test_quality_for_mode() {
        let capture = CaptureConfig::default();
        assert_eq!(capture.quality_for(CaptureQuality::High), 95);
        assert_eq!(capture.quality_for(CaptureQuality::Baseline), 80);
    }
}
