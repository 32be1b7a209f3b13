//! Native media backend built on nokhwa.
//!
//! Desktop cameras do not report which way they face, so facing requests are
//! resolved by label heuristics and fall back to the first device.

pub mod native;

use crate::errors::ReportError;
use crate::media::{MediaDevices, MediaTrack};
use crate::types::{DeviceSelector, Facing, MediaConstraints, MediaDeviceInfo};
use async_trait::async_trait;
use nokhwa::{query, utils::ApiBackend};

pub use native::NativeTrack;

/// nokhwa capture backend for the current OS
pub fn api_backend() -> ApiBackend {
    if cfg!(target_os = "linux") {
        ApiBackend::Video4Linux
    } else if cfg!(target_os = "macos") {
        ApiBackend::AVFoundation
    } else if cfg!(target_os = "windows") {
        ApiBackend::MediaFoundation
    } else {
        ApiBackend::Auto
    }
}

/// List video input devices through nokhwa
pub fn list_cameras() -> Result<Vec<MediaDeviceInfo>, ReportError> {
    let cameras = query(api_backend())
        .map_err(|e| ReportError::AcquisitionDenied(format!("Failed to query cameras: {}", e)))?;

    Ok(cameras
        .into_iter()
        .map(|info| MediaDeviceInfo::video(info.index().to_string(), info.human_name()))
        .collect())
}

/// Pick the device for a selector out of an enumeration
pub fn resolve_device(
    selector: &DeviceSelector,
    devices: &[MediaDeviceInfo],
) -> Option<MediaDeviceInfo> {
    match selector {
        DeviceSelector::Exact(id) => devices.iter().find(|d| &d.device_id == id).cloned(),
        DeviceSelector::Facing(facing) => {
            let hints: &[&str] = match facing {
                Facing::Environment => &["back", "rear", "environment", "traseira"],
                Facing::User => &["front", "user", "facetime", "frontal"],
            };
            devices
                .iter()
                .find(|d| {
                    let label = d.label.to_lowercase();
                    hints.iter().any(|hint| label.contains(hint))
                })
                .or_else(|| devices.first())
                .cloned()
        }
    }
}

/// Media backend that opens real cameras
#[derive(Debug, Default, Clone)]
pub struct NativeMediaDevices;

impl NativeMediaDevices {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl MediaDevices for NativeMediaDevices {
    async fn enumerate_devices(&self) -> Result<Vec<MediaDeviceInfo>, ReportError> {
        tokio::task::spawn_blocking(list_cameras)
            .await
            .map_err(|e| ReportError::AcquisitionDenied(format!("Task join error: {}", e)))?
    }

    async fn get_user_media(
        &self,
        constraints: &MediaConstraints,
    ) -> Result<Box<dyn MediaTrack>, ReportError> {
        let constraints = constraints.clone();
        let track = tokio::task::spawn_blocking(move || {
            let devices = list_cameras()?;
            let device = resolve_device(&constraints.device, &devices).ok_or_else(|| {
                ReportError::AcquisitionDenied(format!(
                    "No camera matches {:?}",
                    constraints.device
                ))
            })?;
            log::debug!(
                "Opening camera {} ({})",
                device.device_id,
                device.display_label()
            );
            NativeTrack::open(&device, &constraints)
        })
        .await
        .map_err(|e| ReportError::AcquisitionDenied(format!("Task join error: {}", e)))??;

        Ok(Box::new(track))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn devices() -> Vec<MediaDeviceInfo> {
        vec![
            MediaDeviceInfo::video("0", "Integrated Front Camera"),
            MediaDeviceInfo::video("1", "USB Rear Camera"),
        ]
    }

    #[test]
    fn test_resolve_exact_device() {
        let found = resolve_device(&DeviceSelector::Exact("1".to_string()), &devices());
        assert_eq!(found.unwrap().device_id, "1");
        assert!(resolve_device(&DeviceSelector::Exact("9".to_string()), &devices()).is_none());
    }

    #[test]
    fn test_resolve_facing_by_label() {
        let env = resolve_device(&DeviceSelector::Facing(Facing::Environment), &devices());
        assert_eq!(env.unwrap().device_id, "1");
        let user = resolve_device(&DeviceSelector::Facing(Facing::User), &devices());
        assert_eq!(user.unwrap().device_id, "0");
    }

    #[test]
    fn test_resolve_facing_falls_back_to_first() {
        let plain = vec![MediaDeviceInfo::video("3", "Webcam")];
        let found = resolve_device(&DeviceSelector::Facing(Facing::Environment), &plain);
        assert_eq!(found.unwrap().device_id, "3");
        assert!(resolve_device(&DeviceSelector::Facing(Facing::User), &[]).is_none());
    }
}
