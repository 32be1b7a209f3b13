use sitereport::config::{CameraConfig, CaptureConfig};
use sitereport::digitizer::{decode_data_url, FrameDigitizer};
use sitereport::errors::ReportError;
use sitereport::negotiator::CaptureNegotiator;
use sitereport::testing::{synthetic_artifact, SyntheticMediaDevices};
use sitereport::types::{CaptureQuality, Facing};
use std::sync::Arc;

#[test]
fn test_artifact_is_jpeg_data_url() {
    let artifact = synthetic_artifact(32, 24);
    assert!(artifact.data_url.starts_with("data:image/jpeg;base64,"));
    assert_eq!(artifact.mime_type(), "image/jpeg");
    assert_eq!(artifact.quality, 90);

    let (mime, bytes) = artifact.to_bytes().unwrap();
    assert_eq!(mime, "image/jpeg");
    assert_eq!(&bytes[..2], &[0xFF, 0xD8]);
}

#[test]
fn test_each_capture_gets_unique_id() {
    let a = synthetic_artifact(8, 8);
    let b = synthetic_artifact(8, 8);
    assert_ne!(a.id, b.id);
}

#[test]
fn test_quality_follows_capture_mode() {
    let config = CaptureConfig::default();
    assert_eq!(
        FrameDigitizer::from_config(&config, CaptureQuality::High).quality(),
        95
    );
    assert_eq!(
        FrameDigitizer::from_config(&config, CaptureQuality::Baseline).quality(),
        80
    );
}

#[test]
fn test_decode_plain_payload() {
    let (mime, bytes) = decode_data_url("data:image/png;base64,AAEC").unwrap();
    assert_eq!(mime, "image/png");
    assert_eq!(bytes.as_ref(), &[0u8, 1, 2]);
}

#[tokio::test]
async fn test_capture_from_live_track_does_not_stop_it() {
    let devices = SyntheticMediaDevices::new()
        .with_frame_size(64, 48)
        .with_frame_output(128, 96);
    let mut negotiator =
        CaptureNegotiator::new(Arc::new(devices.clone()), CameraConfig::default());
    negotiator.open(Facing::Environment).await.unwrap();

    let session = negotiator.session().unwrap();
    let artifact = FrameDigitizer::new(95)
        .capture_frame(session.track())
        .unwrap();
    assert_eq!((artifact.width, artifact.height), (64, 48));

    let (_, bytes) = artifact.to_bytes().unwrap();
    let decoded = image::load_from_memory(&bytes).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (64, 48));

    let track = devices.last_track().unwrap();
    assert!(track.is_live());
    assert_eq!(track.frames_read(), 1);
    assert!(track.applied().is_empty());
}

#[tokio::test]
async fn test_capture_before_first_frame() {
    let devices = SyntheticMediaDevices::new().with_frame_size(0, 0);
    let mut negotiator =
        CaptureNegotiator::new(Arc::new(devices.clone()), CameraConfig::default());
    negotiator.open(Facing::Environment).await.unwrap();

    let result = FrameDigitizer::new(95).capture_frame(negotiator.session().unwrap().track());
    assert!(matches!(result, Err(ReportError::SourceNotReady(_))));
    assert_eq!(devices.last_track().unwrap().frames_read(), 0);
}

#[tokio::test]
async fn test_capture_retry_after_source_settles() {
    let devices = SyntheticMediaDevices::new().settling_after(1);
    let mut negotiator =
        CaptureNegotiator::new(Arc::new(devices.clone()), CameraConfig::default());
    negotiator.open(Facing::Environment).await.unwrap();
    let track = negotiator.session().unwrap().track();
    let digitizer = FrameDigitizer::new(95);

    let first = digitizer.capture_frame(track);
    assert!(matches!(first, Err(ReportError::SourceNotReady(_))));
    assert_eq!(devices.last_track().unwrap().frames_read(), 0);

    let second = digitizer.capture_frame(track).unwrap();
    assert_eq!((second.width, second.height), (64, 48));
    assert_eq!(devices.last_track().unwrap().frames_read(), 1);
}
