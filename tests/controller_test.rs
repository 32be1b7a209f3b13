use async_trait::async_trait;
use sitereport::config::SiteReportConfig;
use sitereport::controller::ReportController;
use sitereport::controls::CameraControlKind;
use sitereport::errors::ReportError;
use sitereport::report::ReportRecord;
use bytes::Bytes;
use sitereport::share::{
    DirectoryDownloader, Downloader, LinkOpener, ShareDependencies, ShareError, ShareOutcome,
    UnsupportedShareTarget,
};
use sitereport::testing::SyntheticMediaDevices;
use sitereport::types::{Facing, FocusMode, MediaDeviceInfo, NumericRange, TrackCapabilities};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct RecordingOpener {
    opened: Mutex<Vec<String>>,
}

#[async_trait]
impl LinkOpener for RecordingOpener {
    async fn open(&self, url: &str) -> Result<(), ShareError> {
        self.opened.lock().unwrap().push(url.to_string());
        Ok(())
    }
}

struct FullDiskDownloader;

#[async_trait]
impl Downloader for FullDiskDownloader {
    async fn download(&self, _file_name: &str, _bytes: Bytes) -> Result<PathBuf, ShareError> {
        Err(ShareError::Download("no space left on device".to_string()))
    }
}

struct Fixture {
    devices: SyntheticMediaDevices,
    controller: ReportController,
    opener: Arc<RecordingOpener>,
    dir: tempfile::TempDir,
}

fn fixture(devices: SyntheticMediaDevices) -> Fixture {
    let dir = tempfile::tempdir().unwrap();
    let mut config = SiteReportConfig::default();
    config.share.deep_link_delay_ms = 0;
    config.storage.output_directory = dir.path().display().to_string();

    let opener = Arc::new(RecordingOpener::default());
    let controller = ReportController::new(Arc::new(devices.clone()), config).with_share_dependencies(
        ShareDependencies {
            target: Arc::new(UnsupportedShareTarget),
            downloader: Arc::new(DirectoryDownloader::new(dir.path())),
            opener: opener.clone(),
        },
    );
    Fixture {
        devices,
        controller,
        opener,
        dir,
    }
}

fn filled_form() -> ReportRecord {
    ReportRecord {
        company: "Acme".into(),
        requester: "Ana".into(),
        worker: "João".into(),
        stage: "depois".into(),
        area: "terreo".into(),
        ..Default::default()
    }
}

#[tokio::test]
async fn test_capture_confirm_submit_flow() {
    let mut fx = fixture(SyntheticMediaDevices::new());

    fx.controller.open_camera(Facing::Environment).await.unwrap();
    let preview = fx.controller.capture_photo().unwrap();
    assert_eq!(preview.quality, 95);
    assert!(fx.controller.attached_photo().is_none());

    let attached = fx.controller.confirm_photo().unwrap();
    assert_eq!(attached.id, preview.id);
    assert!(!fx.controller.negotiator().is_open());
    assert_eq!(fx.devices.live_tracks(), 0);

    fx.controller.update_fields(filled_form());
    assert!(fx.controller.attached_photo().is_some());

    let submission = fx
        .controller
        .submit(Some("Mozilla/5.0 (X11; Linux x86_64)"))
        .await
        .unwrap();
    assert!(submission.text.contains("Térreo"));
    assert!(submission.text.contains("CONCLUÍDO"));
    assert!(submission.text.contains("Sem descrição"));
    assert!(submission.text.contains("*HORA TÉRMINO:*"));
    assert!(matches!(
        submission.outcome,
        ShareOutcome::DeepLinkOpened { opened: true, .. }
    ));

    let opened = fx.opener.opened.lock().unwrap().clone();
    assert!(opened[0].starts_with("https://web.whatsapp.com/send?text="));
    assert!(fx.dir.path().join("foto_relatorio.jpg").exists());
    assert!(fx.controller.attached_photo().is_none());
}

#[tokio::test]
async fn test_submit_without_photo_is_refused() {
    let mut fx = fixture(SyntheticMediaDevices::new());
    fx.controller.update_fields(filled_form());

    let err = fx.controller.submit(None).await.unwrap_err();
    assert_eq!(err, ReportError::MissingPhoto);
    assert_eq!(err.user_message(), "Por favor, tire uma foto antes de enviar!");
    assert!(fx.opener.opened.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_retake_keeps_camera_open() {
    let mut fx = fixture(SyntheticMediaDevices::new());
    fx.controller.open_camera(Facing::Environment).await.unwrap();

    fx.controller.capture_photo().unwrap();
    fx.controller.retake();
    assert!(fx.controller.pending_photo().is_none());
    assert!(fx.controller.negotiator().is_open());

    let err = fx.controller.confirm_photo().unwrap_err();
    assert!(matches!(err, ReportError::SourceNotReady(_)));
}

#[tokio::test]
async fn test_capture_without_camera() {
    let mut fx = fixture(SyntheticMediaDevices::new());
    let err = fx.controller.capture_photo().unwrap_err();
    assert!(matches!(err, ReportError::SourceNotReady(_)));
}

#[tokio::test]
async fn test_baseline_session_captures_at_lower_quality() {
    let mut fx = fixture(SyntheticMediaDevices::new().denying_advanced());
    fx.controller.open_camera(Facing::Environment).await.unwrap();
    assert_eq!(fx.controller.capture_photo().unwrap().quality, 80);
}

#[tokio::test]
async fn test_confirm_replaces_previous_photo() {
    let mut fx = fixture(SyntheticMediaDevices::new());

    fx.controller.open_camera(Facing::Environment).await.unwrap();
    fx.controller.capture_photo().unwrap();
    let first = fx.controller.confirm_photo().unwrap();

    fx.controller.open_camera(Facing::Environment).await.unwrap();
    fx.controller.capture_photo().unwrap();
    let second = fx.controller.confirm_photo().unwrap();

    assert_ne!(first.id, second.id);
    assert_eq!(fx.controller.attached_photo().unwrap().id, second.id);

    assert!(fx.controller.remove_photo().is_some());
    assert!(fx.controller.attached_photo().is_none());
}

#[tokio::test]
async fn test_controls_follow_session_capabilities() {
    let devices = SyntheticMediaDevices::new()
        .with_devices(vec![
            MediaDeviceInfo::video("rear", "Back Camera"),
            MediaDeviceInfo::video("front", "Front Camera"),
        ])
        .with_capabilities(TrackCapabilities {
            focus_mode: Some(vec![FocusMode::Macro]),
            zoom: Some(NumericRange::new(1.0, 2.0)),
            ..Default::default()
        });
    let mut fx = fixture(devices);

    let view = fx.controller.open_camera(Facing::Environment).await.unwrap();
    assert!(view.controls.contains(CameraControlKind::Macro));
    assert!(view.controls.contains(CameraControlKind::ZoomIn));
    assert!(view.controls.contains(CameraControlKind::SwitchCamera));
    assert_eq!(view.session.cameras.len(), 2);

    let change = fx.controller.zoom_in().await;
    assert_eq!(change.factor, 1.5);
    assert!(change.applied);

    fx.controller.zoom_in().await;
    let change = fx.controller.zoom_in().await;
    assert_eq!(change.factor, 2.5);
    assert_eq!(fx.controller.settings().unwrap().zoom, Some(2.0));

    let view = fx.controller.next_camera().await.unwrap();
    assert_eq!(view.session.settings.device_id, "front");
    assert_eq!(fx.controller.zoom_out().await.factor, 1.0);
}

#[tokio::test]
async fn test_zoom_without_capability_not_applied() {
    let mut fx = fixture(SyntheticMediaDevices::new());
    let view = fx.controller.open_camera(Facing::Environment).await.unwrap();
    assert!(view.controls.is_empty());

    let change = fx.controller.zoom_in().await;
    assert!(!change.applied);
}

#[tokio::test]
async fn test_denied_camera_reports_permission_message() {
    let mut fx = fixture(SyntheticMediaDevices::new().denying_all());
    let err = fx
        .controller
        .open_camera(Facing::Environment)
        .await
        .unwrap_err();
    assert_eq!(
        err.user_message(),
        "Não foi possível acessar a câmera. Verifique as permissões."
    );
}

#[tokio::test]
async fn test_round_preset_applies_configured_requester() {
    let mut fx = fixture(SyntheticMediaDevices::new());
    let mut config = fx.controller.config().clone();
    config.round.requester = Some("Zeladoria".into());
    fx.controller.set_config(config);

    let record = fx.controller.set_round(true);
    assert_eq!(record.requester, "Zeladoria");
    assert_eq!(record.location, "Banheiro");
    assert_eq!(record.stage, "depois");
}

#[tokio::test]
async fn test_photo_kept_when_download_fails() {
    let fx = fixture(SyntheticMediaDevices::new());
    let mut controller = ReportController::new(
        Arc::new(fx.devices.clone()),
        fx.controller.config().clone(),
    )
    .with_share_dependencies(ShareDependencies {
        target: Arc::new(UnsupportedShareTarget),
        downloader: Arc::new(FullDiskDownloader),
        opener: fx.opener.clone(),
    });

    controller.open_camera(Facing::Environment).await.unwrap();
    controller.capture_photo().unwrap();
    let attached = controller.confirm_photo().unwrap();
    controller.update_fields(filled_form());

    let submission = controller.submit(None).await.unwrap();
    assert!(matches!(
        submission.outcome,
        ShareOutcome::DeepLinkOpened {
            photo_path: None,
            opened: true,
            ..
        }
    ));
    assert!(!submission.outcome.delivered());
    assert!(submission.message.contains("foto não pôde ser salva"));
    assert_eq!(fx.opener.opened.lock().unwrap().len(), 1);
    assert_eq!(controller.attached_photo().unwrap().id, attached.id);
}
