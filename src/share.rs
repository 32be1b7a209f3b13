//! Report delivery.
//!
//! Tries a native share with the photo attached, then a text-only share plus
//! photo download, then a chat deep link plus photo download. Every path ends
//! with the text and the photo in the user's hands.

use crate::config::{ShareConfig, StorageConfig};
use crate::digitizer::ImageArtifact;
use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

pub const PHOTO_FOLLOWS_SUFFIX: &str = "\n\n📸 (A foto será enviada em seguida)";
pub const PHOTO_ATTACHED_SUFFIX: &str = "\n\n📸 *FOTO ANEXADA*";
pub const DEEP_LINK_PHOTO_NAME: &str = "foto_relatorio.jpg";

#[derive(Debug, Error)]
pub enum ShareError {
    #[error("no share target available")]
    Unavailable,
    #[error("share was rejected: {0}")]
    Rejected(String),
    #[error("photo could not be prepared: {0}")]
    Artifact(String),
    #[error("download failed: {0}")]
    Download(String),
    #[error("link could not be opened: {0}")]
    Link(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ShareFile {
    pub name: String,
    pub mime: String,
    pub bytes: Bytes,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SharePayload {
    pub title: String,
    pub text: String,
    pub files: Vec<ShareFile>,
}

/// Handheld devices get the app deep link, desktops the web client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeviceClass {
    Handheld,
    Desktop,
}

impl DeviceClass {
    pub fn from_user_agent(user_agent: Option<&str>) -> Self {
        match user_agent {
            Some(ua) => {
                let ua = ua.to_ascii_lowercase();
                if ["iphone", "ipad", "ipod", "android"]
                    .iter()
                    .any(|marker| ua.contains(marker))
                {
                    DeviceClass::Handheld
                } else {
                    DeviceClass::Desktop
                }
            }
            None if crate::types::Platform::current().is_handheld() => DeviceClass::Handheld,
            None => DeviceClass::Desktop,
        }
    }
}

/// Native share sheet
#[async_trait]
pub trait ShareTarget: Send + Sync {
    fn is_available(&self) -> bool;

    fn can_share_files(&self, payload: &SharePayload) -> bool;

    async fn share(&self, payload: &SharePayload) -> Result<(), ShareError>;
}

/// Hands a file to the user, returning where it landed
#[async_trait]
pub trait Downloader: Send + Sync {
    async fn download(&self, file_name: &str, bytes: Bytes) -> Result<PathBuf, ShareError>;
}

#[async_trait]
pub trait LinkOpener: Send + Sync {
    async fn open(&self, url: &str) -> Result<(), ShareError>;
}

/// Bundle of delivery backends. Each component can be mocked in tests.
#[derive(Clone)]
pub struct ShareDependencies {
    pub target: Arc<dyn ShareTarget>,
    pub downloader: Arc<dyn Downloader>,
    pub opener: Arc<dyn LinkOpener>,
}

impl ShareDependencies {
    pub fn for_storage(storage: &StorageConfig) -> Self {
        Self {
            target: Arc::new(UnsupportedShareTarget),
            downloader: Arc::new(DirectoryDownloader::new(&storage.output_directory)),
            opener: Arc::new(SystemLinkOpener),
        }
    }
}

impl Default for ShareDependencies {
    fn default() -> Self {
        Self::for_storage(&StorageConfig::default())
    }
}

/// Desktop webviews expose no share sheet to the host
pub struct UnsupportedShareTarget;

#[async_trait]
impl ShareTarget for UnsupportedShareTarget {
    fn is_available(&self) -> bool {
        false
    }

    fn can_share_files(&self, _payload: &SharePayload) -> bool {
        false
    }

    async fn share(&self, _payload: &SharePayload) -> Result<(), ShareError> {
        Err(ShareError::Unavailable)
    }
}

/// Writes downloads into a fixed directory
pub struct DirectoryDownloader {
    directory: PathBuf,
}

impl DirectoryDownloader {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }
}

#[async_trait]
impl Downloader for DirectoryDownloader {
    async fn download(&self, file_name: &str, bytes: Bytes) -> Result<PathBuf, ShareError> {
        let directory = self.directory.clone();
        let path = directory.join(file_name);
        let target = path.clone();
        tokio::task::spawn_blocking(move || -> Result<(), std::io::Error> {
            std::fs::create_dir_all(&directory)?;
            std::fs::write(&target, &bytes)
        })
        .await
        .map_err(|e| ShareError::Download(format!("task join error: {}", e)))??;

        log::info!("Photo saved to {}", path.display());
        Ok(path)
    }
}

pub struct SystemLinkOpener;

#[async_trait]
impl LinkOpener for SystemLinkOpener {
    async fn open(&self, url: &str) -> Result<(), ShareError> {
        tauri_plugin_opener::open_url(url, None::<&str>).map_err(|e| ShareError::Link(e.to_string()))
    }
}

/// How the report left the app
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ShareOutcome {
    SharedWithPhoto,
    TextSharedPhotoDownloaded {
        photo_path: PathBuf,
    },
    DeepLinkOpened {
        url: String,
        photo_path: Option<PathBuf>,
        device: DeviceClass,
        opened: bool,
    },
}

impl ShareOutcome {
    /// False when the deep link could not be opened or the photo was not saved
    pub fn delivered(&self) -> bool {
        !matches!(
            self,
            ShareOutcome::DeepLinkOpened { opened: false, .. }
                | ShareOutcome::DeepLinkOpened {
                    photo_path: None,
                    ..
                }
        )
    }

    pub fn user_message(&self) -> String {
        match self {
            ShareOutcome::SharedWithPhoto => "✅ Relatório compartilhado com foto!".to_string(),
            ShareOutcome::TextSharedPhotoDownloaded { .. } => {
                "✅ Texto do relatório compartilhado!\n\n📸 Foto baixada! Anexe a foto em seguida."
                    .to_string()
            }
            ShareOutcome::DeepLinkOpened { opened: false, url, .. } => format!(
                "Não foi possível abrir o WhatsApp. Envie o texto pelo link:\n{}",
                url
            ),
            ShareOutcome::DeepLinkOpened {
                photo_path: None, ..
            } => "📱 WhatsApp aberto, mas a foto não pôde ser salva. Tente enviar novamente."
                .to_string(),
            ShareOutcome::DeepLinkOpened {
                device: DeviceClass::Desktop,
                ..
            } => format!(
                "📱 WhatsApp Web aberto!\n\n1. Envie o texto\n2. Anexe a foto \"{}\"",
                DEEP_LINK_PHOTO_NAME
            ),
            ShareOutcome::DeepLinkOpened { .. } => format!(
                "📱 WhatsApp aberto!\n\nAnexe a foto \"{}\"",
                DEEP_LINK_PHOTO_NAME
            ),
        }
    }
}

/// Chat link carrying `text` percent-encoded in the `text` query parameter
pub fn deep_link(base: &str, text: &str) -> Result<String, ShareError> {
    let mut url = url::Url::parse(base).map_err(|e| ShareError::Link(e.to_string()))?;
    let encoded: String = url::form_urlencoded::byte_serialize(text.as_bytes()).collect();
    url.set_query(Some(&format!("text={}", encoded.replace('+', "%20"))));
    Ok(url.to_string())
}

pub struct ShareDispatcher {
    deps: ShareDependencies,
    config: ShareConfig,
}

impl ShareDispatcher {
    pub fn new(deps: ShareDependencies, config: ShareConfig) -> Self {
        Self { deps, config }
    }

    pub async fn deliver(
        &self,
        text: &str,
        artifact: &ImageArtifact,
        device: DeviceClass,
    ) -> ShareOutcome {
        match self.try_native(text, artifact).await {
            Ok(Some(outcome)) => return outcome,
            Ok(None) => {}
            Err(e) => log::warn!("Share failed, falling back to deep link: {}", e),
        }
        self.deep_link_delivery(text, artifact, device).await
    }

    async fn try_native(
        &self,
        text: &str,
        artifact: &ImageArtifact,
    ) -> Result<Option<ShareOutcome>, ShareError> {
        let target = &self.deps.target;
        if !target.is_available() {
            log::debug!("No native share target");
            return Ok(None);
        }

        let (mime, bytes) = artifact
            .to_bytes()
            .map_err(|e| ShareError::Artifact(e.to_string()))?;
        let with_photo = SharePayload {
            title: self.config.title.clone(),
            text: text.to_string(),
            files: vec![ShareFile {
                name: self.config.attachment_name.clone(),
                mime,
                bytes: bytes.clone(),
            }],
        };

        if target.can_share_files(&with_photo) {
            target.share(&with_photo).await?;
            log::info!("Report shared with photo");
            return Ok(Some(ShareOutcome::SharedWithPhoto));
        }

        let text_only = SharePayload {
            title: self.config.title.clone(),
            text: format!("{}{}", text, PHOTO_FOLLOWS_SUFFIX),
            files: Vec::new(),
        };
        target.share(&text_only).await?;
        log::info!("Report text shared without photo");

        let file_name = format!("relatorio_{}.jpg", chrono::Utc::now().timestamp_millis());
        let photo_path = self.deps.downloader.download(&file_name, bytes).await?;
        Ok(Some(ShareOutcome::TextSharedPhotoDownloaded { photo_path }))
    }

    async fn deep_link_delivery(
        &self,
        text: &str,
        artifact: &ImageArtifact,
        device: DeviceClass,
    ) -> ShareOutcome {
        let photo_path = match artifact.to_bytes() {
            Ok((_, bytes)) => match self.deps.downloader.download(DEEP_LINK_PHOTO_NAME, bytes).await {
                Ok(path) => Some(path),
                Err(e) => {
                    log::error!("Photo download failed: {}", e);
                    None
                }
            },
            Err(e) => {
                log::error!("Photo could not be decoded: {}", e);
                None
            }
        };

        if self.config.deep_link_delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(self.config.deep_link_delay_ms)).await;
        }

        let base = match device {
            DeviceClass::Handheld => &self.config.handheld_link,
            DeviceClass::Desktop => &self.config.desktop_link,
        };
        let message = format!("{}{}", text, PHOTO_ATTACHED_SUFFIX);
        let (url, opened) = match deep_link(base, &message) {
            Ok(url) => {
                let opened = match self.deps.opener.open(&url).await {
                    Ok(()) => true,
                    Err(e) => {
                        log::error!("Failed to open deep link: {}", e);
                        false
                    }
                };
                (url, opened)
            }
            Err(e) => {
                log::error!("Invalid deep link base {}: {}", base, e);
                (base.clone(), false)
            }
        };

        log::info!("Deep link delivery ({:?}), opened: {}", device, opened);
        ShareOutcome::DeepLinkOpened {
            url,
            photo_path,
            device,
            opened,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_agent_classes() {
        let iphone = "Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X)";
        let android = "Mozilla/5.0 (Linux; ANDROID 14; Pixel 8)";
        let desktop = "Mozilla/5.0 (X11; Linux x86_64) Firefox/120.0";
        assert_eq!(DeviceClass::from_user_agent(Some(iphone)), DeviceClass::Handheld);
        assert_eq!(DeviceClass::from_user_agent(Some(android)), DeviceClass::Handheld);
        assert_eq!(DeviceClass::from_user_agent(Some(desktop)), DeviceClass::Desktop);
    }

    #[test]
    fn test_deep_link_encoding() {
        let url = deep_link("https://web.whatsapp.com/send", "*DATA:* 1/2 & ok+").unwrap();
        assert_eq!(
            url,
            "https://web.whatsapp.com/send?text=*DATA%3A*%201%2F2%20%26%20ok%2B"
        );

        let app = deep_link("whatsapp://send", "Olá\nmundo").unwrap();
        assert!(app.starts_with("whatsapp://send?text="));
        assert!(app.contains("Ol%C3%A1%0Amundo"));
    }

    #[test]
    fn test_deep_link_rejects_bad_base() {
        assert!(matches!(deep_link("not a url", "x"), Err(ShareError::Link(_))));
    }
}
