//! Frame Digitizer: one still from a live source, encoded as a JPEG data URL.

use crate::config::CaptureConfig;
use crate::errors::ReportError;
use crate::media::VideoSource;
use crate::types::CaptureQuality;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

const JPEG_MIME: &str = "image/jpeg";

/// Encoded still, ready to preview, attach and share
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageArtifact {
    pub id: Uuid,
    /// `data:image/jpeg;base64,...`
    pub data_url: String,
    pub width: u32,
    pub height: u32,
    pub quality: u8,
    pub captured_at: DateTime<Utc>,
}

impl ImageArtifact {
    /// Decode the data URL back into its MIME type and raw bytes
    pub fn to_bytes(&self) -> Result<(String, Bytes), ReportError> {
        decode_data_url(&self.data_url)
    }

    pub fn mime_type(&self) -> &str {
        self.data_url
            .strip_prefix("data:")
            .and_then(|rest| rest.split(';').next())
            .unwrap_or(JPEG_MIME)
    }
}

/// Split a base64 data URL into `(mime, bytes)`
pub fn decode_data_url(data_url: &str) -> Result<(String, Bytes), ReportError> {
    let rest = data_url
        .strip_prefix("data:")
        .ok_or_else(|| ReportError::InvalidArtifact("missing data: prefix".to_string()))?;
    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| ReportError::InvalidArtifact("missing payload separator".to_string()))?;
    let mime = header
        .strip_suffix(";base64")
        .ok_or_else(|| ReportError::InvalidArtifact("payload is not base64".to_string()))?;
    if mime.is_empty() {
        return Err(ReportError::InvalidArtifact("empty MIME type".to_string()));
    }

    let bytes = BASE64
        .decode(payload)
        .map_err(|e| ReportError::InvalidArtifact(format!("bad base64 payload: {}", e)))?;
    Ok((mime.to_string(), Bytes::from(bytes)))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameDigitizer {
    quality: u8,
}

impl FrameDigitizer {
    /// `quality` is the JPEG quality, clamped to 1..=100
    pub fn new(quality: u8) -> Self {
        Self {
            quality: quality.clamp(1, 100),
        }
    }

    pub fn from_config(config: &CaptureConfig, mode: CaptureQuality) -> Self {
        Self::new(config.quality_for(mode))
    }

    pub fn quality(&self) -> u8 {
        self.quality
    }

    /// Read the current frame at the source's natural size and encode it.
    ///
    /// The source keeps running; nothing on it is paused or changed.
    pub fn capture_frame<S: VideoSource + ?Sized>(
        &self,
        source: &S,
    ) -> Result<ImageArtifact, ReportError> {
        let (width, height) = source.dimensions();
        if width == 0 || height == 0 {
            log::warn!("Capture requested before the source produced a frame");
            return Err(ReportError::SourceNotReady(format!(
                "source reports {}x{}",
                width, height
            )));
        }

        let frame = source.current_frame()?;
        let surface = if frame.dimensions() == (width, height) {
            frame
        } else {
            log::debug!(
                "Resizing frame from {}x{} to {}x{}",
                frame.width(),
                frame.height(),
                width,
                height
            );
            image::imageops::resize(&frame, width, height, FilterType::Lanczos3)
        };

        let mut jpeg = Vec::new();
        let encoder = JpegEncoder::new_with_quality(&mut jpeg, self.quality);
        surface
            .write_with_encoder(encoder)
            .map_err(|e| ReportError::EncodingError(format!("JPEG encoding failed: {}", e)))?;

        let artifact = ImageArtifact {
            id: Uuid::new_v4(),
            data_url: format!("data:{};base64,{}", JPEG_MIME, BASE64.encode(&jpeg)),
            width,
            height,
            quality: self.quality,
            captured_at: Utc::now(),
        };
        log::info!(
            "Captured {}x{} still at quality {} ({} bytes)",
            width,
            height,
            self.quality,
            jpeg.len()
        );
        Ok(artifact)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::synthetic_video_frame;
    use image::RgbImage;

    struct FixedSource {
        natural: (u32, u32),
        output: (u32, u32),
    }

    impl VideoSource for FixedSource {
        fn dimensions(&self) -> (u32, u32) {
            self.natural
        }

        fn current_frame(&self) -> Result<RgbImage, ReportError> {
            Ok(synthetic_video_frame(3, self.output.0, self.output.1))
        }
    }

    #[test]
    fn test_zero_dimensions_not_ready() {
        let source = FixedSource {
            natural: (0, 0),
            output: (8, 8),
        };
        let result = FrameDigitizer::new(95).capture_frame(&source);
        assert!(matches!(result, Err(ReportError::SourceNotReady(_))));
    }

    #[test]
    fn test_capture_uses_natural_size() {
        let source = FixedSource {
            natural: (40, 30),
            output: (80, 60),
        };
        let artifact = FrameDigitizer::new(95).capture_frame(&source).unwrap();
        assert_eq!((artifact.width, artifact.height), (40, 30));

        let (mime, bytes) = artifact.to_bytes().unwrap();
        assert_eq!(mime, "image/jpeg");
        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (40, 30));
    }

    #[test]
    fn test_quality_is_clamped() {
        assert_eq!(FrameDigitizer::new(0).quality(), 1);
        assert_eq!(FrameDigitizer::new(250).quality(), 100);
    }

    #[test]
    fn test_decode_rejects_malformed_urls() {
        for url in [
            "image/jpeg;base64,AAAA",
            "data:image/jpeg;base64",
            "data:image/jpeg,AAAA",
            "data:;base64,AAAA",
            "data:image/jpeg;base64,@@@",
        ] {
            assert!(
                matches!(decode_data_url(url), Err(ReportError::InvalidArtifact(_))),
                "{} should be rejected",
                url
            );
        }
    }
}
