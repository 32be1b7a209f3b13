//! Synthetic frames and artifacts for offline tests

use crate::digitizer::{FrameDigitizer, ImageArtifact};
use crate::media::VideoSource;
use crate::errors::ReportError;
use image::RgbImage;

/// Create a gradient frame that changes with `frame_number`
pub fn synthetic_video_frame(frame_number: u64, width: u32, height: u32) -> RgbImage {
    let base = (frame_number % 256) as u8;
    RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([
            base.wrapping_add((x % 256) as u8),
            base.wrapping_add((y % 256) as u8),
            base.wrapping_add(((x + y) % 256) as u8),
        ])
    })
}

struct StillSource {
    width: u32,
    height: u32,
}

impl VideoSource for StillSource {
    fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn current_frame(&self) -> Result<RgbImage, ReportError> {
        Ok(synthetic_video_frame(0, self.width, self.height))
    }
}

/// Encode a small gradient into a ready-to-attach artifact
pub fn synthetic_artifact(width: u32, height: u32) -> ImageArtifact {
    FrameDigitizer::new(90)
        .capture_frame(&StillSource { width, height })
        .expect("synthetic frame encodes")
}
