//! Testing utilities for sitereport
//!
//! Scripted media backend and synthetic frames so the negotiator, digitizer
//! and controller can be exercised without camera hardware.

pub mod synthetic_data;
pub mod synthetic_media;

pub use synthetic_data::{synthetic_artifact, synthetic_video_frame};
pub use synthetic_media::{SyntheticMediaDevices, SyntheticTrackState};
