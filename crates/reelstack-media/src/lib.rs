//! Reelstack Media - FFmpeg integration for probing and export
//!
//! This crate handles:
//! - Media file probing (ffprobe JSON)
//! - Export format configuration
//! - The render-and-mux export state machine

pub mod export;
pub mod format;
pub mod probe;

pub use export::{CancelHandle, EncodeJob, ExportState, Exporter, ProgressTracker};
pub use format::{AudioCodec, ExportFormat, VideoCodec};
pub use probe::{AudioStreamInfo, ClipProber, FfprobeProber, MediaProbe, VideoStreamInfo};
