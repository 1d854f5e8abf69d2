//! Error types for reelstack.

use std::path::PathBuf;
use thiserror::Error;

/// Which media stream kind an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum MediaKind {
    Video,
    Audio,
}

impl std::fmt::Display for MediaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Video => write!(f, "video"),
            Self::Audio => write!(f, "audio"),
        }
    }
}

/// Stage of the export pipeline an error occurred in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum ExportStage {
    Prepare,
    Render,
    Mux,
}

impl std::fmt::Display for ExportStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Prepare => write!(f, "prepare"),
            Self::Render => write!(f, "render"),
            Self::Mux => write!(f, "mux"),
        }
    }
}

/// Main error type for reelstack operations.
///
/// Per-clip failures carry the offending clip's locator; composition builds
/// abort atomically on the first of them.
#[derive(Error, Debug)]
pub enum ReelError {
    #[error("no clips provided for composition")]
    NoInput,

    #[error("no usable {kind} track in clip {}", .clip.display())]
    MissingTrack { clip: PathBuf, kind: MediaKind },

    #[error("failed to load metadata for clip {}: {reason}", .clip.display())]
    MetadataLoadFailed { clip: PathBuf, reason: String },

    #[error("failed to insert media from clip {}: {reason}", .clip.display())]
    InsertFailed { clip: PathBuf, reason: String },

    #[error("export setup failed: {0}")]
    ExportSetupFailed(String),

    #[error("export failed during {stage}{}: {reason}", .clip.as_ref().map(|c| format!(" (clip {})", c.display())).unwrap_or_default())]
    ExportFailed {
        stage: ExportStage,
        clip: Option<PathBuf>,
        reason: String,
    },

    #[error("export cancelled")]
    Cancelled,

    #[error("an export is already in progress")]
    ExportInProgress,

    #[error("invalid dimensions {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

/// Result type alias for reelstack operations.
pub type Result<T> = std::result::Result<T, ReelError>;
