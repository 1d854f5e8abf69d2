//! Clip types for the composition timeline.

use reelstack_core::{Dimensions, MediaTime};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// One recorded source segment.
///
/// Created when a recording finishes; read-only afterwards. Metadata fields
/// stay `None` until the segment has been probed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Clip {
    /// Unique clip ID
    pub id: Uuid,
    /// Path to the recorded segment file
    pub locator: PathBuf,
    /// Cached duration, filled in once loaded
    pub duration: Option<MediaTime>,
    /// Cached natural size of the video stream, filled in once loaded
    pub natural_size: Option<Dimensions>,
}

impl Clip {
    /// Register a recorded segment by its file path.
    pub fn new(locator: impl Into<PathBuf>) -> Self {
        Self {
            id: Uuid::new_v4(),
            locator: locator.into(),
            duration: None,
            natural_size: None,
        }
    }

    pub fn locator(&self) -> &Path {
        &self.locator
    }
}

/// A clip joined with its loaded metadata, ready for track insertion.
///
/// Produced by the concurrent probe fan-out and consumed strictly in clip
/// order by the track builder.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolvedClip {
    pub id: Uuid,
    pub locator: PathBuf,
    pub duration: MediaTime,
    pub natural_size: Dimensions,
    pub has_video: bool,
    pub has_audio: bool,
}

impl ResolvedClip {
    /// Join a clip with its probed metadata.
    pub fn new(
        clip: &Clip,
        duration: MediaTime,
        natural_size: Dimensions,
        has_video: bool,
        has_audio: bool,
    ) -> Self {
        Self {
            id: clip.id,
            locator: clip.locator.clone(),
            duration,
            natural_size,
            has_video,
            has_audio,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_clip_has_no_cached_metadata() {
        let clip = Clip::new("/tmp/seg.mov");
        assert!(clip.duration.is_none());
        assert!(clip.natural_size.is_none());
    }

    #[test]
    fn resolved_clip_keeps_identity() {
        let clip = Clip::new("/tmp/seg.mov");
        let resolved = ResolvedClip::new(
            &clip,
            MediaTime::from_seconds(4),
            Dimensions::new(1920, 1080),
            true,
            true,
        );
        assert_eq!(resolved.id, clip.id);
        assert_eq!(resolved.locator, clip.locator);
    }
}
