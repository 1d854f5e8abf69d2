//! Sequential track merging.
//!
//! Clip metadata may be fetched concurrently, but insertion is strictly
//! ordered: the builder walks the resolved clips in their original order and
//! appends each one's media to the shared tracks. Any per-clip failure
//! aborts the whole build; callers never observe a partially merged
//! composition.

use reelstack_core::{MediaKind, ReelError, Result};
use tracing::debug;

use crate::clip::ResolvedClip;
use crate::composition::{Composition, RenderSettings};
use crate::track::Track;

/// Builds a [`Composition`] from an ordered list of resolved clips.
#[derive(Debug, Clone)]
pub struct TrackBuilder {
    settings: RenderSettings,
    require_audio: bool,
}

impl TrackBuilder {
    pub fn new(settings: RenderSettings) -> Self {
        // The MP4 reel target carries an audio track, so clips without
        // audio cannot be merged.
        Self {
            settings,
            require_audio: true,
        }
    }

    /// Tolerate clips without an audio stream (they contribute silence by
    /// omission in formats that allow it).
    pub fn require_audio(mut self, require: bool) -> Self {
        self.require_audio = require;
        self
    }

    /// Merge the clips into shared video and audio tracks.
    ///
    /// Clips are processed strictly in list order. The first failing clip
    /// aborts the build with its identity; no partial state escapes.
    pub fn build(&self, clips: &[ResolvedClip]) -> Result<Composition> {
        if clips.is_empty() {
            return Err(ReelError::NoInput);
        }

        let mut video_track = Track::new(MediaKind::Video);
        let mut audio_track = Track::new(MediaKind::Audio);

        for clip in clips {
            self.validate(clip)?;

            let range = video_track.append(clip.id, clip.duration);
            if clip.has_audio {
                audio_track.append(clip.id, clip.duration);
            }
            debug!(clip = %clip.locator.display(), start = %range.start, "merged clip");
        }

        Ok(Composition {
            clips: clips.to_vec(),
            video_track,
            audio_track,
            settings: self.settings,
        })
    }

    fn validate(&self, clip: &ResolvedClip) -> Result<()> {
        if !clip.duration.is_positive() {
            return Err(ReelError::InsertFailed {
                clip: clip.locator.clone(),
                reason: format!("non-positive duration {}", clip.duration),
            });
        }
        if !clip.has_video {
            return Err(ReelError::MissingTrack {
                clip: clip.locator.clone(),
                kind: MediaKind::Video,
            });
        }
        if self.require_audio && !clip.has_audio {
            return Err(ReelError::MissingTrack {
                clip: clip.locator.clone(),
                kind: MediaKind::Audio,
            });
        }
        if clip.natural_size.is_degenerate() {
            return Err(ReelError::InvalidDimensions {
                width: clip.natural_size.width,
                height: clip.natural_size.height,
            });
        }
        Ok(())
    }
}

impl Default for TrackBuilder {
    fn default() -> Self {
        Self::new(RenderSettings::default())
    }
}
