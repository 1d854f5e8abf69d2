//! The merged in-memory timeline.

use reelstack_core::{Dimensions, FrameRate, MediaTime};
use serde::{Deserialize, Serialize};

use crate::clip::ResolvedClip;
use crate::track::Track;

/// Output geometry the composition is rendered against.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RenderSettings {
    /// Render canvas; every clip is normalized to fill it
    pub canvas: Dimensions,
    pub frame_rate: FrameRate,
}

impl Default for RenderSettings {
    fn default() -> Self {
        // Portrait reel geometry.
        Self {
            canvas: Dimensions::new(1080, 1920),
            frame_rate: FrameRate::FPS_30,
        }
    }
}

/// The merged, ordered timeline built from a clip list.
///
/// Only complete builds exist: a failed merge never produces a partial
/// `Composition`. Clip order is authoritative and matches segment order in
/// both tracks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Composition {
    /// The clips in timeline order, with their resolved metadata
    pub clips: Vec<ResolvedClip>,
    /// All video media merged into one track
    pub video_track: Track,
    /// All audio media merged into one shared track
    pub audio_track: Track,
    pub settings: RenderSettings,
}

impl Composition {
    /// Total duration: the sum of all clip durations, as carried by the
    /// video track's final segment end.
    pub fn duration(&self) -> MediaTime {
        self.video_track.duration()
    }

    pub fn clip_count(&self) -> usize {
        self.clips.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clips.is_empty()
    }
}
