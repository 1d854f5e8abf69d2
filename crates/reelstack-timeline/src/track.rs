//! Merged composition tracks.
//!
//! A track holds the media of every clip laid end to end. Segments are
//! always contiguous: clip i occupies `[offset_i, offset_i + duration_i)`
//! where `offset_i` is the sum of all prior clip durations.

use reelstack_core::{MediaKind, MediaTime, TimeRange};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A span of one clip's media inside a merged track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    /// The clip this span was taken from
    pub clip_id: Uuid,
    /// Placement on the shared timeline
    pub range: TimeRange,
}

/// A merged track of one media kind.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Track {
    pub kind: MediaKind,
    pub segments: Vec<Segment>,
}

impl Track {
    pub fn new(kind: MediaKind) -> Self {
        Self {
            kind,
            segments: Vec::new(),
        }
    }

    /// Append a clip's media at the current end of the track. Returns the
    /// range it was placed at.
    pub fn append(&mut self, clip_id: Uuid, duration: MediaTime) -> TimeRange {
        let range = TimeRange::new(self.duration(), duration);
        self.segments.push(Segment { clip_id, range });
        range
    }

    /// Total duration: the exclusive end of the last segment.
    pub fn duration(&self) -> MediaTime {
        self.segments
            .last()
            .map(|s| s.range.end())
            .unwrap_or(MediaTime::ZERO)
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    /// Find the segment containing the given time and the offset within it.
    pub fn segment_at_time(&self, time: MediaTime) -> Option<(usize, MediaTime)> {
        self.segments
            .iter()
            .position(|s| s.range.contains(time))
            .map(|i| (i, time - self.segments[i].range.start))
    }
}
