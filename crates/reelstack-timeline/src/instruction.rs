//! Layer instructions for the render/export stage.

use reelstack_core::{portrait_transform, MediaTime, ReelError, Result, TimeRange, Transform2D};
use serde::{Deserialize, Serialize};

use crate::composition::Composition;

/// A timed transform/opacity directive for one clip.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LayerInstruction {
    /// Where the clip sits on the shared timeline
    pub range: TimeRange,
    /// Normalization transform for the clip's natural size
    pub transform: Transform2D,
    /// Fixed at full opacity from the clip's offset; no cross-fades
    pub opacity: f32,
}

/// Build one instruction per clip, in clip order.
///
/// Time ranges come straight from the merged video track so the offset law
/// carries over; transforms come from the portrait calculator against the
/// composition's render canvas. The result is checked to tile
/// `[0, total_duration)` before it is returned.
pub fn assemble_instructions(composition: &Composition) -> Result<Vec<LayerInstruction>> {
    let canvas = composition.settings.canvas;

    let mut instructions = Vec::with_capacity(composition.clip_count());
    for (clip, segment) in composition
        .clips
        .iter()
        .zip(composition.video_track.segments.iter())
    {
        instructions.push(LayerInstruction {
            range: segment.range,
            transform: portrait_transform(clip.natural_size, canvas)?,
            opacity: 1.0,
        });
    }

    verify_tiling(&instructions, composition.duration())?;
    Ok(instructions)
}

/// Check that the instruction ranges exactly tile `[0, total)`: contiguous,
/// non-overlapping, no gaps.
pub fn verify_tiling(instructions: &[LayerInstruction], total: MediaTime) -> Result<()> {
    let mut cursor = MediaTime::ZERO;
    for (i, instruction) in instructions.iter().enumerate() {
        if instruction.range.start != cursor {
            return Err(ReelError::Internal(format!(
                "instruction {i} starts at {} instead of {}",
                instruction.range.start, cursor
            )));
        }
        if !instruction.range.duration.is_positive() {
            return Err(ReelError::Internal(format!(
                "instruction {i} has non-positive duration"
            )));
        }
        cursor = instruction.range.end();
    }
    if cursor != total {
        return Err(ReelError::Internal(format!(
            "instructions cover {cursor}, composition lasts {total}"
        )));
    }
    Ok(())
}
