//! Reelstack Timeline - Composition data model
//!
//! Implements the merge pipeline from recorded segments to a normalized
//! timeline:
//! - Clips and their resolved media metadata
//! - Merged video/audio tracks with the cumulative offset law
//! - Sequential track building with atomic failure
//! - Layer instructions for the render/export stage

pub mod builder;
pub mod clip;
pub mod composition;
pub mod instruction;
pub mod track;

pub use builder::TrackBuilder;
pub use clip::{Clip, ResolvedClip};
pub use composition::{Composition, RenderSettings};
pub use instruction::{assemble_instructions, verify_tiling, LayerInstruction};
pub use track::{Segment, Track};
