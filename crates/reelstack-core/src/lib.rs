//! Reelstack Core - Foundation types for timeline composition
//!
//! This crate provides the fundamental types used throughout reelstack:
//! - Rational media time (MediaTime, FrameRate, TimeRange)
//! - 2D geometry and the portrait-normalization transform
//! - The error taxonomy shared by every stage

pub mod error;
pub mod geometry;
pub mod time;

pub use error::{ExportStage, MediaKind, ReelError, Result};
pub use geometry::{portrait_transform, Dimensions, Transform2D, Vec2};
pub use time::{FrameRate, MediaTime, TimeRange};
