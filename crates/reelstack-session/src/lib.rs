//! Reelstack Session - the entry point for external collaborators
//!
//! A [`CompositionSession`] owns one ordered clip list, the composition
//! merged from it, and the export pipeline. Capture and UI layers talk to
//! the session only; they never touch tracks or the encoder directly.

pub mod session;

pub use session::{BuiltComposition, CompositionSession, SessionConfig};
