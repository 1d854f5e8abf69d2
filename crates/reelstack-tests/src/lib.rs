//! Integration test crate for reelstack.
//!
//! This crate exists solely to hold cross-crate integration tests.
//! It depends on the other reelstack crates to verify they work together.

#[cfg(test)]
mod composition;

#[cfg(test)]
mod session;

#[cfg(test)]
mod export_e2e;
