//! dvp-core: shared types, errors, and configuration for dvpackager.
//!
//! This crate is the foundational dependency for the other dvp-* crates,
//! providing the fixed-point [`Timestamp`], the frame and range model, the
//! unified error type, and the immutable run configuration.

pub mod config;
pub mod error;
pub mod media;
pub mod timestamp;

// Re-export the most commonly used items at the crate root.
pub use error::{Error, Result};
pub use media::*;
pub use timestamp::Timestamp;
