//! dvpackager - split captured DV into playable files
//!
//! This library crate exposes the packaging engine for integration testing.

pub mod packager;
