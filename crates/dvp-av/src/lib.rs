//! # dvp-av
//!
//! External tool plumbing for dvpackager.
//!
//! This crate provides:
//!
//! - **Tool discovery** ([`ToolRegistry`]) -- find and cache paths to
//!   dvrescue, ffmpeg, and mediainfo.
//! - **Command execution** ([`ToolCommand`], [`CommandRunner`]) -- async
//!   builder with timeout support, behind a trait so callers can substitute a
//!   recording runner.
//! - **Workspace management** ([`Workspace`]) -- per-input scratch directory
//!   with promotion of finished artifacts.
//! - **Typed argument builders** -- [`AnalyzeRequest`] for dvrescue and
//!   [`RemuxJob`] for ffmpeg.
//! - **Duration probing** ([`MediaInfoProbe`]) -- reads back track durations
//!   of produced files.

pub mod analyze;
pub mod command;
pub mod probe;
pub mod remux;
pub mod tools;
pub mod workspace;

// ---- Re-exports for convenience ----

pub use analyze::AnalyzeRequest;
pub use command::{CommandRunner, SystemRunner, ToolCommand, ToolOutput};
pub use probe::{DurationProbe, MediaInfoProbe, TrackDurations};
pub use remux::{RemuxJob, Seek, SideInput};
pub use tools::{ToolConfig, ToolInfo, ToolRegistry};
pub use workspace::Workspace;
