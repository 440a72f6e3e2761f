//! Unified error type for dvpackager.
//!
//! Every crate funnels its failures into [`Error`]. The variant decides how
//! far a failure propagates: [`Error::is_run_fatal`] errors abort the whole
//! run, everything else is scoped to one input or one range.

use std::fmt;
use std::path::PathBuf;

/// Unified error type covering all failure modes in dvpackager.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid option or option combination, detected before any input is touched.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The analysis step could not produce a usable frame log for an input.
    #[error("Source acquisition failed for {}: {message}", input.display())]
    SourceAcquisition {
        /// The input whose analysis failed.
        input: PathBuf,
        /// Human-readable error description.
        message: String,
    },

    /// The frame log is missing required fields or is out of order.
    #[error("Malformed metadata: {0}")]
    MalformedMetadata(String),

    /// Extraction of a single range failed.
    #[error("Remux of range {range} failed: {message}")]
    Remux {
        /// Label of the range (its start pts).
        range: String,
        /// Human-readable error description.
        message: String,
    },

    /// An external tool (dvrescue, ffmpeg, mediainfo) returned an error.
    #[error("Tool error [{tool}]: {message}")]
    Tool {
        /// Name of the tool that failed.
        tool: String,
        /// Human-readable error description.
        message: String,
    },

    /// An I/O operation failed.
    #[error("IO error: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },
}

impl Error {
    /// Whether this error aborts the entire run rather than a single input.
    pub fn is_run_fatal(&self) -> bool {
        matches!(self, Error::Configuration(_))
    }

    /// Convenience constructor for [`Error::Configuration`].
    pub fn configuration(message: impl Into<String>) -> Self {
        Error::Configuration(message.into())
    }

    /// Convenience constructor for [`Error::SourceAcquisition`].
    pub fn source_acquisition(input: impl Into<PathBuf>, message: impl fmt::Display) -> Self {
        Error::SourceAcquisition {
            input: input.into(),
            message: message.to_string(),
        }
    }

    /// Convenience constructor for [`Error::MalformedMetadata`].
    pub fn malformed(message: impl Into<String>) -> Self {
        Error::MalformedMetadata(message.into())
    }

    /// Convenience constructor for [`Error::Remux`].
    pub fn remux(range: impl fmt::Display, message: impl fmt::Display) -> Self {
        Error::Remux {
            range: range.to_string(),
            message: message.to_string(),
        }
    }

    /// Convenience constructor for [`Error::Tool`].
    pub fn tool(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Tool {
            tool: tool.into(),
            message: message.into(),
        }
    }
}

/// Convenience alias used throughout the dvpackager crates.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_configuration_is_run_fatal() {
        assert!(Error::configuration("bad extension").is_run_fatal());
        assert!(!Error::malformed("no pts").is_run_fatal());
        assert!(!Error::source_acquisition("/in.dv", "boom").is_run_fatal());
        assert!(!Error::remux("00:00:01.000", "exit 1").is_run_fatal());
        assert!(!Error::tool("ffmpeg", "missing").is_run_fatal());
    }

    #[test]
    fn display_messages() {
        let err = Error::source_acquisition("/tapes/a.dv", "media error attribute");
        assert_eq!(
            err.to_string(),
            "Source acquisition failed for /tapes/a.dv: media error attribute"
        );

        let err = Error::remux("00:01:00.000", "exited with status 1");
        assert_eq!(
            err.to_string(),
            "Remux of range 00:01:00.000 failed: exited with status 1"
        );
    }

    #[test]
    fn io_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: Error = io.into();
        assert!(matches!(err, Error::Io { .. }));
    }
}
