//! Run configuration.
//!
//! The top-level [`Config`] is deserialized from JSON (every section defaults
//! sensibly, so `{}` is valid) and then overlaid with command-line flags. It
//! is built once, validated, and passed by reference into every component.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::Error;

// ---------------------------------------------------------------------------
// Top-level Config
// ---------------------------------------------------------------------------

/// Root run configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub policy: BreakpointPolicy,
    pub output: OutputOptions,
    pub tools: ToolsConfig,
    /// Suffix of the per-input sidecar directory (`<input>_<suffix>/`).
    pub sidecar_suffix: String,
    /// Print the range table instead of producing outputs.
    pub report_only: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            policy: BreakpointPolicy::default(),
            output: OutputOptions::default(),
            tools: ToolsConfig::default(),
            sidecar_suffix: "dvpackager".into(),
            report_only: false,
        }
    }
}

impl Config {
    /// Deserialize a `Config` from a JSON string.
    pub fn from_json(json_str: &str) -> Result<Self> {
        serde_json::from_str(json_str)
            .map_err(|e| Error::configuration(format!("config parse error: {e}")))
    }

    /// Load configuration from `path`, or defaults when no path is given.
    ///
    /// An explicitly named file that cannot be read or parsed is a
    /// configuration error.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        let contents = std::fs::read_to_string(path).map_err(|e| {
            Error::configuration(format!("cannot read config file {}: {e}", path.display()))
        })?;
        tracing::debug!("Loaded config from {}", path.display());
        Self::from_json(&contents)
    }

    /// Check option values that do not depend on the output plan.
    pub fn validate(&self) -> Result<()> {
        let suffix = self.sidecar_suffix.trim();
        if suffix.is_empty() || suffix.contains(['/', '\\']) {
            return Err(Error::configuration(format!(
                "sidecar suffix {:?} must be a non-empty plain name",
                self.sidecar_suffix
            )));
        }

        for (option, tag) in [
            ("audio language", &self.output.audio_language),
            ("secondary audio language", &self.output.secondary_audio_language),
            ("caption language", &self.output.caption_language),
        ] {
            if let Some(tag) = tag {
                validate_language_tag(option, tag)?;
            }
        }

        Ok(())
    }
}

/// Language tags are ISO 639 codes: two or three ASCII letters.
fn validate_language_tag(option: &str, tag: &str) -> Result<()> {
    let ok = (2..=3).contains(&tag.len()) && tag.bytes().all(|b| b.is_ascii_alphabetic());
    if ok {
        Ok(())
    } else {
        Err(Error::configuration(format!(
            "{option} tag {tag:?} is not a 2 or 3 letter language code"
        )))
    }
}

// ---------------------------------------------------------------------------
// Sub-configs
// ---------------------------------------------------------------------------

/// Which frames are allowed to start a new output file.
///
/// `force_no_split` takes precedence over every other flag.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BreakpointPolicy {
    pub force_no_split: bool,
    pub split_on_recording_start: bool,
    pub split_on_recording_timestamp_discontinuity: bool,
    pub split_on_timecode_discontinuity: bool,
}

/// Output container and stream options.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputOptions {
    /// Requested output extension (`mkv`, `mov`, or `dv`). `None` lets the
    /// mode decide: `dv` when unpackaging, `mkv` otherwise.
    pub extension: Option<String>,
    /// Extract raw DV instead of rewrapping; conflicts with any explicit
    /// extension other than `dv`.
    pub unpackage: bool,
    pub embed_technical_subtitles: bool,
    pub audio_language: Option<String>,
    pub secondary_audio_language: Option<String>,
    pub caption_language: Option<String>,
}

impl Default for OutputOptions {
    fn default() -> Self {
        Self {
            extension: None,
            unpackage: false,
            embed_technical_subtitles: false,
            audio_language: None,
            secondary_audio_language: None,
            caption_language: None,
        }
    }
}

/// Custom paths to external tools. `None` means "search PATH".
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    pub dvrescue_path: Option<PathBuf>,
    pub ffmpeg_path: Option<PathBuf>,
    pub mediainfo_path: Option<PathBuf>,
}
