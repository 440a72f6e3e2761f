//! Track duration read-back for produced files.
//!
//! Shells out to `mediainfo --Output=JSON <file>` and extracts the video and
//! audio track durations used by the synchronization check.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use dvp_core::Timestamp;
use serde::Deserialize;

use crate::command::{CommandRunner, ToolCommand};

/// Reported durations of the tracks in one file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrackDurations {
    pub video: Option<Timestamp>,
    pub audio: Vec<Timestamp>,
}

/// Something that can report track durations of a media file.
#[async_trait]
pub trait DurationProbe: Send + Sync {
    async fn track_durations(&self, path: &Path) -> dvp_core::Result<TrackDurations>;
}

/// A [`DurationProbe`] backed by the `mediainfo` CLI.
pub struct MediaInfoProbe<'a> {
    mediainfo_path: PathBuf,
    runner: &'a dyn CommandRunner,
}

impl<'a> MediaInfoProbe<'a> {
    pub fn new(mediainfo_path: PathBuf, runner: &'a dyn CommandRunner) -> Self {
        Self {
            mediainfo_path,
            runner,
        }
    }

    fn command(&self, path: &Path) -> ToolCommand {
        let mut cmd = ToolCommand::new(self.mediainfo_path.clone());
        cmd.arg("--Output=JSON").path_arg(path);
        cmd
    }
}

#[async_trait]
impl DurationProbe for MediaInfoProbe<'_> {
    async fn track_durations(&self, path: &Path) -> dvp_core::Result<TrackDurations> {
        let output = self.runner.run(&self.command(path)).await?;
        parse_durations(&output.stdout)
    }
}

// ---------------------------------------------------------------------------
// JSON structures
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct MiOutput {
    media: Option<MiMedia>,
}

#[derive(Debug, Deserialize)]
struct MiMedia {
    #[serde(default)]
    track: Vec<MiTrack>,
}

#[derive(Debug, Deserialize)]
struct MiTrack {
    #[serde(rename = "@type")]
    track_type: String,
    #[serde(rename = "Duration")]
    duration: Option<String>,
}

/// Parse mediainfo JSON; durations are decimal seconds (`"5.040"`).
fn parse_durations(json: &str) -> dvp_core::Result<TrackDurations> {
    let mi: MiOutput = serde_json::from_str(json)
        .map_err(|e| dvp_core::Error::tool("mediainfo", format!("JSON parse error: {e}")))?;

    let mut durations = TrackDurations::default();
    for track in mi.media.map(|m| m.track).unwrap_or_default() {
        let Some(duration) = track.duration.as_deref().and_then(|d| d.parse::<Timestamp>().ok()) else {
            continue;
        };
        match track.track_type.as_str() {
            "Video" if durations.video.is_none() => durations.video = Some(duration),
            "Audio" => durations.audio.push(duration),
            _ => {}
        }
    }

    Ok(durations)
}
