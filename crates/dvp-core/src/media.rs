//! Frame and range model shared by the loader, the segmenter, and the driver.

use chrono::{Datelike, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::Timestamp;

/// Recording dates before this year are camera sentinels, not real dates.
pub const FIRST_VALID_RECORDING_YEAR: i32 = 1995;

// ---------------------------------------------------------------------------
// Source format
// ---------------------------------------------------------------------------

/// How the analysed source carries its DV essence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SourceFormat {
    /// Raw DIF stream; frames are addressable by byte offset.
    Elementary,
    /// DV wrapped in another container (QuickTime, AVI, Matroska, ...).
    Wrapped(String),
}

impl SourceFormat {
    /// Classify the `format` attribute reported by the analysis tool.
    pub fn from_log_format(format: &str) -> Self {
        if format.trim().eq_ignore_ascii_case("dv") {
            SourceFormat::Elementary
        } else {
            SourceFormat::Wrapped(format.trim().to_string())
        }
    }

    pub fn is_elementary(&self) -> bool {
        matches!(self, SourceFormat::Elementary)
    }
}

// ---------------------------------------------------------------------------
// Frames
// ---------------------------------------------------------------------------

/// Technical characteristics; a change in any of them forces a new range
/// unless splitting is disabled.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TechnicalAttributes {
    pub video_rate: Option<String>,
    pub chroma_subsampling: Option<String>,
    pub aspect_ratio: Option<String>,
    pub audio_rate: Option<String>,
    pub channel_count: Option<u32>,
}

impl TechnicalAttributes {
    /// Compact one-line description for reports.
    pub fn summary(&self) -> String {
        let field = |v: &Option<String>| v.clone().unwrap_or_else(|| "?".into());
        format!(
            "{} {} {} {}Hz {}ch",
            field(&self.video_rate),
            field(&self.chroma_subsampling),
            field(&self.aspect_ratio),
            field(&self.audio_rate),
            self.channel_count
                .map(|c| c.to_string())
                .unwrap_or_else(|| "?".into()),
        )
    }
}

/// One captured frame as described by the frame log.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrameRecord {
    pub pts: Timestamp,
    pub end_pts: Option<Timestamp>,
    pub index: u64,
    pub timecode: Option<String>,
    /// Raw recording date/time string as found in the log.
    pub recording_timestamp: Option<String>,
    pub byte_offset: Option<u64>,
    pub size: Option<u64>,
    pub technical: TechnicalAttributes,
    pub recording_start: bool,
    pub recording_timestamp_discontinuity: bool,
    pub timecode_discontinuity: bool,
}

impl FrameRecord {
    /// Whether any chapter-worthy marker is set on this frame.
    pub fn has_marker(&self) -> bool {
        self.recording_start || self.recording_timestamp_discontinuity || self.timecode_discontinuity
    }

    /// The recording date/time, if present and plausible.
    pub fn recording_datetime(&self) -> Option<NaiveDateTime> {
        let raw = self.recording_timestamp.as_deref()?.trim();
        ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S%.f"]
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
            .filter(|dt| dt.year() >= FIRST_VALID_RECORDING_YEAR)
    }
}

/// Everything the loader extracts from one frame log.
#[derive(Debug, Clone)]
pub struct FrameLog {
    pub format: SourceFormat,
    pub frames: Vec<FrameRecord>,
}

// ---------------------------------------------------------------------------
// Output plans
// ---------------------------------------------------------------------------

/// What happens to side-channel subtitle and caption tracks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SubtitleHandling {
    /// Embed as a subtitle stream using the given codec.
    Embed { codec: String },
    /// The container carries only the elementary stream.
    Disabled,
}

/// Fixed stream-mapping and codec policy for one output extension.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputPlan {
    pub extension: String,
    /// Muxer name handed to the remux engine.
    pub container_format: String,
    pub audio_codec: String,
    pub subtitle_handling: SubtitleHandling,
    pub resample_audio: bool,
    /// Whether chapter metadata can be merged into the container.
    pub chapters: bool,
}

impl OutputPlan {
    pub fn subtitle_codec(&self) -> Option<&str> {
        match &self.subtitle_handling {
            SubtitleHandling::Embed { codec } => Some(codec),
            SubtitleHandling::Disabled => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Ranges
// ---------------------------------------------------------------------------

/// End boundary of a [`Range`], expressed as positions in the frame sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeEnd {
    /// Exclusive end: the position of the next range's first frame.
    Bounded(usize),
    /// Final range; runs to end of stream. `last` is the last frame's position.
    Open { last: usize },
}

/// A contiguous span of frames that becomes one output file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Range {
    pub start_frame: usize,
    pub end_frame: RangeEnd,
    pub start_pts: Timestamp,
    pub end_pts: Timestamp,
    /// Copied from the first frame of the range.
    pub technical: TechnicalAttributes,
    pub byte_offset: Option<u64>,
}

impl Range {
    pub fn duration(&self) -> Timestamp {
        self.end_pts - self.start_pts
    }

    pub fn is_open(&self) -> bool {
        matches!(self.end_frame, RangeEnd::Open { .. })
    }

    /// Exclusive end position in the frame sequence.
    pub fn end_position(&self) -> usize {
        match self.end_frame {
            RangeEnd::Bounded(end) => end,
            RangeEnd::Open { last } => last + 1,
        }
    }

    pub fn frame_count(&self) -> usize {
        self.end_position() - self.start_frame
    }

    /// Frame limit for extraction; open ranges run to end of stream.
    pub fn frame_limit(&self) -> Option<usize> {
        match self.end_frame {
            RangeEnd::Bounded(end) => Some(end - self.start_frame),
            RangeEnd::Open { .. } => None,
        }
    }

    /// Whether `pts` falls inside this range. The open final range also
    /// includes its own end point.
    pub fn contains_pts(&self, pts: Timestamp) -> bool {
        if self.is_open() {
            pts >= self.start_pts && pts <= self.end_pts
        } else {
            pts >= self.start_pts && pts < self.end_pts
        }
    }
}
