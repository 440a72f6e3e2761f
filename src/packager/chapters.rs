//! Chapter markers for one output file.
//!
//! Every frame carrying a recording-start or discontinuity marker becomes a
//! chapter of the range it falls in, whether or not the marker also split the
//! file. Chapter times are relative to the start of the range.

use std::fmt::Write as _;

use dvp_core::{FrameRecord, Range, Timestamp};

/// Chapter times use the same fixed-point base as [`Timestamp`].
const TIMEBASE: &str = "1/100000";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chapter {
    pub start: Timestamp,
    pub end: Timestamp,
    pub title: String,
}

/// Derive the chapters of `range` from the marker frames it contains.
pub fn synthesize(frames: &[FrameRecord], range: &Range) -> Vec<Chapter> {
    let marks: Vec<(Timestamp, String)> = frames
        .iter()
        .filter(|f| f.has_marker() && range.contains_pts(f.pts))
        .enumerate()
        .map(|(i, f)| (f.pts - range.start_pts, title(f, i + 1)))
        .collect();

    let duration = range.duration();
    marks
        .iter()
        .enumerate()
        .map(|(i, (start, title))| Chapter {
            start: *start,
            end: marks.get(i + 1).map(|(next, _)| *next).unwrap_or(duration),
            title: title.clone(),
        })
        .collect()
}

fn title(frame: &FrameRecord, number: usize) -> String {
    let rdt = frame
        .recording_datetime()
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string());

    match (frame.timecode.as_deref(), rdt) {
        (Some(tc), Some(rdt)) => format!("{tc} {rdt}"),
        (Some(tc), None) => tc.to_string(),
        (None, Some(rdt)) => rdt,
        (None, None) => format!("Chapter {number}"),
    }
}

/// Render chapters as an ffmetadata document.
pub fn write_ffmetadata(chapters: &[Chapter]) -> String {
    let mut out = String::from(";FFMETADATA1\n");
    for chapter in chapters {
        // Writing to a String cannot fail.
        let _ = write!(
            out,
            "\n[CHAPTER]\nTIMEBASE={TIMEBASE}\nSTART={}\nEND={}\ntitle={}\n",
            chapter.start.units(),
            chapter.end.units(),
            escape(&chapter.title)
        );
    }
    out
}

fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '=' | ';' | '#' | '\\' | '\n') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
