//! Human-readable range table for `--report-only`.

use std::fmt::Write as _;

use dvp_core::{FrameRecord, Range};

use super::chapters;

pub fn range_table(frames: &[FrameRecord], ranges: &[Range]) -> String {
    let mut out = format!(
        "{:>3}  {:<15} {:<15} {:>7}  {:>11}  {:>4}  {}\n",
        "#", "START", "END", "FRAMES", "BYTES", "CHAP", "TECHNICAL"
    );
    for (i, range) in ranges.iter().enumerate() {
        let end = if range.is_open() {
            format!("{} (eos)", range.end_pts)
        } else {
            range.end_pts.to_string()
        };
        let bytes = range_bytes(frames, range).map_or_else(|| "-".into(), |b| b.to_string());
        let _ = writeln!(
            out,
            "{:>3}  {:<15} {:<15} {:>7}  {:>11}  {:>4}  {}",
            i + 1,
            range.start_pts.to_string(),
            end,
            range.frame_count(),
            bytes,
            chapters::synthesize(frames, range).len(),
            range.technical.summary()
        );
    }
    out
}

/// Total frame size of `range`, when every frame in it reports one.
fn range_bytes(frames: &[FrameRecord], range: &Range) -> Option<u64> {
    frames
        .get(range.start_frame..range.end_position())?
        .iter()
        .try_fold(0u64, |total, frame| total.checked_add(frame.size?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use dvp_core::{RangeEnd, TechnicalAttributes, Timestamp};

    #[test]
    fn one_row_per_range() {
        let technical = TechnicalAttributes {
            video_rate: Some("30000/1001".into()),
            chroma_subsampling: Some("4:1:1".into()),
            aspect_ratio: Some("4/3".into()),
            audio_rate: Some("48000".into()),
            channel_count: Some(2),
        };
        let ranges = vec![
            Range {
                start_frame: 0,
                end_frame: RangeEnd::Bounded(2),
                start_pts: Timestamp::ZERO,
                end_pts: Timestamp::from_millis(66),
                technical: technical.clone(),
                byte_offset: Some(0),
            },
            Range {
                start_frame: 2,
                end_frame: RangeEnd::Open { last: 2 },
                start_pts: Timestamp::from_millis(66),
                end_pts: Timestamp::from_millis(99),
                technical,
                byte_offset: Some(240_000),
            },
        ];

        let mut frames: Vec<FrameRecord> = (0..3)
            .map(|i| FrameRecord {
                index: i,
                size: Some(120_000),
                ..Default::default()
            })
            .collect();
        frames[2].size = None;

        let table = range_table(&frames, &ranges);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].contains("START"));
        assert!(lines[0].contains("BYTES"));
        assert!(lines[1].contains("00:00:00.000"));
        assert!(lines[1].contains(" 240000 "));
        assert!(lines[2].contains(" - "));
        assert!(lines[1].contains("30000/1001 4:1:1 4/3 48000Hz 2ch"));
        assert!(lines[2].contains("(eos)"));
    }
}
