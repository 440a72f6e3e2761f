//! Partitioning of the frame sequence into output ranges.

use dvp_core::{FrameRecord, Range, RangeEnd};

use super::breakpoints::BreakpointSelector;

/// Fold state: ranges closed so far and the position of the current head.
#[derive(Default)]
struct Partition {
    closed: Vec<Range>,
    head: Option<usize>,
}

/// Split `frames` into ranges that cover every frame exactly once, in order.
///
/// Each range ends where the next breakpoint begins. The last range is open
/// and runs to the end of the stream.
pub fn build_ranges(frames: &[FrameRecord], selector: &BreakpointSelector) -> Vec<Range> {
    let partition = frames
        .iter()
        .enumerate()
        .fold(Partition::default(), |mut acc, (pos, frame)| {
            let head = acc.head.map(|h| &frames[h]);
            if selector.is_breakpoint(head, frame) {
                if let Some(start) = acc.head {
                    acc.closed.push(bounded(frames, start, pos));
                }
                acc.head = Some(pos);
            }
            acc
        });

    let mut ranges = partition.closed;
    if let Some(start) = partition.head {
        ranges.push(open(frames, start));
    }
    ranges
}

fn bounded(frames: &[FrameRecord], start: usize, end: usize) -> Range {
    let last = &frames[end - 1];
    Range {
        end_frame: RangeEnd::Bounded(end),
        end_pts: last.end_pts.unwrap_or(frames[end].pts),
        ..head_of(&frames[start], start)
    }
}

fn open(frames: &[FrameRecord], start: usize) -> Range {
    let last = frames.len() - 1;
    let last_frame = &frames[last];
    Range {
        end_frame: RangeEnd::Open { last },
        end_pts: last_frame.end_pts.unwrap_or(last_frame.pts),
        ..head_of(&frames[start], start)
    }
}

fn head_of(frame: &FrameRecord, position: usize) -> Range {
    Range {
        start_frame: position,
        end_frame: RangeEnd::Open { last: position },
        start_pts: frame.pts,
        end_pts: frame.pts,
        technical: frame.technical.clone(),
        byte_offset: frame.byte_offset,
    }
}
