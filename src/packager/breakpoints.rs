//! Breakpoint decisions: which frames start a new output file.

use dvp_core::config::BreakpointPolicy;
use dvp_core::FrameRecord;

/// Applies a [`BreakpointPolicy`] to consecutive frames.
#[derive(Debug, Clone, Copy)]
pub struct BreakpointSelector {
    policy: BreakpointPolicy,
}

impl BreakpointSelector {
    pub fn new(policy: BreakpointPolicy) -> Self {
        Self { policy }
    }

    /// Whether `frame` opens a new range, given the first frame of the range
    /// currently being built (`None` before the first frame).
    ///
    /// Technical attributes are compared against the range head, not the
    /// previous frame.
    pub fn is_breakpoint(&self, range_head: Option<&FrameRecord>, frame: &FrameRecord) -> bool {
        let Some(head) = range_head else {
            return true;
        };
        if self.policy.force_no_split {
            return false;
        }

        frame.technical != head.technical
            || (self.policy.split_on_recording_start && frame.recording_start)
            || (self.policy.split_on_recording_timestamp_discontinuity
                && frame.recording_timestamp_discontinuity)
            || (self.policy.split_on_timecode_discontinuity && frame.timecode_discontinuity)
    }
}
