// src/check.rs
//! Frame cadence validation for continuous categories.

use tracing::warn;

use crate::{index::FrameSet, types::ChannelType};

/// Count cadence violations between consecutive frames of one continuous
/// category's frame set.
///
/// With a regular acquisition cadence, each frame's declared sample count
/// times the channel's tick-per-sample stride lands exactly on the next
/// frame's start timestamp. Any divergence means samples were dropped or
/// duplicated at that boundary. Violations are logged and counted, never
/// raised, so one corrupt region cannot mask anomalies further on.
pub(crate) fn check_frames(category: ChannelType, set: &FrameSet) -> usize {
    let mut invalid = 0;
    for pair in set.frames().windows(2) {
        let (frame, next) = (&pair[0], &pair[1]);
        if frame.ts + frame.duration != next.ts {
            warn!(
                category = %category,
                ts = frame.ts,
                samples = frame.samples,
                expected_next = frame.ts + frame.duration,
                actual_next = next.ts,
                "frame cadence violation"
            );
            invalid += 1;
        }
    }
    invalid
}
