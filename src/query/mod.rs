//! Query engines over the frame index.
//!
//! Continuous queries reconstruct a rectangular calibrated sample grid for
//! a time window and channel subset; discrete queries return ordered spike
//! and event occurrences. Both are pure functions of the immutable index,
//! the request, and the file's byte content, so any number may run
//! concurrently once a recording is open.

mod continuous;
mod discrete;

pub use continuous::{ContInfo, GapFill};
pub use discrete::{Spike, SpikeInfo};
