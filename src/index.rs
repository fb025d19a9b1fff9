//! The frame index built by the one-pass scan.
//!
//! A [`Frame`] describes one contiguous run of data blocks sharing a
//! category and an acquisition timestamp: for continuous categories that is
//! one acquisition chunk (one block per enabled channel), for spike and
//! event categories a burst of occurrences stamped at the same tick. Frames
//! are created only during the indexing scan and never mutated afterward;
//! queries consult them through [`FrameSet::find_overlapping`] and issue
//! reads into the original file, never re-scanning.
//!
//! With the `serde` feature the whole index can be saved to a JSON sidecar
//! file and loaded later, skipping the scan when a large recording is
//! reopened:
//!
//! ```no_run
//! use plx_rs::{PlxIndex, Recording, Result};
//!
//! fn reopen_fast() -> Result<()> {
//!     let recording = Recording::open("session.plx")?;
//!     recording.index().save_to_file("session.plx.index")?;
//!
//!     // Later: no scan, just descriptor parsing
//!     let index = PlxIndex::load_from_file("session.plx.index")?;
//!     let recording = Recording::open_with_index("session.plx", index)?;
//!     let _ = recording.summary();
//!     Ok(())
//! }
//! ```

use crate::types::ChannelType;

#[cfg(feature = "serde")]
use crate::{Error, Result};

/// One contiguous run of data blocks for one channel-type category.
///
/// `begin..end` is the byte range of the underlying blocks, headers
/// included. For continuous frames, `samples` is the per-channel sample
/// count of the chunk and `duration` its length in timestamp ticks; discrete
/// frames are points in time (`duration` 0) and `samples` is the payload
/// word count per block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Frame {
    /// Start timestamp in ticks of the timestamp clock
    pub ts: u64,
    /// File offset of the first block header
    pub begin: u64,
    /// File offset one past the last payload byte
    pub end: u64,
    /// Payload sample words per block
    pub samples: u32,
    /// Number of blocks in the run
    pub nblocks: u32,
    /// Length in ticks; 0 for discrete frames
    pub duration: u64,
}

impl Frame {
    /// First tick after the frame (equal to `ts` for discrete frames).
    pub fn end_ts(&self) -> u64 {
        self.ts + self.duration
    }

    /// Whether the frame intersects the half-open tick window `[t0, t1)`.
    ///
    /// A discrete frame is a point and intersects when its timestamp falls
    /// inside the window.
    pub fn overlaps(&self, t0: u64, t1: u64) -> bool {
        self.ts < t1 && self.ts + self.duration.max(1) > t0
    }

    /// Byte stride from one block in the frame to the next.
    pub fn block_stride(&self) -> u64 {
        16 + self.samples as u64 * 2
    }
}

/// Ordered, append-only sequence of frames for one category.
///
/// Timestamps are non-decreasing across consecutive frames; equal
/// timestamps occur only for zero-duration markers. The set also carries
/// the scan totals the summary and consistency reports are built from.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FrameSet {
    frames: Vec<Frame>,
    /// Total data blocks indexed into this set
    pub blocks: u64,
    /// Total payload sample words indexed into this set
    pub samples: u64,
    /// Channel roster in within-frame block order (continuous categories)
    pub channels: Vec<i32>,
    /// Blocks whose timestamp ran backwards for their channel
    pub non_monotonic: u64,
}

impl FrameSet {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        FrameSet {
            frames: Vec::with_capacity(capacity),
            ..FrameSet::default()
        }
    }

    pub(crate) fn push(&mut self, frame: Frame) {
        self.frames.push(frame);
    }

    /// All frames, ascending by timestamp.
    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Tick range `[first_ts, last_end_ts)` covered by this set, if any.
    pub fn coverage(&self) -> Option<(u64, u64)> {
        let first = self.frames.first()?;
        let last = self.frames.last()?;
        Some((first.ts, last.ts + last.duration.max(1)))
    }

    /// All frames intersecting the half-open tick window `[t0, t1)`, in
    /// ascending timestamp order.
    ///
    /// Binary search for the lower bound, then a contiguous slice: frames
    /// are sorted and non-overlapping, so their end ticks are sorted too.
    pub fn find_overlapping(&self, t0: u64, t1: u64) -> &[Frame] {
        if t0 >= t1 || self.frames.is_empty() {
            return &[];
        }
        let lo = self
            .frames
            .partition_point(|f| f.ts + f.duration.max(1) <= t0);
        let n = self.frames[lo..].partition_point(|f| f.ts < t1);
        &self.frames[lo..lo + n]
    }
}

/// Complete index of a recording: one [`FrameSet`] per category, built in a
/// single forward pass over the data region. Immutable after construction
/// and safe to share across query threads.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PlxIndex {
    /// Size of the indexed file, for sidecar validation
    pub file_size: u64,
    /// File offset of the first data block
    pub data_start: u64,
    /// Data blocks with an unrecognized type tag, skipped by the scan
    pub unclassified: u64,
    sets: Vec<FrameSet>,
}

impl PlxIndex {
    pub(crate) fn new(file_size: u64, data_start: u64) -> Self {
        // One frame per ~4 KiB of data region is a comfortable overestimate
        // for typical chunk sizes; grows if exceeded.
        let per_set = ((file_size.saturating_sub(data_start)) / 4096) as usize;
        PlxIndex {
            file_size,
            data_start,
            unclassified: 0,
            sets: (0..ChannelType::COUNT)
                .map(|_| FrameSet::with_capacity(per_set / ChannelType::COUNT + 1))
                .collect(),
        }
    }

    /// The frame set for one category.
    pub fn frames(&self, category: ChannelType) -> &FrameSet {
        &self.sets[category.index()]
    }

    pub(crate) fn frames_mut(&mut self, category: ChannelType) -> &mut FrameSet {
        &mut self.sets[category.index()]
    }

    /// Save the index to a JSON sidecar file.
    #[cfg(feature = "serde")]
    pub fn save_to_file(&self, index_path: &str) -> Result<()> {
        let json = serde_json::to_string(self)
            .map_err(|e| Error::IndexSerializationError(e.to_string()))?;
        std::fs::write(index_path, json).map_err(Error::IoError)?;
        Ok(())
    }

    /// Load an index from a JSON sidecar file.
    #[cfg(feature = "serde")]
    pub fn load_from_file(index_path: &str) -> Result<Self> {
        let json = std::fs::read_to_string(index_path).map_err(Error::IoError)?;
        let index: PlxIndex =
            serde_json::from_str(&json).map_err(|e| Error::IndexSerializationError(e.to_string()))?;
        if index.sets.len() != ChannelType::COUNT {
            return Err(Error::IndexSerializationError(format!(
                "expected {} frame sets, found {}",
                ChannelType::COUNT,
                index.sets.len()
            )));
        }
        Ok(index)
    }
}
