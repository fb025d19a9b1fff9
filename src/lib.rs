#![forbid(unsafe_code)]

//! # plx-rs
//!
//! A Rust library for indexing and querying Plexon PLX electrophysiology
//! recordings.
//!
//! PLX is a binary file format produced by multi-channel acquisition
//! hardware: a fixed header, per-channel metadata descriptors, and a long
//! stream of variable-length data blocks (spike waveforms, digital events,
//! continuous samples) interleaved in acquisition-timestamp order. Files
//! routinely run to many gigabytes, so this crate never loads one into
//! memory: opening performs a single sequential scan that builds a compact
//! per-category frame index, and every query after that maps its time
//! window onto the minimal set of byte ranges to read back.
//!
//! ## Features
//!
//! - **Indexing**: one-pass scan into per-channel-type frame sets with
//!   binary-search lookup by time
//! - **Continuous queries**: arbitrary time window and channel subset,
//!   reconstructed onto one calibrated sample grid
//! - **Discrete queries**: ordered spike/event occurrences, waveforms on
//!   request
//! - **Validation**: frame cadence checking that surfaces dropped or
//!   duplicated blocks
//! - **Index sidecars**: save the index as JSON and reopen large files
//!   without re-scanning (`serde` feature)
//!
//! ## Quick Start
//!
//! ### Reading continuous data
//!
//! ```no_run
//! use plx_rs::{ChannelType, Recording, Result};
//!
//! fn main() -> Result<()> {
//!     let recording = Recording::open("session.plx")?;
//!
//!     for row in recording.summary() {
//!         println!("{:>8}: {} / {}", row.category, row.indexed, row.declared);
//!     }
//!
//!     // Half a second of LFP from three channels, in millivolts
//!     let info = recording.resolve_continuous(
//!         ChannelType::Lfp,
//!         10.0,
//!         10.5,
//!         Some(&[0, 1, 2]),
//!     )?;
//!     let (rows, cols) = info.shape();
//!     let mut grid = vec![0.0f64; rows * cols];
//!     info.read(&mut grid)?;
//!     Ok(())
//! }
//! ```
//!
//! ### Reading spikes
//!
//! ```no_run
//! use plx_rs::{ChannelType, Recording, Result};
//!
//! fn main() -> Result<()> {
//!     let recording = Recording::open("session.plx")?;
//!
//!     let mut info =
//!         recording.resolve_discrete(ChannelType::Spike, 0.0, 60.0, None, Some(&[1, 2]))?;
//!     info.set_include_waveforms(true);
//!
//!     for spike in info.read()? {
//!         println!(
//!             "t={:.6} ch={} unit={}",
//!             spike.timestamp, spike.channel, spike.unit
//!         );
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Module Overview
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`blocks`] | On-disk record layouts (for advanced use) |
//! | [`index`] | Frames, frame sets, and the recording index |
//! | [`query`] | Continuous and discrete query engines |
//! | [`reader`] | Byte-range readers the engines issue I/O through |
//! | [`error`] | Error types and [`Result`] alias |
//!
//! ## Error Handling
//!
//! All fallible operations return [`Result<T>`], an alias for
//! `core::result::Result<T, Error>`. Structural failures (`MalformedHeader`,
//! `TruncatedFile`) abort opening entirely; query-time failures are returned
//! per call and never disturb the index. Scan anomalies and cadence
//! violations are logged through `tracing` and counted rather than raised.

pub mod blocks;
pub mod error;
pub mod index;
pub mod query;
pub mod reader;

mod channels;
mod check;
mod recording;
mod scan;
mod types;

// Re-export commonly used types at the crate root
pub use blocks::{
    DataBlockHeader, EventChannelHeader, FileHeader, SlowChannelHeader, SpikeChannelHeader,
};
pub use error::{Error, Result};
pub use index::{Frame, FrameSet, PlxIndex};
pub use query::{ContInfo, GapFill, Spike, SpikeInfo};
pub use reader::{BufferedRangeReader, ByteRangeReader, FileRangeReader};
pub use recording::{CategorySummary, Recording};
pub use types::ChannelType;
