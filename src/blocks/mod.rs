//! On-disk record layouts for the PLX format.
//!
//! Every type in this module is a typed, read-only view over a fixed-size
//! byte region: the 7504-byte [`FileHeader`], the three channel descriptor
//! kinds that follow it in fixed order (spike, event, slow), and the 16-byte
//! [`DataBlockHeader`] that repeats through the data region. Decoding is
//! byte-layout only; all interpretation lives in the index and query layers.

pub mod common;
mod data_block;
mod event_header;
mod file_header;
mod slow_header;
mod spike_header;

pub use common::RecordParse;
pub use data_block::{
    BLOCK_TYPE_CONTINUOUS, BLOCK_TYPE_EVENT, BLOCK_TYPE_SPIKE, BLOCK_TYPE_STEREOTRODE,
    BLOCK_TYPE_TETRODE, DataBlockHeader,
};
pub use event_header::EventChannelHeader;
pub use file_header::{
    FileHeader, HDR_FIRST_CONT_IDX, HDR_LAST_CONT_CHAN, HDR_LAST_EVENT_CHAN, HDR_LAST_SPIKE_CHAN,
    HDR_LAST_UNIT, MAX_VERSION, MIN_VERSION, PLX_MAGIC,
};
pub use slow_header::SlowChannelHeader;
pub use spike_header::SpikeChannelHeader;
