// src/blocks/event_header.rs
//! Static metadata for one digital event channel.

use crate::{
    Error, Result,
    blocks::common::{RecordParse, read_cstr, read_i32, read_u16},
};

/// Descriptor for one event channel; 296 bytes on disk. `channel` is 1-based.
#[derive(Debug, Clone)]
pub struct EventChannelHeader {
    /// Name given to this event
    pub name: String,
    /// Event channel number, 1-based
    pub channel: i32,
    /// Comment (v >= 105)
    pub comment: String,
    /// Acquisition source id (v >= 106)
    pub src_id: u8,
    /// Channel id within the source (v >= 106)
    pub chan_id: u16,
}

impl RecordParse for EventChannelHeader {
    const SIZE: usize = 296;

    fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < Self::SIZE {
            return Err(Error::TooShortBuffer {
                actual: bytes.len(),
                expected: Self::SIZE,
                file: file!(),
                line: line!(),
            });
        }

        Ok(Self {
            name: read_cstr(bytes, 0, 32),
            channel: read_i32(bytes, 32),
            comment: read_cstr(bytes, 36, 128),
            src_id: bytes[164],
            chan_id: read_u16(bytes, 166),
        })
    }
}
