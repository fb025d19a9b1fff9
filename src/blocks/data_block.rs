// src/blocks/data_block.rs
//! The repeating unit of the data-block stream.

use crate::{
    Result,
    blocks::common::{RecordParse, read_i16, read_u16, read_u32, validate_buffer_size},
};

/// Block type tag for a single-electrode spike waveform.
pub const BLOCK_TYPE_SPIKE: i16 = 1;
/// Reserved stereotrode tag; indexed with the spike category.
pub const BLOCK_TYPE_STEREOTRODE: i16 = 2;
/// Reserved tetrode tag; indexed with the spike category.
pub const BLOCK_TYPE_TETRODE: i16 = 3;
/// Block type tag for a digital event.
pub const BLOCK_TYPE_EVENT: i16 = 4;
/// Block type tag for a run of continuous samples.
pub const BLOCK_TYPE_CONTINUOUS: i16 = 5;

/// 16-byte header preceding every data block's sample payload.
///
/// The payload is `num_waveforms * num_words` signed 16-bit sample words,
/// immediately following the header. Blocks appear in non-decreasing
/// timestamp order within the stream; the indexing scan relies on that.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DataBlockHeader {
    /// Block type tag, one of the `BLOCK_TYPE_*` constants
    pub block_type: i16,
    /// Upper 8 bits of the 40-bit timestamp
    pub upper_ts: u16,
    /// Lower 32 bits of the 40-bit timestamp
    pub timestamp: u32,
    /// Channel number (1-based for spikes/events, 0-based for continuous)
    pub channel: i16,
    /// Sorted unit number for spikes (0 = unsorted), or event strobe value
    pub unit: i16,
    /// Number of waveforms in the payload, usually 0 or 1
    pub num_waveforms: i16,
    /// Samples per waveform in the payload
    pub num_words: i16,
}

impl RecordParse for DataBlockHeader {
    const SIZE: usize = 16;

    fn from_bytes(bytes: &[u8]) -> Result<Self> {
        validate_buffer_size(bytes, Self::SIZE)?;

        Ok(Self {
            block_type: read_i16(bytes, 0),
            upper_ts: read_u16(bytes, 2),
            timestamp: read_u32(bytes, 4),
            channel: read_i16(bytes, 8),
            unit: read_i16(bytes, 10),
            num_waveforms: read_i16(bytes, 12),
            num_words: read_i16(bytes, 14),
        })
    }
}

impl DataBlockHeader {
    /// The full 40-bit timestamp reassembled into 64 bits.
    ///
    /// All comparisons and arithmetic must use this value, never the raw
    /// high/low fields.
    pub fn ts(&self) -> u64 {
        ((self.upper_ts as u64) << 32) | self.timestamp as u64
    }

    /// Total sample words in the payload that follows this header.
    pub fn payload_words(&self) -> u64 {
        self.num_waveforms.max(0) as u64 * self.num_words.max(0) as u64
    }

    /// Byte length of the payload that follows this header.
    pub fn payload_len(&self) -> u64 {
        self.payload_words() * 2
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timestamp_reassembly() {
        let header = DataBlockHeader {
            block_type: BLOCK_TYPE_SPIKE,
            upper_ts: 0x2A,
            timestamp: 0xDEAD_BEEF,
            channel: 1,
            unit: 0,
            num_waveforms: 1,
            num_words: 32,
        };
        assert_eq!(header.ts(), 0x2A_DEAD_BEEF);
    }

    #[test]
    fn test_payload_length() {
        let mut bytes = [0u8; 16];
        bytes[0] = 5; // continuous
        bytes[12] = 1; // one waveform
        bytes[14..16].copy_from_slice(&100i16.to_le_bytes());
        let header = DataBlockHeader::from_bytes(&bytes).unwrap();
        assert_eq!(header.payload_words(), 100);
        assert_eq!(header.payload_len(), 200);
    }

    #[test]
    fn test_negative_counts_clamp_to_empty() {
        let header = DataBlockHeader {
            block_type: BLOCK_TYPE_EVENT,
            upper_ts: 0,
            timestamp: 100,
            channel: 257,
            unit: 12,
            num_waveforms: -1,
            num_words: 4,
        };
        assert_eq!(header.payload_len(), 0);
    }
}
