// src/channels.rs
//! The channel descriptor tables parsed from the region between the file
//! header and the first data block.

use crate::{
    Error, Result,
    blocks::{EventChannelHeader, FileHeader, RecordParse, SlowChannelHeader, SpikeChannelHeader},
    reader::ByteRangeReader,
    types::ChannelType,
};

/// All channel descriptors of a recording, in file order.
///
/// Owned exclusively by the open recording and immutable after load.
/// Spike and event channels are numbered from 1, slow channels from 0.
#[derive(Debug, Clone)]
pub(crate) struct ChannelTable {
    pub spike: Vec<SpikeChannelHeader>,
    pub event: Vec<EventChannelHeader>,
    pub slow: Vec<SlowChannelHeader>,
}

impl ChannelTable {
    /// Parse the descriptor region that immediately follows the file header.
    ///
    /// Fails with `TruncatedFile` when the declared channel counts would
    /// read past the end of the file.
    pub fn from_reader<R: ByteRangeReader<Error = Error>>(
        reader: &mut R,
        header: &FileHeader,
        offset: u64,
        file_size: u64,
    ) -> Result<ChannelTable> {
        let n_spike = header.num_dsp_channels.max(0) as u64;
        let n_event = header.num_event_channels.max(0) as u64;
        let n_slow = header.num_slow_channels.max(0) as u64;

        let region = n_spike * SpikeChannelHeader::SIZE as u64
            + n_event * EventChannelHeader::SIZE as u64
            + n_slow * SlowChannelHeader::SIZE as u64;
        if offset + region > file_size {
            return Err(Error::TruncatedFile {
                offset,
                needed: region,
                available: file_size.saturating_sub(offset),
            });
        }

        let bytes = reader.read_range(offset, region)?;
        let mut pos = 0usize;

        let mut spike = Vec::with_capacity(n_spike as usize);
        for _ in 0..n_spike {
            spike.push(SpikeChannelHeader::from_bytes(&bytes[pos..])?);
            pos += SpikeChannelHeader::SIZE;
        }
        let mut event = Vec::with_capacity(n_event as usize);
        for _ in 0..n_event {
            event.push(EventChannelHeader::from_bytes(&bytes[pos..])?);
            pos += EventChannelHeader::SIZE;
        }
        let mut slow = Vec::with_capacity(n_slow as usize);
        for _ in 0..n_slow {
            slow.push(SlowChannelHeader::from_bytes(&bytes[pos..])?);
            pos += SlowChannelHeader::SIZE;
        }

        Ok(ChannelTable { spike, event, slow })
    }

    /// Byte length of the descriptor region for this table.
    pub fn region_len(&self) -> u64 {
        self.spike.len() as u64 * SpikeChannelHeader::SIZE as u64
            + self.event.len() as u64 * EventChannelHeader::SIZE as u64
            + self.slow.len() as u64 * SlowChannelHeader::SIZE as u64
    }

    /// Look up a spike channel by its 1-based number.
    pub fn spike_channel(&self, channel: i32) -> Result<&SpikeChannelHeader> {
        self.spike
            .iter()
            .find(|c| c.channel == channel)
            .ok_or(Error::UnknownChannel {
                category: "spike",
                channel,
            })
    }

    /// Look up an event channel by its 1-based number.
    pub fn event_channel(&self, channel: i32) -> Result<&EventChannelHeader> {
        self.event
            .iter()
            .find(|c| c.channel == channel)
            .ok_or(Error::UnknownChannel {
                category: "event",
                channel,
            })
    }

    /// Look up a slow channel by its 0-based number.
    pub fn slow_channel(&self, channel: i32) -> Result<&SlowChannelHeader> {
        self.slow
            .iter()
            .find(|c| c.channel == channel)
            .ok_or(Error::UnknownChannel {
                category: "slow",
                channel,
            })
    }

    /// Continuous category a slow channel belongs to.
    ///
    /// The acquisition system encodes the filtering convention in the
    /// channel name: `WB*` wideband, `SPKC*` spike-band continuous, `FP*`
    /// field potential. Anything else is generic analog input.
    pub fn classify_slow(slow: &SlowChannelHeader) -> ChannelType {
        let name = slow.name.to_ascii_uppercase();
        if name.starts_with("WB") {
            ChannelType::Wideband
        } else if name.starts_with("SPKC") {
            ChannelType::SpikeContinuous
        } else if name.starts_with("FP") {
            ChannelType::Lfp
        } else {
            ChannelType::Analog
        }
    }

    /// Enabled slow channels of one continuous category, ascending by
    /// channel number.
    pub fn continuous_channels(&self, category: ChannelType) -> Vec<&SlowChannelHeader> {
        let mut chans: Vec<&SlowChannelHeader> = self
            .slow
            .iter()
            .filter(|c| c.enabled && Self::classify_slow(c) == category)
            .collect();
        chans.sort_by_key(|c| c.channel);
        chans
    }
}
