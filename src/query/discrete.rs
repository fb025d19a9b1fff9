// src/query/discrete.rs
//! Time-window retrieval of spike and event occurrences.
//!
//! Resolution walks the 16-byte block headers of the frames overlapping the
//! window (a buffered reader turns that into a few sequential fills) and
//! records the location of each matching occurrence, so the record count is
//! exact before any payload is touched. Waveform payloads dominate I/O
//! volume and are fetched only when the caller asks for them.

use std::collections::HashMap;

use crate::{
    Error, Result,
    blocks::{DataBlockHeader, RecordParse},
    reader::{BufferedRangeReader, ByteRangeReader},
    recording::Recording,
    types::ChannelType,
};

/// One spike or event occurrence, produced as query output.
///
/// For events, `unit` carries the strobe value. The waveform, when
/// requested, is calibrated to millivolts for spikes and left as raw counts
/// for the rare event block that carries data words.
#[derive(Debug, Clone, PartialEq)]
pub struct Spike {
    /// Occurrence time in timestamp-clock ticks
    pub ticks: u64,
    /// Occurrence time in seconds
    pub timestamp: f64,
    /// Channel number (1-based)
    pub channel: i32,
    /// Sorted unit number (0 = unsorted), or event strobe value
    pub unit: i32,
    /// Waveform samples, present only when requested at read time
    pub waveform: Option<Vec<f64>>,
}

/// Location of one matching occurrence, recorded during resolution.
#[derive(Debug, Clone, Copy)]
struct SpikeRef {
    offset: u64,
    ts: u64,
    channel: i16,
    unit: i16,
    words: u32,
}

/// Resolved discrete query: the exact set of matching occurrences.
///
/// Ephemeral; borrow of the recording ends with it. Created by
/// [`Recording::resolve_discrete`], consumed by [`SpikeInfo::read`].
#[derive(Debug)]
pub struct SpikeInfo<'r> {
    rec: &'r Recording,
    category: ChannelType,
    t_start: f64,
    t_end: f64,
    matches: Vec<SpikeRef>,
    include_waveforms: bool,
}

impl<'r> SpikeInfo<'r> {
    pub(crate) fn resolve<R: ByteRangeReader<Error = Error>>(
        rec: &'r Recording,
        reader: &mut R,
        category: ChannelType,
        t_start: f64,
        t_end: f64,
        channels: Option<&[i32]>,
        units: Option<&[i32]>,
    ) -> Result<SpikeInfo<'r>> {
        if !category.is_discrete() {
            return Err(Error::WrongChannelType {
                requested: category,
                expected: "discrete",
            });
        }
        if !(t_start < t_end) {
            return Err(Error::EmptyTimeRange { t_start, t_end });
        }
        if t_start < 0.0 {
            return Err(Error::OutOfRange { t_start, t_end });
        }

        let channel_filter: Option<Vec<i32>> = match channels {
            Some([]) => {
                return Err(Error::ChannelNotFound(
                    "empty channel selection".to_string(),
                ));
            }
            Some(list) => {
                for &chan in list {
                    let known = match category {
                        ChannelType::Spike => rec.channels.spike_channel(chan).is_ok(),
                        _ => rec.channels.event_channel(chan).is_ok(),
                    };
                    if !known {
                        return Err(Error::ChannelNotFound(format!(
                            "no {category} channel {chan}"
                        )));
                    }
                }
                Some(list.to_vec())
            }
            None => None,
        };
        let unit_filter: Option<Vec<i32>> = match units {
            Some([]) => {
                return Err(Error::ChannelNotFound("empty unit selection".to_string()));
            }
            Some(list) => Some(list.to_vec()),
            None => None,
        };

        let ad_freq = rec.header.ad_frequency.max(1) as f64;
        let t0 = (t_start * ad_freq).round() as u64;
        let t1 = (t_end * ad_freq).round() as u64;

        let set = rec.index.frames(category);
        let (cov_lo, cov_hi) = set
            .coverage()
            .ok_or(Error::OutOfRange { t_start, t_end })?;
        if t1 <= cov_lo || t0 >= cov_hi {
            return Err(Error::OutOfRange { t_start, t_end });
        }

        let mut matches = Vec::new();
        for frame in set.find_overlapping(t0, t1) {
            let stride = frame.block_stride();
            for i in 0..frame.nblocks as u64 {
                let off = frame.begin + i * stride;
                let head = reader.read_range(off, DataBlockHeader::SIZE as u64)?;
                let block = DataBlockHeader::from_bytes(&head)?;
                let ts = block.ts();
                if ts < t0 || ts >= t1 {
                    continue;
                }
                if let Some(chans) = &channel_filter {
                    if !chans.contains(&(block.channel as i32)) {
                        continue;
                    }
                }
                if let Some(units) = &unit_filter {
                    if !units.contains(&(block.unit as i32)) {
                        continue;
                    }
                }
                matches.push(SpikeRef {
                    offset: off,
                    ts,
                    channel: block.channel,
                    unit: block.unit,
                    words: block.payload_words() as u32,
                });
            }
        }
        matches.sort_by_key(|m| (m.ts, m.channel, m.unit));

        Ok(SpikeInfo {
            rec,
            category,
            t_start,
            t_end,
            matches,
            include_waveforms: false,
        })
    }

    /// Exact number of records `read` will return.
    pub fn num_records(&self) -> usize {
        self.matches.len()
    }

    /// Requested window start in seconds.
    pub fn t_start(&self) -> f64 {
        self.t_start
    }

    /// Requested window end in seconds.
    pub fn t_end(&self) -> f64 {
        self.t_end
    }

    /// Request waveform payloads in the output of `read`.
    pub fn set_include_waveforms(&mut self, include: bool) {
        self.include_waveforms = include;
    }

    /// Read the matching records using a fresh file handle.
    pub fn read(&self) -> Result<Vec<Spike>> {
        let mut reader = BufferedRangeReader::new(&self.rec.path)?;
        self.read_with(&mut reader)
    }

    /// Read the matching records through a caller-supplied reader.
    ///
    /// Records are ordered by (timestamp, channel, unit).
    pub fn read_with<R: ByteRangeReader<Error = Error>>(
        &self,
        reader: &mut R,
    ) -> Result<Vec<Spike>> {
        let ad_freq = self.rec.header.ad_frequency.max(1) as f64;
        let mut scales: HashMap<i16, f64> = HashMap::new();

        let mut out = Vec::with_capacity(self.matches.len());
        for m in &self.matches {
            let waveform = if self.include_waveforms && m.words > 0 {
                let payload = reader.read_range(
                    m.offset + DataBlockHeader::SIZE as u64,
                    m.words as u64 * 2,
                )?;
                let scale = if self.category == ChannelType::Spike {
                    *scales.entry(m.channel).or_insert_with(|| {
                        let gain = self
                            .rec
                            .channels
                            .spike_channel(m.channel as i32)
                            .map(|c| c.gain)
                            .unwrap_or(1);
                        self.rec.header.spike_scale(gain)
                    })
                } else {
                    1.0
                };
                Some(
                    payload
                        .chunks_exact(2)
                        .map(|b| i16::from_le_bytes([b[0], b[1]]) as f64 * scale)
                        .collect(),
                )
            } else {
                None
            };

            out.push(Spike {
                ticks: m.ts,
                timestamp: m.ts as f64 / ad_freq,
                channel: m.channel as i32,
                unit: m.unit as i32,
                waveform,
            });
        }
        Ok(out)
    }
}
