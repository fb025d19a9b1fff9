// src/query/continuous.rs
//! Time-window retrieval of calibrated continuous signal data.
//!
//! A query resolves to a [`ContInfo`]: the validated channel subset, the
//! output grid shape, and the per-channel calibration scales. Reading then
//! walks only the frames overlapping the window and issues byte-range reads
//! for the overlapping sample spans, never touching the rest of the file.
//!
//! The output grid is anchored to the recording clock: row `i` of a window
//! starting at sample `s0` holds the channel values at absolute sample index
//! `s0 + i` of the base rate. Two adjacent sub-window reads therefore
//! concatenate into exactly the result of one large read.

use crate::{
    Error, Result,
    blocks::{BLOCK_TYPE_CONTINUOUS, DataBlockHeader, RecordParse},
    channels::ChannelTable,
    index::Frame,
    reader::{ByteRangeReader, FileRangeReader},
    recording::Recording,
    types::ChannelType,
};

/// Fill policy for grid positions not covered by any frame.
///
/// Acquisition pauses leave holes inside a query window; the engine never
/// leaves those positions undefined. Zero matches what the original
/// acquisition tooling produced; NaN lets analysis code tell a gap from a
/// genuinely zero signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GapFill {
    /// Fill gaps with `0.0`
    #[default]
    Zero,
    /// Fill gaps with `f64::NAN`
    Nan,
}

impl GapFill {
    /// The sentinel written into uncovered grid positions.
    pub fn value(self) -> f64 {
        match self {
            GapFill::Zero => 0.0,
            GapFill::Nan => f64::NAN,
        }
    }
}

/// One resolved channel of a continuous query.
#[derive(Debug, Clone)]
struct ContChannel {
    channel: i32,
    /// Position of this channel's block within each frame, if the channel
    /// ever produced data
    rank: Option<usize>,
    /// Integer decimation factor onto the query's base rate
    decim: u64,
    /// Raw ADC count to millivolts
    scale: f64,
}

/// Resolved continuous query: window, channel subset, and output shape.
///
/// Ephemeral; borrow of the recording ends with it. Created by
/// [`Recording::resolve_continuous`], consumed by [`ContInfo::read`].
#[derive(Debug)]
pub struct ContInfo<'r> {
    rec: &'r Recording,
    category: ChannelType,
    t_start: f64,
    t_end: f64,
    /// First output row as an absolute sample index at the base rate
    start_sample: u64,
    num_samples: usize,
    /// Timestamp ticks per base-rate sample
    tps_base: u64,
    channels: Vec<ContChannel>,
    fill: GapFill,
}

impl<'r> ContInfo<'r> {
    pub(crate) fn resolve(
        rec: &'r Recording,
        category: ChannelType,
        t_start: f64,
        t_end: f64,
        channels: Option<&[i32]>,
    ) -> Result<ContInfo<'r>> {
        if !category.is_continuous() {
            return Err(Error::WrongChannelType {
                requested: category,
                expected: "continuous",
            });
        }
        if !(t_start < t_end) {
            return Err(Error::EmptyTimeRange { t_start, t_end });
        }
        if t_start < 0.0 {
            return Err(Error::OutOfRange { t_start, t_end });
        }

        let selected: Vec<i32> = match channels {
            Some([]) => {
                return Err(Error::ChannelNotFound(
                    "empty channel selection".to_string(),
                ));
            }
            Some(list) => list.to_vec(),
            None => rec
                .channels
                .continuous_channels(category)
                .iter()
                .map(|c| c.channel)
                .collect(),
        };
        if selected.is_empty() {
            return Err(Error::ChannelNotFound(format!(
                "no enabled {category} channels in this recording"
            )));
        }

        let ad_freq = rec.header.ad_frequency.max(1);
        let mut rates = Vec::with_capacity(selected.len());
        for &chan in &selected {
            let slow = rec.channels.slow_channel(chan).map_err(|_| {
                Error::ChannelNotFound(format!("no continuous channel {chan}"))
            })?;
            if !slow.enabled {
                return Err(Error::ChannelNotFound(format!(
                    "continuous channel {chan} is disabled"
                )));
            }
            if ChannelTable::classify_slow(slow) != category {
                return Err(Error::ChannelNotFound(format!(
                    "channel {chan} is not a {category} channel"
                )));
            }
            if slow.ad_freq <= 0 || ad_freq % slow.ad_freq != 0 {
                return Err(Error::RateMismatch {
                    channel: chan,
                    channel_rate: slow.ad_freq,
                    base_rate: ad_freq,
                });
            }
            rates.push((chan, slow.ad_freq, slow.gain, slow.preamp_gain));
        }

        // Heterogeneous rates align by decimating onto the coarsest
        // requested channel's grid
        let base_rate = rates.iter().map(|&(_, f, _, _)| f).min().unwrap();
        let tps_base = (ad_freq / base_rate) as u64;

        let set = rec.index.frames(category);
        let resolved = rates
            .into_iter()
            .map(|(chan, freq, gain, preamp)| {
                let tps_chan = (ad_freq / freq) as u64;
                if tps_base % tps_chan != 0 {
                    return Err(Error::RateMismatch {
                        channel: chan,
                        channel_rate: freq,
                        base_rate,
                    });
                }
                Ok(ContChannel {
                    channel: chan,
                    rank: set.channels.iter().position(|&c| c == chan),
                    decim: tps_base / tps_chan,
                    scale: rec.header.slow_scale(gain, preamp),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let start_sample = (t_start * base_rate as f64).round() as u64;
        let end_sample = (t_end * base_rate as f64).round() as u64;
        let num_samples = end_sample.saturating_sub(start_sample) as usize;
        if num_samples == 0 {
            return Err(Error::EmptyTimeRange { t_start, t_end });
        }

        let (cov_lo, cov_hi) = set
            .coverage()
            .ok_or(Error::OutOfRange { t_start, t_end })?;
        let w0 = start_sample * tps_base;
        let w1 = end_sample * tps_base;
        if w1 <= cov_lo || w0 >= cov_hi {
            return Err(Error::OutOfRange { t_start, t_end });
        }

        Ok(ContInfo {
            rec,
            category,
            t_start,
            t_end,
            start_sample,
            num_samples,
            tps_base,
            channels: resolved,
            fill: GapFill::default(),
        })
    }

    /// Rows in the output grid.
    pub fn num_samples(&self) -> usize {
        self.num_samples
    }

    /// Columns in the output grid.
    pub fn num_channels(&self) -> usize {
        self.channels.len()
    }

    /// Output shape as `(num_samples, num_channels)`.
    pub fn shape(&self) -> (usize, usize) {
        (self.num_samples, self.channels.len())
    }

    /// Requested window start in seconds.
    pub fn t_start(&self) -> f64 {
        self.t_start
    }

    /// Requested window end in seconds.
    pub fn t_end(&self) -> f64 {
        self.t_end
    }

    /// Channel numbers in output column order.
    pub fn channel_numbers(&self) -> Vec<i32> {
        self.channels.iter().map(|c| c.channel).collect()
    }

    /// Set the fill policy for acquisition gaps inside the window.
    pub fn set_gap_fill(&mut self, fill: GapFill) {
        self.fill = fill;
    }

    /// Read the window into `out` using a fresh file handle.
    ///
    /// `out` is filled row-major, `num_samples` rows of `num_channels`
    /// calibrated millivolt values.
    pub fn read(&self, out: &mut [f64]) -> Result<()> {
        let mut reader = FileRangeReader::new(&self.rec.path)?;
        self.read_with(&mut reader, out)
    }

    /// Read the window into `out` through a caller-supplied reader.
    pub fn read_with<R: ByteRangeReader<Error = Error>>(
        &self,
        reader: &mut R,
        out: &mut [f64],
    ) -> Result<()> {
        let ncols = self.channels.len();
        let needed = self.num_samples * ncols;
        if out.len() < needed {
            return Err(Error::TooShortBuffer {
                actual: out.len(),
                expected: needed,
                file: file!(),
                line: line!(),
            });
        }
        out[..needed].fill(self.fill.value());

        let w0 = self.start_sample * self.tps_base;
        let w1 = (self.start_sample + self.num_samples as u64) * self.tps_base;
        let frames = self.rec.index.frames(self.category).find_overlapping(w0, w1);

        for (col, chan) in self.channels.iter().enumerate() {
            let Some(rank) = chan.rank else {
                // Enabled but never produced a block; the fill stands
                continue;
            };
            let tps_chan = self.tps_base / chan.decim;

            for frame in frames {
                if frame.samples == 0 {
                    continue;
                }
                let Some(block_off) = locate_block(reader, frame, rank, chan.channel)? else {
                    continue;
                };

                // Channel-rate sample indices covered by both the frame and
                // the requested grid
                let g_frame = frame.ts / tps_chan;
                let g_lo = g_frame.max(self.start_sample * chan.decim);
                let g_hi = (g_frame + frame.samples as u64)
                    .min((self.start_sample + self.num_samples as u64) * chan.decim);
                let g0 = g_lo.div_ceil(chan.decim) * chan.decim;
                if g0 >= g_hi {
                    continue;
                }
                let n = (g_hi - g0).div_ceil(chan.decim);
                let k0 = g0 - g_frame;
                let k_last = k0 + (n - 1) * chan.decim;

                let payload = reader.read_range(
                    block_off + DataBlockHeader::SIZE as u64 + k0 * 2,
                    (k_last - k0 + 1) * 2,
                )?;
                for i in 0..n {
                    let g = g0 + i * chan.decim;
                    let row = (g / chan.decim - self.start_sample) as usize;
                    let at = ((g - g0) * 2) as usize;
                    let raw = i16::from_le_bytes([payload[at], payload[at + 1]]);
                    out[row * ncols + col] = raw as f64 * chan.scale;
                }
            }
        }

        Ok(())
    }
}

/// File offset of `channel`'s block within `frame`, if present.
///
/// Frames hold one equally-sized block per channel in roster order, so the
/// expected position is a stride multiple; the header is read back to
/// confirm. A roster mismatch falls back to walking the frame's blocks.
fn locate_block<R: ByteRangeReader<Error = Error>>(
    reader: &mut R,
    frame: &Frame,
    rank: usize,
    channel: i32,
) -> Result<Option<u64>> {
    let stride = frame.block_stride();

    if (rank as u64) < frame.nblocks as u64 {
        let off = frame.begin + rank as u64 * stride;
        let head = reader.read_range(off, DataBlockHeader::SIZE as u64)?;
        let block = DataBlockHeader::from_bytes(&head)?;
        if block.block_type == BLOCK_TYPE_CONTINUOUS && block.channel as i32 == channel {
            return Ok(Some(off));
        }
    }

    for i in 0..frame.nblocks as u64 {
        let off = frame.begin + i * stride;
        let head = reader.read_range(off, DataBlockHeader::SIZE as u64)?;
        let block = DataBlockHeader::from_bytes(&head)?;
        if block.block_type == BLOCK_TYPE_CONTINUOUS && block.channel as i32 == channel {
            return Ok(Some(off));
        }
    }
    Ok(None)
}
