// src/scan.rs
//! The one-pass scan that turns the raw block stream into a frame index.
//!
//! The scan is strictly sequential: it decodes one 16-byte block header,
//! classifies the block, folds it into the open frame or starts a new one,
//! and advances past the payload. Each byte of the data region is visited at
//! most once and nothing is buffered beyond the reader's fill window, so
//! open-time cost is linear in file size with bounded memory.

use std::collections::{HashMap, HashSet};

use tracing::{debug, warn};

use crate::{
    Error, Result,
    blocks::{
        BLOCK_TYPE_CONTINUOUS, BLOCK_TYPE_EVENT, BLOCK_TYPE_SPIKE, BLOCK_TYPE_STEREOTRODE,
        BLOCK_TYPE_TETRODE, DataBlockHeader, FileHeader, RecordParse,
    },
    channels::ChannelTable,
    index::{Frame, PlxIndex},
    reader::ByteRangeReader,
    types::ChannelType,
};

/// Mutable per-frame state while its blocks are still arriving.
///
/// Only one frame is ever open at a time: frames are contiguous runs in the
/// file, so the arrival of any block that cannot extend the open frame
/// finalizes it.
struct FrameBuilder {
    category: ChannelType,
    ts: u64,
    begin: u64,
    end: u64,
    samples: u32,
    nblocks: u32,
    last_channel: i16,
    /// Ticks per sample of the frame's channels; 0 when unknown or discrete
    tps: u64,
}

impl FrameBuilder {
    fn finish(self) -> (ChannelType, Frame) {
        let duration = if self.category.is_continuous() {
            self.samples as u64 * self.tps
        } else {
            0
        };
        (
            self.category,
            Frame {
                ts: self.ts,
                begin: self.begin,
                end: self.end,
                samples: self.samples,
                nblocks: self.nblocks,
                duration,
            },
        )
    }
}

/// Scan the data region and build the complete frame index.
///
/// Out-of-order timestamps are counted and logged but the offending block is
/// still indexed, so the consistency checker can surface the damage later.
/// Truncation (a header or payload extending past end-of-file) is fatal.
pub(crate) fn build_index<R: ByteRangeReader<Error = Error>>(
    reader: &mut R,
    header: &FileHeader,
    channels: &ChannelTable,
    data_start: u64,
    file_size: u64,
) -> Result<PlxIndex> {
    let mut index = PlxIndex::new(file_size, data_start);
    let mut current: Option<FrameBuilder> = None;
    let mut last_ts: HashMap<(usize, i16), u64> = HashMap::new();
    let mut seen_channels: HashSet<(usize, i16)> = HashSet::new();
    let ad_freq = header.ad_frequency.max(1) as u64;

    let mut pos = data_start;
    while pos < file_size {
        if pos + DataBlockHeader::SIZE as u64 > file_size {
            return Err(Error::TruncatedFile {
                offset: pos,
                needed: DataBlockHeader::SIZE as u64,
                available: file_size - pos,
            });
        }
        let head = reader.read_range(pos, DataBlockHeader::SIZE as u64)?;
        let block = DataBlockHeader::from_bytes(&head)?;
        let total = DataBlockHeader::SIZE as u64 + block.payload_len();
        if pos + total > file_size {
            return Err(Error::TruncatedFile {
                offset: pos,
                needed: total,
                available: file_size - pos,
            });
        }

        match classify(&block, channels) {
            None => {
                debug!(
                    offset = pos,
                    block_type = block.block_type,
                    "skipping block with unrecognized type tag"
                );
                index.unclassified += 1;
                // An alien block still breaks run contiguity
                if let Some(builder) = current.take() {
                    let (cat, frame) = builder.finish();
                    index.frames_mut(cat).push(frame);
                }
            }
            Some(category) => {
                let ts = block.ts();
                let words = block.payload_words() as u32;

                let key = (category.index(), block.channel);
                if let Some(&prev) = last_ts.get(&key) {
                    if ts < prev {
                        warn!(
                            offset = pos,
                            channel = block.channel,
                            category = %category,
                            ts,
                            prev,
                            "timestamp ran backwards for channel; block indexed anyway"
                        );
                        index.frames_mut(category).non_monotonic += 1;
                    }
                }
                last_ts.insert(key, ts);

                let extends = current.as_ref().is_some_and(|b| {
                    b.category == category
                        && b.ts == ts
                        && b.samples == words
                        && (category.is_discrete() || block.channel > b.last_channel)
                });

                if extends {
                    let builder = current.as_mut().unwrap();
                    builder.end = pos + total;
                    builder.nblocks += 1;
                    builder.last_channel = block.channel;
                } else {
                    if let Some(builder) = current.take() {
                        let (cat, frame) = builder.finish();
                        index.frames_mut(cat).push(frame);
                    }
                    current = Some(FrameBuilder {
                        category,
                        ts,
                        begin: pos,
                        end: pos + total,
                        samples: words,
                        nblocks: 1,
                        last_channel: block.channel,
                        tps: if category.is_continuous() {
                            ticks_per_sample(ad_freq, block.channel, channels)
                        } else {
                            0
                        },
                    });
                }

                let set = index.frames_mut(category);
                set.blocks += 1;
                set.samples += words as u64;

                // Channel roster in first-appearance order; within a frame
                // channels appear ascending, so this is also block order
                if category.is_continuous()
                    && seen_channels.insert((category.index(), block.channel))
                {
                    set.channels.push(block.channel as i32);
                }
            }
        }

        pos += total;
    }

    if let Some(builder) = current.take() {
        let (cat, frame) = builder.finish();
        index.frames_mut(cat).push(frame);
    }

    if index.unclassified > 0 {
        warn!(
            blocks = index.unclassified,
            "data region contained blocks with unrecognized type tags"
        );
    }

    Ok(index)
}

/// Category of a data block, or `None` for unrecognized type tags.
fn classify(block: &DataBlockHeader, channels: &ChannelTable) -> Option<ChannelType> {
    match block.block_type {
        BLOCK_TYPE_SPIKE | BLOCK_TYPE_STEREOTRODE | BLOCK_TYPE_TETRODE => Some(ChannelType::Spike),
        BLOCK_TYPE_EVENT => Some(ChannelType::Event),
        BLOCK_TYPE_CONTINUOUS => Some(
            channels
                .slow_channel(block.channel as i32)
                .map(ChannelTable::classify_slow)
                // A continuous block for an undeclared channel is still
                // indexed; generic analog is the only safe place for it
                .unwrap_or(ChannelType::Analog),
        ),
        _ => None,
    }
}

/// Timestamp ticks per sample for a 0-based slow channel; 0 when unknown.
fn ticks_per_sample(ad_freq: u64, channel: i16, channels: &ChannelTable) -> u64 {
    match channels.slow_channel(channel as i32) {
        Ok(slow) if slow.ad_freq > 0 => ad_freq / slow.ad_freq as u64,
        _ => 0,
    }
}
