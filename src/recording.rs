// src/recording.rs
//! The open recording: descriptor tables plus the frame index.

use crate::{
    Error, Result,
    blocks::{
        EventChannelHeader, FileHeader, RecordParse, SlowChannelHeader, SpikeChannelHeader,
    },
    channels::ChannelTable,
    check,
    index::PlxIndex,
    query::{ContInfo, SpikeInfo},
    reader::{BufferedRangeReader, ByteRangeReader},
    scan,
    types::ChannelType,
};

/// Per-category totals reported by [`Recording::summary`].
///
/// `indexed` is recomputed from the actual block stream by the scan
/// (occurrences for discrete categories, sample words for continuous ones);
/// `declared` comes from the header's advisory count tables. A mismatch is
/// worth a consistency check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CategorySummary {
    pub category: ChannelType,
    /// Frames built for this category
    pub frames: usize,
    /// Occurrences (discrete) or sample words (continuous) found by the scan
    pub indexed: u64,
    /// Count promised by the header tables
    pub declared: u64,
}

/// An open, indexed PLX recording.
///
/// Opening parses the header and channel descriptors, then scans the data
/// region once to build one frame set per channel-type category. After that
/// the index is immutable: queries borrow the recording, never re-scan, and
/// each convenience read opens its own file handle so there is no shared
/// cursor to race on. Dropping the recording releases everything; query
/// descriptors cannot outlive it.
#[derive(Debug)]
pub struct Recording {
    pub(crate) path: String,
    pub(crate) header: FileHeader,
    pub(crate) channels: ChannelTable,
    pub(crate) index: PlxIndex,
}

impl Recording {
    /// Open and index a recording.
    ///
    /// Cost is one sequential pass over the file. Fails with
    /// `MalformedHeader` or `TruncatedFile` without producing a partial
    /// recording.
    pub fn open(path: &str) -> Result<Recording> {
        let file_size = std::fs::metadata(path).map_err(Error::IoError)?.len();
        let mut reader = BufferedRangeReader::new(path)?;

        let (header, channels, data_start) = Self::parse_front(&mut reader, file_size)?;
        let index = scan::build_index(&mut reader, &header, &channels, data_start, file_size)?;

        Ok(Recording {
            path: path.to_string(),
            header,
            channels,
            index,
        })
    }

    /// Open a recording reusing a previously built index, skipping the scan.
    ///
    /// The index must have been built from this exact file; a size mismatch
    /// fails with `StaleIndex`.
    pub fn open_with_index(path: &str, index: PlxIndex) -> Result<Recording> {
        let file_size = std::fs::metadata(path).map_err(Error::IoError)?.len();
        if index.file_size != file_size {
            return Err(Error::StaleIndex {
                expected: index.file_size,
                actual: file_size,
            });
        }
        let mut reader = BufferedRangeReader::new(path)?;
        let (header, channels, _) = Self::parse_front(&mut reader, file_size)?;

        Ok(Recording {
            path: path.to_string(),
            header,
            channels,
            index,
        })
    }

    /// Parse the file header and the descriptor region that follows it.
    fn parse_front<R: ByteRangeReader<Error = Error>>(
        reader: &mut R,
        file_size: u64,
    ) -> Result<(FileHeader, ChannelTable, u64)> {
        if file_size < FileHeader::SIZE as u64 {
            return Err(Error::TruncatedFile {
                offset: 0,
                needed: FileHeader::SIZE as u64,
                available: file_size,
            });
        }
        let head = reader.read_range(0, FileHeader::SIZE as u64)?;
        let header = FileHeader::from_bytes(&head)?;

        let channels =
            ChannelTable::from_reader(reader, &header, FileHeader::SIZE as u64, file_size)?;
        let data_start = FileHeader::SIZE as u64 + channels.region_len();
        Ok((header, channels, data_start))
    }

    /// The parsed file header.
    pub fn header(&self) -> &FileHeader {
        &self.header
    }

    /// The frame index built at open time.
    pub fn index(&self) -> &PlxIndex {
        &self.index
    }

    /// Path the recording was opened from.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Spike channel descriptor by 1-based channel number.
    pub fn spike_channel(&self, channel: i32) -> Result<&SpikeChannelHeader> {
        self.channels.spike_channel(channel)
    }

    /// Event channel descriptor by 1-based channel number.
    pub fn event_channel(&self, channel: i32) -> Result<&EventChannelHeader> {
        self.channels.event_channel(channel)
    }

    /// Slow channel descriptor by 0-based channel number.
    pub fn slow_channel(&self, channel: i32) -> Result<&SlowChannelHeader> {
        self.channels.slow_channel(channel)
    }

    /// All spike channel descriptors, in file order.
    pub fn spike_channels(&self) -> &[SpikeChannelHeader] {
        &self.channels.spike
    }

    /// All event channel descriptors, in file order.
    pub fn event_channels(&self) -> &[EventChannelHeader] {
        &self.channels.event
    }

    /// All slow channel descriptors, in file order.
    pub fn slow_channels(&self) -> &[SlowChannelHeader] {
        &self.channels.slow
    }

    /// Enabled slow channels of one continuous category, ascending.
    pub fn continuous_channels(&self, category: ChannelType) -> Vec<&SlowChannelHeader> {
        self.channels.continuous_channels(category)
    }

    /// Per-category indexed vs. declared totals.
    pub fn summary(&self) -> Vec<CategorySummary> {
        ChannelType::ALL
            .iter()
            .map(|&category| {
                let set = self.index.frames(category);
                let (indexed, declared) = match category {
                    ChannelType::Spike => (set.blocks, self.header.declared_spike_count()),
                    ChannelType::Event => (set.blocks, self.header.declared_event_count()),
                    _ => {
                        let declared = self
                            .channels
                            .slow
                            .iter()
                            .filter(|c| ChannelTable::classify_slow(c) == category)
                            .filter_map(|c| self.header.declared_slow_samples(c.channel))
                            .sum();
                        (set.samples, declared)
                    }
                };
                CategorySummary {
                    category,
                    frames: set.len(),
                    indexed,
                    declared,
                }
            })
            .collect()
    }

    /// Resolve a continuous query over `[t_start, t_end)` seconds.
    ///
    /// `channels` selects 0-based slow channels of the category; `None`
    /// selects every enabled one. An explicitly empty selection fails with
    /// `ChannelNotFound` rather than resolving to a zero-width grid.
    pub fn resolve_continuous(
        &self,
        category: ChannelType,
        t_start: f64,
        t_end: f64,
        channels: Option<&[i32]>,
    ) -> Result<ContInfo<'_>> {
        ContInfo::resolve(self, category, t_start, t_end, channels)
    }

    /// Resolve a discrete query over `[t_start, t_end)` seconds.
    ///
    /// `category` must be [`ChannelType::Spike`] or [`ChannelType::Event`].
    /// `channels` and `units` filter the output; `None` means no filter.
    /// The resolution pass reads block headers, so it opens its own buffered
    /// reader; use [`Recording::resolve_discrete_with`] to supply one.
    pub fn resolve_discrete(
        &self,
        category: ChannelType,
        t_start: f64,
        t_end: f64,
        channels: Option<&[i32]>,
        units: Option<&[i32]>,
    ) -> Result<SpikeInfo<'_>> {
        let mut reader = BufferedRangeReader::new(&self.path)?;
        SpikeInfo::resolve(self, &mut reader, category, t_start, t_end, channels, units)
    }

    /// Resolve a discrete query through a caller-supplied reader.
    pub fn resolve_discrete_with<R: ByteRangeReader<Error = Error>>(
        &self,
        reader: &mut R,
        category: ChannelType,
        t_start: f64,
        t_end: f64,
        channels: Option<&[i32]>,
        units: Option<&[i32]>,
    ) -> Result<SpikeInfo<'_>> {
        SpikeInfo::resolve(self, reader, category, t_start, t_end, channels, units)
    }

    /// Count frame cadence anomalies for one continuous category.
    ///
    /// Zero on a recording with a perfectly regular block cadence; each
    /// dropped or duplicated region adds at least one. Violations are logged
    /// as they are found and never abort the check.
    pub fn check_consistency(&self, category: ChannelType) -> Result<usize> {
        if !category.is_continuous() {
            return Err(Error::WrongChannelType {
                requested: category,
                expected: "continuous",
            });
        }
        Ok(check::check_frames(category, self.index.frames(category)))
    }
}
