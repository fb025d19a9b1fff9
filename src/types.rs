//! Channel-type categories shared across the index and query layers.

use core::fmt;

/// Classification of the data streams a recording can carry.
///
/// Spike and event blocks are discrete (timestamped occurrences); the four
/// remaining categories are continuous signal streams carved from the same
/// slow-channel descriptor table. Wideband, spike-filtered and
/// field-potential-filtered streams are distinguished from generic analog
/// input by the acquisition system's channel naming convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ChannelType {
    /// Sorted or unsorted spike waveform occurrences
    Spike,
    /// Digital event markers, including the strobed word channel
    Event,
    /// Unfiltered wideband continuous signal
    Wideband,
    /// Spike-band-filtered continuous signal
    SpikeContinuous,
    /// Local-field-potential-filtered continuous signal
    Lfp,
    /// Generic analog input
    Analog,
}

impl ChannelType {
    /// Number of categories; frame sets are stored one per category.
    pub const COUNT: usize = 6;

    /// All categories, in storage order.
    pub const ALL: [ChannelType; ChannelType::COUNT] = [
        ChannelType::Spike,
        ChannelType::Event,
        ChannelType::Wideband,
        ChannelType::SpikeContinuous,
        ChannelType::Lfp,
        ChannelType::Analog,
    ];

    /// Storage index of this category.
    pub fn index(self) -> usize {
        match self {
            ChannelType::Spike => 0,
            ChannelType::Event => 1,
            ChannelType::Wideband => 2,
            ChannelType::SpikeContinuous => 3,
            ChannelType::Lfp => 4,
            ChannelType::Analog => 5,
        }
    }

    /// Whether this category denotes a regularly sampled signal stream.
    pub fn is_continuous(self) -> bool {
        matches!(
            self,
            ChannelType::Wideband
                | ChannelType::SpikeContinuous
                | ChannelType::Lfp
                | ChannelType::Analog
        )
    }

    /// Whether this category denotes timestamped occurrences.
    pub fn is_discrete(self) -> bool {
        !self.is_continuous()
    }

    /// Short lowercase name of the category.
    pub fn name(self) -> &'static str {
        match self {
            ChannelType::Spike => "spikes",
            ChannelType::Event => "events",
            ChannelType::Wideband => "wideband",
            ChannelType::SpikeContinuous => "spkc",
            ChannelType::Lfp => "lfp",
            ChannelType::Analog => "analog",
        }
    }
}

impl fmt::Display for ChannelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
