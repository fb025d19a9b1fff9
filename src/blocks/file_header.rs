// src/blocks/file_header.rs
//! The fixed file header at the start of every PLX recording.
//!
//! The header occupies 7504 bytes: a 256-byte fixed region followed by the
//! advisory per-channel count tables (`ts_counts`, `wf_counts`, `ev_counts`).
//! The count tables are used for validation reporting only; indexing always
//! recomputes totals from the actual block stream.

use crate::{
    Error, Result,
    blocks::common::{RecordParse, read_cstr, read_f64, read_i32, read_u16, read_u32},
};

/// Expected magic value at offset 0 ("PLEX" in little-endian byte order).
pub const PLX_MAGIC: u32 = 0x5845_4C50;

/// Lowest file version this crate accepts.
pub const MIN_VERSION: i32 = 100;
/// Highest file version this crate accepts.
pub const MAX_VERSION: i32 = 107;

/// Highest 1-based spike channel number covered by the header count tables.
pub const HDR_LAST_SPIKE_CHAN: usize = 128;
/// Highest unit number covered by the header count tables.
pub const HDR_LAST_UNIT: usize = 4;
/// Highest 1-based event channel number covered by `ev_counts`.
pub const HDR_LAST_EVENT_CHAN: usize = 299;
/// Index in `ev_counts` holding the sample count for slow channel 0.
pub const HDR_FIRST_CONT_IDX: usize = 300;
/// Highest 0-based slow channel number with a sample count in `ev_counts`.
pub const HDR_LAST_CONT_CHAN: usize = 211;

/// Fixed-size record at the start of a recording.
///
/// `version` gates which trailing fields of the 256-byte region carry data;
/// fields below the version floor are left at their on-disk bytes and the
/// calibration accessors substitute the historical defaults.
#[derive(Debug, Clone)]
pub struct FileHeader {
    /// Magic value, `0x58454C50`
    pub magic: u32,
    /// Data format version, 100..=107
    pub version: i32,
    /// User-supplied comment
    pub comment: String,
    /// Timestamp clock frequency in Hz
    pub ad_frequency: i32,
    /// Number of spike channel descriptors that follow the header
    pub num_dsp_channels: i32,
    /// Number of event channel descriptors
    pub num_event_channels: i32,
    /// Number of continuous ("slow") channel descriptors
    pub num_slow_channels: i32,
    /// Samples per spike waveform
    pub num_points_wave: i32,
    /// Samples before threshold crossing in each waveform
    pub num_points_pre_thr: i32,
    /// Acquisition start date/time
    pub year: i32,
    pub month: i32,
    pub day: i32,
    pub hour: i32,
    pub minute: i32,
    pub second: i32,
    /// Spike waveform digitization rate in Hz (`ad_frequency` is the
    /// timestamp clock)
    pub waveform_freq: i32,
    /// Duration of the session in timestamp ticks
    pub last_timestamp: f64,
    /// Electrode grouping, 1 single / 2 stereotrode / 4 tetrode (v >= 103)
    pub trodalness: u8,
    /// Trodalness of the stored representation (v >= 103)
    pub data_trodalness: u8,
    /// ADC resolution for spike waveforms in bits (v >= 103)
    pub bits_per_spike_sample: u8,
    /// ADC resolution for slow-channel data in bits (v >= 103)
    pub bits_per_slow_sample: u8,
    /// Zero-to-peak voltage in mV for spike ADC values (v >= 103)
    pub spike_max_magnitude_mv: u16,
    /// Zero-to-peak voltage in mV for slow-channel ADC values (v >= 103)
    pub slow_max_magnitude_mv: u16,
    /// Spike preamplifier gain (v >= 105)
    pub spike_preamp_gain: u16,
    /// Software that acquired the file (v >= 106)
    pub acquiring_software: String,
    /// Software that last processed the file (v >= 106)
    pub processing_software: String,
    /// Declared timestamp counts per (1-based channel, unit); advisory
    pub ts_counts: Vec<[i32; 5]>,
    /// Declared waveform counts per (1-based channel, unit); advisory
    pub wf_counts: Vec<[i32; 5]>,
    /// Declared event counts per 1-based event channel, and from index 300
    /// the declared sample counts for slow channels 0..=211; advisory
    pub ev_counts: Vec<i32>,
}

impl RecordParse for FileHeader {
    const SIZE: usize = 7504;

    fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < Self::SIZE {
            return Err(Error::TooShortBuffer {
                actual: bytes.len(),
                expected: Self::SIZE,
                file: file!(),
                line: line!(),
            });
        }

        let magic = read_u32(bytes, 0);
        let version = read_i32(bytes, 4);
        if magic != PLX_MAGIC || !(MIN_VERSION..=MAX_VERSION).contains(&version) {
            return Err(Error::MalformedHeader { magic, version });
        }

        let mut ts_counts = Vec::with_capacity(130);
        let mut wf_counts = Vec::with_capacity(130);
        for row in 0..130 {
            let mut ts = [0i32; 5];
            let mut wf = [0i32; 5];
            for unit in 0..5 {
                ts[unit] = read_i32(bytes, 256 + (row * 5 + unit) * 4);
                wf[unit] = read_i32(bytes, 2856 + (row * 5 + unit) * 4);
            }
            ts_counts.push(ts);
            wf_counts.push(wf);
        }
        let ev_counts = (0..512).map(|i| read_i32(bytes, 5456 + i * 4)).collect();

        Ok(Self {
            magic,
            version,
            comment: read_cstr(bytes, 8, 128),
            ad_frequency: read_i32(bytes, 136),
            num_dsp_channels: read_i32(bytes, 140),
            num_event_channels: read_i32(bytes, 144),
            num_slow_channels: read_i32(bytes, 148),
            num_points_wave: read_i32(bytes, 152),
            num_points_pre_thr: read_i32(bytes, 156),
            year: read_i32(bytes, 160),
            month: read_i32(bytes, 164),
            day: read_i32(bytes, 168),
            hour: read_i32(bytes, 172),
            minute: read_i32(bytes, 176),
            second: read_i32(bytes, 180),
            waveform_freq: read_i32(bytes, 188),
            last_timestamp: read_f64(bytes, 192),
            trodalness: bytes[200],
            data_trodalness: bytes[201],
            bits_per_spike_sample: bytes[202],
            bits_per_slow_sample: bytes[203],
            spike_max_magnitude_mv: read_u16(bytes, 204),
            slow_max_magnitude_mv: read_u16(bytes, 206),
            spike_preamp_gain: read_u16(bytes, 208),
            acquiring_software: read_cstr(bytes, 210, 18),
            processing_software: read_cstr(bytes, 228, 18),
            ts_counts,
            wf_counts,
            ev_counts,
        })
    }
}

impl FileHeader {
    /// Scale factor mapping a raw slow-channel ADC count to millivolts.
    ///
    /// `physical = raw * max_magnitude_mV / (2^(bits-1) * gain * preamp_gain)`
    /// with the magnitude, resolution and preamp fields version-gated:
    /// files below v103 are fixed at 12 bits / 5000 mV, files below v102
    /// carry no per-channel preamp gain and use the historical 1000.
    pub fn slow_scale(&self, gain: i32, preamp_gain: i32) -> f64 {
        let gain = gain.max(1) as f64;
        let (max_mv, bits, preamp) = if self.version >= 103 {
            (
                self.slow_max_magnitude_mv as f64,
                self.bits_per_slow_sample as i32,
                preamp_gain.max(1) as f64,
            )
        } else if self.version == 102 {
            (5000.0, 12, preamp_gain.max(1) as f64)
        } else {
            (5000.0, 12, 1000.0)
        };
        max_mv / (half_scale(bits) * gain * preamp)
    }

    /// Scale factor mapping a raw spike waveform ADC count to millivolts.
    ///
    /// The preamp gain became a header field in v105; earlier files use the
    /// historical 1000, and files below v103 are fixed at 12 bits / 3000 mV.
    pub fn spike_scale(&self, gain: i32) -> f64 {
        let gain = gain.max(1) as f64;
        let (max_mv, bits, preamp) = if self.version >= 105 {
            (
                self.spike_max_magnitude_mv as f64,
                self.bits_per_spike_sample as i32,
                self.spike_preamp_gain.max(1) as f64,
            )
        } else if self.version >= 103 {
            (
                self.spike_max_magnitude_mv as f64,
                self.bits_per_spike_sample as i32,
                1000.0,
            )
        } else {
            (3000.0, 12, 1000.0)
        };
        max_mv / (half_scale(bits) * gain * preamp)
    }

    /// Total declared spike timestamp count across all counted channels and
    /// units.
    pub fn declared_spike_count(&self) -> u64 {
        self.ts_counts
            .iter()
            .flat_map(|row| row.iter())
            .map(|&n| n.max(0) as u64)
            .sum()
    }

    /// Total declared event count across all counted event channels.
    pub fn declared_event_count(&self) -> u64 {
        self.ev_counts[1..=HDR_LAST_EVENT_CHAN]
            .iter()
            .map(|&n| n.max(0) as u64)
            .sum()
    }

    /// Declared sample count for a 0-based slow channel, if the header
    /// carries one (channels above 211 are not counted).
    pub fn declared_slow_samples(&self, channel: i32) -> Option<u64> {
        if !(0..=HDR_LAST_CONT_CHAN as i32).contains(&channel) {
            return None;
        }
        Some(self.ev_counts[HDR_FIRST_CONT_IDX + channel as usize].max(0) as u64)
    }
}

/// `2^(bits-1)`, the positive half of the ADC's signed range.
fn half_scale(bits: i32) -> f64 {
    (1i64 << (bits.clamp(1, 31) - 1)) as f64
}
