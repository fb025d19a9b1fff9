// src/blocks/spike_header.rs
//! Static metadata for one spike (DSP) channel.

use crate::{
    Error, Result,
    blocks::common::{RecordParse, read_cstr, read_i16, read_i32, read_u16},
};

/// Descriptor for one spike channel; 1020 bytes on disk.
///
/// Immutable after load. `channel` is 1-based. The sorting template and box
/// tables are carried through verbatim for completeness; the query engine
/// only consults `channel`, `gain` and `n_units`.
#[derive(Debug, Clone)]
pub struct SpikeChannelHeader {
    /// Name given to the DSP channel
    pub name: String,
    /// Name of the corresponding signal channel
    pub sig_name: String,
    /// DSP channel number, 1-based
    pub channel: i32,
    /// Waveform rate limit divided by 10, when the acquisition system limits
    pub wf_rate: i32,
    /// Associated signal channel, 1-based
    pub sig: i32,
    /// Signal channel used as reference, 1-based
    pub ref_chan: i32,
    /// Gain divided by the spike preamp gain (pre-v105: divided by 1000)
    pub gain: i32,
    /// Filter applied, 0 or 1
    pub filter: i32,
    /// Spike detection threshold in ADC counts
    pub threshold: i32,
    /// Unit sorting method, 1 boxes / 2 templates
    pub method: i32,
    /// Number of sorted units
    pub n_units: i32,
    /// Sorting templates in ADC counts
    pub template: Vec<[i16; 64]>,
    /// Template fit values
    pub fit: [i32; 5],
    /// Points used in template sorting
    pub sort_width: i32,
    /// Boxes used in box sorting
    pub boxes: Vec<[[i16; 4]; 2]>,
    /// Start of the sorting window
    pub sort_beg: i32,
    /// Comment (v >= 105)
    pub comment: String,
    /// Acquisition source id (v >= 106)
    pub src_id: u8,
    /// Channel id within the source (v >= 106)
    pub chan_id: u16,
}

impl RecordParse for SpikeChannelHeader {
    const SIZE: usize = 1020;

    fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < Self::SIZE {
            return Err(Error::TooShortBuffer {
                actual: bytes.len(),
                expected: Self::SIZE,
                file: file!(),
                line: line!(),
            });
        }

        let mut template = Vec::with_capacity(5);
        for t in 0..5 {
            let mut row = [0i16; 64];
            for (p, slot) in row.iter_mut().enumerate() {
                *slot = read_i16(bytes, 100 + (t * 64 + p) * 2);
            }
            template.push(row);
        }

        let mut fit = [0i32; 5];
        for (t, slot) in fit.iter_mut().enumerate() {
            *slot = read_i32(bytes, 740 + t * 4);
        }

        let mut boxes = Vec::with_capacity(5);
        for u in 0..5 {
            let mut pair = [[0i16; 4]; 2];
            for (w, row) in pair.iter_mut().enumerate() {
                for (p, slot) in row.iter_mut().enumerate() {
                    *slot = read_i16(bytes, 764 + ((u * 2 + w) * 4 + p) * 2);
                }
            }
            boxes.push(pair);
        }

        Ok(Self {
            name: read_cstr(bytes, 0, 32),
            sig_name: read_cstr(bytes, 32, 32),
            channel: read_i32(bytes, 64),
            wf_rate: read_i32(bytes, 68),
            sig: read_i32(bytes, 72),
            ref_chan: read_i32(bytes, 76),
            gain: read_i32(bytes, 80),
            filter: read_i32(bytes, 84),
            threshold: read_i32(bytes, 88),
            method: read_i32(bytes, 92),
            n_units: read_i32(bytes, 96),
            template,
            fit,
            sort_width: read_i32(bytes, 760),
            boxes,
            sort_beg: read_i32(bytes, 844),
            comment: read_cstr(bytes, 848, 128),
            src_id: bytes[976],
            chan_id: read_u16(bytes, 978),
        })
    }
}
