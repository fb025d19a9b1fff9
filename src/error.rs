//! Error types for PLX file operations.
//!
//! This module defines the [`Error`] enum which represents all possible
//! failures that can occur when opening, indexing, or querying a PLX
//! recording.
//!
//! Indexing failures (`MalformedHeader`, `TruncatedFile`) abort
//! [`crate::Recording::open`] entirely; there is no partially-opened
//! recording. Query-time failures are returned per call and leave the index
//! and any other in-flight queries untouched. Consistency anomalies and
//! out-of-order timestamps found during the scan are counted and logged,
//! never raised.

use core::fmt;

use crate::types::ChannelType;

/// Errors that can occur during PLX file operations.
#[derive(Debug)]
pub enum Error {
    /// The leading magic value or the format version is not recognized.
    ///
    /// Raised by `open` before any indexing work is done.
    MalformedHeader {
        /// Magic value found at offset 0 (expected `0x58454C50`, "PLEX")
        magic: u32,
        /// Version field found at offset 4
        version: i32,
    },

    /// A declared structure extends past the end of the file.
    ///
    /// Raised when the descriptor region or a data block (header or payload)
    /// would read beyond the actual byte length.
    TruncatedFile {
        /// File offset at which the read started
        offset: u64,
        /// Number of bytes the structure requires from that offset
        needed: u64,
        /// Number of bytes actually available
        available: u64,
    },

    /// Buffer provided for parsing or output was too small.
    TooShortBuffer {
        /// Actual number of elements available
        actual: usize,
        /// Minimum number of elements required
        expected: usize,
        /// Source file where the error was detected
        file: &'static str,
        /// Line number where the error was detected
        line: u32,
    },

    /// A direct descriptor lookup was made for a channel number that has no
    /// descriptor.
    UnknownChannel {
        /// Descriptor table that was consulted
        category: &'static str,
        /// Channel number requested
        channel: i32,
    },

    /// A query requested a channel that is absent, disabled, or not part of
    /// the queried category. Also raised for an empty channel selection.
    ChannelNotFound(String),

    /// The operation requires a different channel-type category, e.g. a
    /// continuous query against the spike category.
    WrongChannelType {
        /// Category that was passed in
        requested: ChannelType,
        /// What the operation needed ("continuous" or "discrete")
        expected: &'static str,
    },

    /// The resolved query window contains zero samples.
    EmptyTimeRange {
        /// Requested window start in seconds
        t_start: f64,
        /// Requested window end in seconds
        t_end: f64,
    },

    /// The query window lies entirely outside all indexed frames for the
    /// category.
    OutOfRange {
        /// Requested window start in seconds
        t_start: f64,
        /// Requested window end in seconds
        t_end: f64,
    },

    /// A channel's sampling rate cannot be aligned onto the query's sample
    /// grid by an integer decimation factor.
    RateMismatch {
        /// Offending channel number
        channel: i32,
        /// That channel's digitization rate in Hz
        channel_rate: i32,
        /// Rate it had to divide into (query base rate or timestamp clock)
        base_rate: i32,
    },

    /// A previously built index does not describe the file it was paired
    /// with.
    StaleIndex {
        /// File size recorded in the index
        expected: u64,
        /// Actual size of the file being opened
        actual: u64,
    },

    /// An I/O error occurred while reading the file.
    IoError(std::io::Error),

    /// A byte-range read failed, reported with the range so the caller can
    /// retry or return a partial result.
    ReadFailed {
        /// File offset the read started at
        offset: u64,
        /// Number of bytes requested
        length: u64,
        /// Underlying I/O failure
        source: std::io::Error,
    },

    /// The frame index could not be serialized to or from its sidecar form.
    #[cfg(feature = "serde")]
    IndexSerializationError(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::MalformedHeader { magic, version } => write!(
                f,
                "Not a PLX recording: magic {magic:#010x} (expected 0x58454c50), version {version}"
            ),
            Error::TruncatedFile {
                offset,
                needed,
                available,
            } => write!(
                f,
                "Truncated file: structure at offset {offset} needs {needed} bytes, {available} available"
            ),
            Error::TooShortBuffer {
                actual,
                expected,
                file,
                line,
            } => write!(
                f,
                "Buffer too small at {file}:{line}: need at least {expected} elements, got {actual}"
            ),
            Error::UnknownChannel { category, channel } => {
                write!(f, "No {category} channel descriptor for channel {channel}")
            }
            Error::ChannelNotFound(msg) => write!(f, "Channel not found: {msg}"),
            Error::WrongChannelType {
                requested,
                expected,
            } => write!(
                f,
                "Channel type {requested} is not valid here: operation requires a {expected} category"
            ),
            Error::EmptyTimeRange { t_start, t_end } => write!(
                f,
                "Time range [{t_start}, {t_end}) resolves to zero samples"
            ),
            Error::OutOfRange { t_start, t_end } => write!(
                f,
                "Time range [{t_start}, {t_end}) lies outside all indexed data"
            ),
            Error::RateMismatch {
                channel,
                channel_rate,
                base_rate,
            } => write!(
                f,
                "Channel {channel} rate {channel_rate} Hz does not divide evenly into {base_rate} Hz"
            ),
            Error::StaleIndex { expected, actual } => write!(
                f,
                "Stale index: built for a {expected}-byte file, but the file is {actual} bytes"
            ),
            Error::IoError(e) => write!(f, "I/O error: {e}"),
            Error::ReadFailed {
                offset,
                length,
                source,
            } => write!(f, "Read of {length} bytes at offset {offset} failed: {source}"),
            #[cfg(feature = "serde")]
            Error::IndexSerializationError(s) => write!(f, "Index serialization error: {s}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::IoError(e) => Some(e),
            Error::ReadFailed { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::IoError(err)
    }
}

/// A specialized Result type for PLX operations.
pub type Result<T> = core::result::Result<T, Error>;
