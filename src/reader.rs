//! Byte-range access to the underlying recording file.
//!
//! All file I/O in this crate goes through the [`ByteRangeReader`] trait:
//! the indexing scan walks block headers through it and the query engines
//! issue their targeted frame reads through it. Every read names an explicit
//! `(offset, length)` pair, so there is no shared cursor state; concurrent
//! queries can each bring their own reader over an independently opened
//! handle.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};

use crate::{Error, Result};

/// Trait for reading byte ranges from a seekable source.
///
/// Implementations over non-file sources (an mmap, a remote object store)
/// only need this one method; everything above the reader is agnostic to
/// where the bytes come from.
pub trait ByteRangeReader {
    type Error;

    /// Read exactly `length` bytes starting at `offset`.
    fn read_range(
        &mut self,
        offset: u64,
        length: u64,
    ) -> core::result::Result<Vec<u8>, Self::Error>;
}

/// Plain positioned-read implementation over a local file.
pub struct FileRangeReader {
    file: File,
}

impl FileRangeReader {
    pub fn new(file_path: &str) -> Result<Self> {
        let file = File::open(file_path).map_err(Error::IoError)?;
        Ok(Self { file })
    }
}

impl ByteRangeReader for FileRangeReader {
    type Error = Error;

    fn read_range(
        &mut self,
        offset: u64,
        length: u64,
    ) -> core::result::Result<Vec<u8>, Self::Error> {
        let fail = |source| Error::ReadFailed {
            offset,
            length,
            source,
        };
        self.file.seek(SeekFrom::Start(offset)).map_err(fail)?;

        let mut buffer = vec![0u8; length as usize];
        self.file.read_exact(&mut buffer).map_err(fail)?;

        Ok(buffer)
    }
}

/// Buffered reader with read-ahead, for dense small-range access patterns.
///
/// The indexing scan reads one 16-byte block header per data block and skips
/// the payload; the discrete query engine does the same over overlapping
/// frames. Both would otherwise issue millions of tiny reads. This reader
/// turns them into sequential buffer fills and serves in-buffer ranges
/// without touching the file.
pub struct BufferedRangeReader {
    file: File,
    buffer: Vec<u8>,
    buffer_start: u64,
    buffer_end: u64,
    capacity: usize,
}

/// Default fill size. Large enough to cover many continuous-chunk strides
/// per fill, small enough to stay resident while several readers coexist.
const DEFAULT_BUFFER_CAPACITY: usize = 256 * 1024;

impl BufferedRangeReader {
    /// Open `file_path` with the default buffer size (256 KiB).
    pub fn new(file_path: &str) -> Result<Self> {
        Self::with_capacity(file_path, DEFAULT_BUFFER_CAPACITY)
    }

    /// Open `file_path` with a custom buffer size.
    pub fn with_capacity(file_path: &str, capacity: usize) -> Result<Self> {
        let file = File::open(file_path).map_err(Error::IoError)?;
        Ok(Self {
            file,
            buffer: Vec::with_capacity(capacity),
            buffer_start: 0,
            buffer_end: 0,
            capacity,
        })
    }

    /// Refill the buffer starting at `offset`; short fills near end-of-file
    /// are kept as-is and bounds-checked by the caller.
    fn fill_buffer(&mut self, offset: u64) -> std::io::Result<()> {
        self.file.seek(SeekFrom::Start(offset))?;

        self.buffer.clear();
        self.buffer.resize(self.capacity, 0);

        let mut filled = 0;
        // read() may return short counts well before EOF
        while filled < self.capacity {
            let n = self.file.read(&mut self.buffer[filled..])?;
            if n == 0 {
                break;
            }
            filled += n;
        }
        self.buffer.truncate(filled);
        self.buffer_start = offset;
        self.buffer_end = offset + filled as u64;

        Ok(())
    }
}

impl ByteRangeReader for BufferedRangeReader {
    type Error = Error;

    fn read_range(
        &mut self,
        offset: u64,
        length: u64,
    ) -> core::result::Result<Vec<u8>, Self::Error> {
        let end = offset.saturating_add(length);
        let fail = |source| Error::ReadFailed {
            offset,
            length,
            source,
        };

        if offset >= self.buffer_start && end <= self.buffer_end {
            let lo = (offset - self.buffer_start) as usize;
            let hi = lo + length as usize;
            return Ok(self.buffer[lo..hi].to_vec());
        }

        // Oversized requests bypass the buffer entirely
        if length as usize > self.capacity {
            self.file.seek(SeekFrom::Start(offset)).map_err(fail)?;
            let mut buffer = vec![0u8; length as usize];
            self.file.read_exact(&mut buffer).map_err(fail)?;
            return Ok(buffer);
        }

        self.fill_buffer(offset).map_err(fail)?;

        if end <= self.buffer_end {
            let lo = (offset - self.buffer_start) as usize;
            let hi = lo + length as usize;
            Ok(self.buffer[lo..hi].to_vec())
        } else {
            // The file ended inside the requested range
            Err(Error::TruncatedFile {
                offset,
                needed: length,
                available: self.buffer_end.saturating_sub(offset),
            })
        }
    }
}
