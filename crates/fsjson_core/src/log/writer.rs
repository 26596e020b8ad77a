//! Log writer.
//!
//! Produces streams in the layout [`RecordReader`](crate::RecordReader)
//! consumes. Used to build fixtures and by the benchmarks; the export path
//! itself never writes logs.

use crate::error::{CoreError, CoreResult};
use crate::log::crc::{fragment_checksum, mask};
use crate::log::format::{FragmentHeader, FragmentType, BLOCK_SIZE, HEADER_SIZE};
use std::io::Write;

/// Writes logical records as block-aligned fragments.
///
/// Records that do not fit in the current block are split into
/// FIRST/MIDDLE/LAST fragments. A block tail too small for a header is
/// filled with zeros.
pub struct LogWriter<W: Write> {
    inner: W,
    block_offset: usize,
    bytes_written: u64,
}

impl<W: Write> LogWriter<W> {
    /// Creates a writer positioned at the start of a block.
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            block_offset: 0,
            bytes_written: 0,
        }
    }

    /// Creates a writer that appends to a stream already `offset` bytes long.
    pub fn with_block_offset(inner: W, offset: u64) -> Self {
        Self {
            inner,
            block_offset: (offset % BLOCK_SIZE as u64) as usize,
            bytes_written: 0,
        }
    }

    /// Appends one logical record.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying writer fails.
    pub fn add_record(&mut self, data: &[u8]) -> CoreResult<()> {
        let mut left = data;
        let mut begin = true;

        loop {
            let leftover = BLOCK_SIZE - self.block_offset;
            if leftover < HEADER_SIZE {
                if leftover > 0 {
                    self.write_raw(&[0u8; HEADER_SIZE][..leftover])?;
                }
                self.block_offset = 0;
            }

            let available = BLOCK_SIZE - self.block_offset - HEADER_SIZE;
            let len = left.len().min(available);
            let end = len == left.len();

            let fragment_type = match (begin, end) {
                (true, true) => FragmentType::Full,
                (true, false) => FragmentType::First,
                (false, false) => FragmentType::Middle,
                (false, true) => FragmentType::Last,
            };

            self.emit(fragment_type.as_byte(), &left[..len])?;
            left = &left[len..];
            begin = false;

            if end {
                return Ok(());
            }
        }
    }

    /// Writes a single fragment of the given type at the current position.
    ///
    /// No splitting or padding is performed.
    ///
    /// # Errors
    ///
    /// Returns `InvalidOperation` if the fragment would cross the block
    /// boundary, or an I/O error from the underlying writer.
    pub fn write_fragment(&mut self, fragment_type: FragmentType, payload: &[u8]) -> CoreResult<()> {
        let leftover = BLOCK_SIZE - self.block_offset;
        if HEADER_SIZE + payload.len() > leftover {
            return Err(CoreError::invalid_operation(format!(
                "{} fragment of {} bytes does not fit in {} remaining block bytes",
                fragment_type.name(),
                payload.len(),
                leftover
            )));
        }
        self.emit(fragment_type.as_byte(), payload)
    }

    /// Fills the rest of the current block with zeros.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying writer fails.
    pub fn pad_block(&mut self) -> CoreResult<()> {
        if self.block_offset == 0 {
            return Ok(());
        }
        let zeros = vec![0u8; BLOCK_SIZE - self.block_offset];
        self.write_raw(&zeros)?;
        self.block_offset = 0;
        Ok(())
    }

    /// Flushes the underlying writer.
    ///
    /// # Errors
    ///
    /// Returns an error if the flush fails.
    pub fn flush(&mut self) -> CoreResult<()> {
        self.inner.flush()?;
        Ok(())
    }

    /// Offset within the current block.
    #[must_use]
    pub fn block_offset(&self) -> usize {
        self.block_offset
    }

    /// Total bytes written by this writer.
    #[must_use]
    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    /// Consumes the writer and returns the underlying writer.
    pub fn into_inner(self) -> W {
        self.inner
    }

    fn emit(&mut self, type_byte: u8, payload: &[u8]) -> CoreResult<()> {
        debug_assert!(payload.len() <= u16::MAX as usize);
        let header = FragmentHeader {
            masked_crc: mask(fragment_checksum(type_byte, payload)),
            length: payload.len() as u16,
            type_byte,
        };
        self.write_raw(&header.encode())?;
        self.write_raw(payload)?;
        self.block_offset += HEADER_SIZE + payload.len();
        Ok(())
    }

    fn write_raw(&mut self, bytes: &[u8]) -> CoreResult<()> {
        self.inner.write_all(bytes)?;
        self.bytes_written += bytes.len() as u64;
        Ok(())
    }
}
