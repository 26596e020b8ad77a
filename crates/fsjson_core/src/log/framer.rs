//! Block framer.
//!
//! Pulls one physical fragment at a time from a [`ByteSource`], honouring
//! block boundaries and optionally verifying checksums. The framer knows
//! nothing about logical records; reassembly and recovery live in
//! [`RecordReader`](crate::RecordReader).

use crate::error::{CoreError, CoreResult};
use crate::log::crc::{fragment_checksum, unmask};
use crate::log::format::{block_remaining, Fragment, FragmentHeader, FragmentType, HEADER_SIZE};
use fsjson_storage::ByteSource;

/// Result of one framing step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// A fragment was read. Padding fragments have an empty payload.
    Fragment(Fragment),
    /// The block has fewer than [`HEADER_SIZE`] bytes left. Nothing was read.
    BlockTrailer,
    /// The source ran out mid-header or mid-payload.
    EndOfStream,
}

/// Extracts fragments from a byte source.
pub struct BlockFramer<S> {
    source: S,
    verify_checksums: bool,
}

impl<S: ByteSource> BlockFramer<S> {
    /// Creates a framer over `source`.
    pub fn new(source: S, verify_checksums: bool) -> Self {
        Self {
            source,
            verify_checksums,
        }
    }

    /// Current offset in the source.
    pub fn tell(&self) -> u64 {
        self.source.tell()
    }

    /// Reads the next fragment.
    ///
    /// The cursor advances by exactly the bytes consumed, also when an
    /// error is returned.
    ///
    /// # Errors
    ///
    /// - `FragmentTooLarge` if the header claims more bytes than the block holds
    /// - `ChecksumMismatch` if verification is enabled and the CRC differs
    /// - `UnknownFragmentType` for a type byte outside 0..=4
    /// - `Storage` if the source fails
    pub fn try_read_fragment(&mut self) -> CoreResult<Frame> {
        let offset = self.source.tell();
        let remaining = block_remaining(offset);
        if remaining < HEADER_SIZE {
            return Ok(Frame::BlockTrailer);
        }

        let raw = self.source.read(HEADER_SIZE)?;
        let Ok(raw) = <[u8; HEADER_SIZE]>::try_from(raw.as_slice()) else {
            return Ok(Frame::EndOfStream);
        };
        let header = FragmentHeader::decode(&raw);

        let length = usize::from(header.length);
        if length + HEADER_SIZE > remaining {
            return Err(CoreError::FragmentTooLarge {
                offset,
                length,
                remaining,
            });
        }

        let payload = self.source.read(length)?;
        if payload.len() != length {
            return Ok(Frame::EndOfStream);
        }

        if header.type_byte == FragmentType::None.as_byte() {
            return Ok(Frame::Fragment(Fragment {
                offset,
                fragment_type: FragmentType::None,
                payload: Vec::new(),
            }));
        }

        if self.verify_checksums {
            let expected = unmask(header.masked_crc);
            let actual = fragment_checksum(header.type_byte, &payload);
            if expected != actual {
                return Err(CoreError::ChecksumMismatch {
                    offset,
                    expected,
                    actual,
                });
            }
        }

        let fragment_type =
            FragmentType::from_byte(header.type_byte).ok_or(CoreError::UnknownFragmentType {
                offset,
                type_byte: header.type_byte,
            })?;

        Ok(Frame::Fragment(Fragment {
            offset,
            fragment_type,
            payload,
        }))
    }

    /// Consumes bytes up to the next block boundary.
    ///
    /// Returns the number of bytes skipped, zero if already aligned, or
    /// `None` if the source ended first.
    ///
    /// # Errors
    ///
    /// Returns an error if the source fails.
    pub fn skip_to_next_block(&mut self) -> CoreResult<Option<usize>> {
        let pad = block_remaining(self.source.tell());
        if pad == crate::log::format::BLOCK_SIZE {
            return Ok(Some(0));
        }
        let skipped = self.source.read(pad)?;
        if skipped.len() != pad {
            return Ok(None);
        }
        Ok(Some(pad))
    }

    /// Consumes the framer, returning the source.
    pub fn into_inner(self) -> S {
        self.source
    }
}
