//! Block-framed log reading.
//!
//! A log is a byte stream cut into 32 KiB blocks. Each block holds
//! fragments of the form
//!
//! ```text
//! | masked crc32c (4) | length (2) | type (1) | payload (length) |
//! ```
//!
//! A logical record is either one FULL fragment or a FIRST fragment, any
//! number of MIDDLE fragments and a LAST fragment. Headers never span a
//! block boundary; a block tail shorter than a header is zero padding.

mod crc;
mod format;
mod framer;
mod reader;
mod stats;
mod writer;

pub use crc::{fragment_checksum, mask, unmask, MASK_DELTA};
pub use format::{
    block_remaining, is_block_aligned, Fragment, FragmentHeader, FragmentType, BLOCK_SIZE,
    HEADER_SIZE, MAX_FRAGMENT_PAYLOAD,
};
pub use framer::{BlockFramer, Frame};
pub use reader::{OrderingAnomaly, ReadOutcome, RecordReader};
pub use stats::{ReaderStats, StatsSnapshot};
pub use writer::LogWriter;
