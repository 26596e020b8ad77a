//! # fsjson Core
//!
//! Reader for block-framed, checksummed record logs and export of the
//! datastore entities they carry to JSON.
//!
//! This crate provides:
//! - [`BlockFramer`]: one physical fragment at a time, with CRC32C checks
//! - [`RecordReader`]: reassembly of logical records and recovery from
//!   corrupt blocks
//! - [`LogWriter`]: the matching writer
//! - [`export`]: entity decoding and the nested JSON document
//!
//! ## Usage
//!
//! ```
//! use fsjson_core::{LogWriter, ReaderConfig, RecordReader};
//! use fsjson_storage::InMemorySource;
//!
//! let mut writer = LogWriter::new(Vec::new());
//! writer.add_record(b"first").unwrap();
//! writer.add_record(&vec![7u8; 100_000]).unwrap();
//!
//! let source = InMemorySource::new(writer.into_inner());
//! let reader = RecordReader::with_config(source, ReaderConfig::new().verify_checksums(true));
//! let stats = reader.stats();
//! let records: Vec<Vec<u8>> = reader.collect::<Result<_, _>>().unwrap();
//!
//! assert_eq!(records.len(), 2);
//! assert_eq!(records[1].len(), 100_000);
//! assert_eq!(stats.resyncs(), 0);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod error;
pub mod export;
pub mod log;

pub use config::{ExportOptions, ReaderConfig};
pub use error::{CoreError, CoreResult, CorruptionKind};
pub use export::{export_file, export_source, DocumentTree, ExportReport};
pub use log::{
    block_remaining, fragment_checksum, is_block_aligned, mask, unmask, BlockFramer, Fragment,
    FragmentHeader, FragmentType, Frame, LogWriter, OrderingAnomaly, ReadOutcome, ReaderStats,
    RecordReader, StatsSnapshot, BLOCK_SIZE, HEADER_SIZE,
};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
