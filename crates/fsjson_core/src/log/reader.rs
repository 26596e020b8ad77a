//! Logical record reader.
//!
//! Drives a [`BlockFramer`] and reassembles fragments into logical records.
//!
//! # States
//!
//! The reader is either idle or assembling a record started by a FIRST
//! fragment. Fragments that do not fit the current state are ordering
//! anomalies: they are logged, counted, and dropped without a resync.
//!
//! # Recovery
//!
//! Checksum and framing errors never reach the caller. The partial record
//! is discarded and the cursor skips to the next block boundary, so one
//! damaged fragment costs at most the rest of its block.
//!
//! A block tail too small for a header is padding and leaves an in-progress
//! record intact, since writers put it between FIRST and the next fragment.
//! An explicit NONE fragment while assembling is treated as an anomaly.

use crate::config::ReaderConfig;
use crate::error::{CoreError, CoreResult, CorruptionKind};
use crate::log::format::{Fragment, FragmentType};
use crate::log::framer::{BlockFramer, Frame};
use crate::log::stats::ReaderStats;
use fsjson_storage::ByteSource;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

/// Outcome of [`RecordReader::read`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadOutcome {
    /// A complete logical record.
    Record(Vec<u8>),
    /// The source is exhausted.
    EndOfStream,
}

impl ReadOutcome {
    /// Returns the record, if any.
    pub fn into_record(self) -> Option<Vec<u8>> {
        match self {
            Self::Record(data) => Some(data),
            Self::EndOfStream => None,
        }
    }
}

/// A fragment whose type is inconsistent with the assembly state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OrderingAnomaly {
    /// FULL arrived while a record was being assembled.
    FullWhileAssembling,
    /// FIRST arrived while a record was being assembled.
    FirstWhileAssembling,
    /// MIDDLE arrived with no record in progress.
    MiddleWithoutFirst,
    /// LAST arrived with no record in progress.
    LastWithoutFirst,
    /// A NONE fragment arrived while a record was being assembled.
    PaddingWhileAssembling,
}

impl fmt::Display for OrderingAnomaly {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::FullWhileAssembling => "FULL fragment while assembling a record",
            Self::FirstWhileAssembling => "FIRST fragment while assembling a record",
            Self::MiddleWithoutFirst => "MIDDLE fragment without a preceding FIRST",
            Self::LastWithoutFirst => "LAST fragment without a preceding FIRST",
            Self::PaddingWhileAssembling => "NONE fragment while assembling a record",
        };
        f.write_str(text)
    }
}

enum Step {
    Emit(Vec<u8>),
    Continue,
    SkipBlock,
}

/// Reads logical records from a block-framed log.
///
/// A reader is single-threaded and forward-only. Iterating it yields
/// `Ok(record)` until the source is exhausted; an `Err` is only produced
/// when the byte source itself fails, after which iteration stops.
///
/// # Example
///
/// ```
/// use fsjson_core::{LogWriter, RecordReader};
/// use fsjson_storage::InMemorySource;
///
/// let mut writer = LogWriter::new(Vec::new());
/// writer.add_record(b"hello").unwrap();
///
/// let reader = RecordReader::new(InMemorySource::new(writer.into_inner()));
/// let records: Vec<Vec<u8>> = reader.collect::<Result<_, _>>().unwrap();
/// assert_eq!(records, vec![b"hello".to_vec()]);
/// ```
pub struct RecordReader<S> {
    framer: BlockFramer<S>,
    assembly: Option<Vec<u8>>,
    stats: Arc<ReaderStats>,
    finished: bool,
}

impl<S: ByteSource> RecordReader<S> {
    /// Creates a reader with checksum verification enabled.
    pub fn new(source: S) -> Self {
        Self::with_config(source, ReaderConfig::default())
    }

    /// Creates a reader with the given configuration.
    pub fn with_config(source: S, config: ReaderConfig) -> Self {
        Self::with_stats(source, config, Arc::new(ReaderStats::new()))
    }

    /// Creates a reader that reports into a shared stats instance.
    pub fn with_stats(source: S, config: ReaderConfig, stats: Arc<ReaderStats>) -> Self {
        Self {
            framer: BlockFramer::new(source, config.verify_checksums),
            assembly: None,
            stats,
            finished: false,
        }
    }

    /// Reads the next logical record.
    ///
    /// # Errors
    ///
    /// Returns an error only if the byte source fails. Corruption in the
    /// log is recovered from internally and reported through
    /// [`stats`](Self::stats) and `tracing` warnings.
    pub fn read(&mut self) -> CoreResult<ReadOutcome> {
        loop {
            let offset = self.framer.tell();
            let frame = match self.framer.try_read_fragment() {
                Ok(frame) => frame,
                Err(err) => match err.corruption_kind() {
                    Some(kind) => {
                        if !self.resync(offset, kind, &err)? {
                            return Ok(self.end_of_stream());
                        }
                        continue;
                    }
                    None => return Err(err),
                },
            };

            let step = match frame {
                Frame::EndOfStream => return Ok(self.end_of_stream()),
                Frame::BlockTrailer => Step::SkipBlock,
                Frame::Fragment(fragment) => {
                    self.stats.record_fragment();
                    self.apply(fragment)
                }
            };

            match step {
                Step::Emit(record) => {
                    self.stats.record_record();
                    return Ok(ReadOutcome::Record(record));
                }
                Step::Continue => {}
                Step::SkipBlock => match self.framer.skip_to_next_block()? {
                    Some(skipped) => self.stats.record_padding_skip(skipped as u64),
                    None => return Ok(self.end_of_stream()),
                },
            }
        }
    }

    /// Current offset in the source.
    pub fn tell(&self) -> u64 {
        self.framer.tell()
    }

    /// Returns `true` if a partial record is buffered.
    pub fn is_assembling(&self) -> bool {
        self.assembly.is_some()
    }

    /// Returns the stats this reader reports into.
    pub fn stats(&self) -> Arc<ReaderStats> {
        Arc::clone(&self.stats)
    }

    /// Consumes the reader, returning the source.
    pub fn into_inner(self) -> S {
        self.framer.into_inner()
    }

    fn apply(&mut self, fragment: Fragment) -> Step {
        let offset = fragment.offset;
        match fragment.fragment_type {
            FragmentType::None => {
                if self.assembly.take().is_some() {
                    self.anomaly(offset, OrderingAnomaly::PaddingWhileAssembling);
                }
                Step::SkipBlock
            }
            FragmentType::Full => {
                if self.assembly.take().is_some() {
                    self.anomaly(offset, OrderingAnomaly::FullWhileAssembling);
                }
                Step::Emit(fragment.payload)
            }
            FragmentType::First => {
                if self.assembly.replace(fragment.payload).is_some() {
                    self.anomaly(offset, OrderingAnomaly::FirstWhileAssembling);
                }
                Step::Continue
            }
            FragmentType::Middle => {
                match self.assembly.as_mut() {
                    Some(buffer) => buffer.extend_from_slice(&fragment.payload),
                    None => self.anomaly(offset, OrderingAnomaly::MiddleWithoutFirst),
                }
                Step::Continue
            }
            FragmentType::Last => match self.assembly.take() {
                Some(mut buffer) => {
                    buffer.extend_from_slice(&fragment.payload);
                    Step::Emit(buffer)
                }
                None => {
                    self.anomaly(offset, OrderingAnomaly::LastWithoutFirst);
                    Step::Continue
                }
            },
        }
    }

    fn anomaly(&self, offset: u64, anomaly: OrderingAnomaly) {
        warn!(offset, %anomaly, "ordering anomaly in log");
        self.stats.record_ordering_anomaly();
    }

    /// Drops any partial record and skips to the next block boundary.
    ///
    /// Returns `false` if the source ended during the skip.
    fn resync(&mut self, offset: u64, kind: CorruptionKind, err: &CoreError) -> CoreResult<bool> {
        let discarded = self.assembly.take().map_or(0, |buffer| buffer.len());
        match kind {
            CorruptionKind::Integrity => self.stats.record_checksum_failure(),
            CorruptionKind::Structural => self.stats.record_structural_failure(),
        }
        warn!(
            offset,
            %kind,
            error = %err,
            discarded,
            "corrupt fragment, skipping to next block"
        );

        match self.framer.skip_to_next_block()? {
            Some(skipped) => {
                self.stats.record_resync(skipped as u64);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn end_of_stream(&mut self) -> ReadOutcome {
        if let Some(buffer) = self.assembly.take() {
            debug!(
                offset = self.framer.tell(),
                bytes = buffer.len(),
                "dropping truncated record at end of log"
            );
            self.stats.record_truncated();
        }
        ReadOutcome::EndOfStream
    }
}

impl<S: ByteSource> Iterator for RecordReader<S> {
    type Item = CoreResult<Vec<u8>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        match self.read() {
            Ok(ReadOutcome::Record(record)) => Some(Ok(record)),
            Ok(ReadOutcome::EndOfStream) => {
                self.finished = true;
                None
            }
            Err(err) => {
                self.finished = true;
                Some(Err(err))
            }
        }
    }
}

impl<S: ByteSource> std::iter::FusedIterator for RecordReader<S> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::log::crc::{fragment_checksum, mask};
    use crate::log::format::{FragmentHeader, BLOCK_SIZE, HEADER_SIZE};
    use crate::log::writer::LogWriter;
    use fsjson_storage::{InMemorySource, StorageError, StorageResult};
    use proptest::prelude::*;

    fn read_all(bytes: Vec<u8>, config: ReaderConfig) -> (Vec<Vec<u8>>, Arc<ReaderStats>) {
        let reader = RecordReader::with_config(InMemorySource::new(bytes), config);
        let stats = reader.stats();
        let records = reader.collect::<CoreResult<Vec<_>>>().unwrap();
        (records, stats)
    }

    fn fragments(parts: &[(FragmentType, &[u8])]) -> Vec<u8> {
        let mut writer = LogWriter::new(Vec::new());
        for (fragment_type, payload) in parts {
            writer.write_fragment(*fragment_type, payload).unwrap();
        }
        writer.into_inner()
    }

    #[test]
    fn single_full_record() {
        let bytes = fragments(&[(FragmentType::Full, b"P")]);
        let (records, stats) = read_all(bytes, ReaderConfig::default());
        assert_eq!(records, vec![b"P".to_vec()]);
        assert!(stats.snapshot().is_clean());
    }

    #[test]
    fn reassembles_fragments_in_order() {
        let bytes = fragments(&[
            (FragmentType::First, b"A"),
            (FragmentType::Middle, b"B"),
            (FragmentType::Last, b"C"),
        ]);
        let (records, stats) = read_all(bytes, ReaderConfig::default());
        assert_eq!(records, vec![b"ABC".to_vec()]);
        assert_eq!(stats.fragments(), 3);
        assert_eq!(stats.records(), 1);
    }

    #[test]
    fn trailer_padding_keeps_partial_record() {
        let mut writer = LogWriter::new(Vec::new());
        let first = vec![7u8; BLOCK_SIZE - HEADER_SIZE - 4];
        writer.write_fragment(FragmentType::First, &first).unwrap();
        writer.pad_block().unwrap();
        writer.write_fragment(FragmentType::Last, b"tail").unwrap();

        let (records, stats) = read_all(writer.into_inner(), ReaderConfig::default());
        let mut expected = first;
        expected.extend_from_slice(b"tail");
        assert_eq!(records, vec![expected]);
        assert_eq!(stats.padding_skips(), 1);
        assert_eq!(stats.ordering_anomalies(), 0);
    }

    #[test]
    fn none_fragment_while_assembling_discards() {
        let mut writer = LogWriter::new(Vec::new());
        writer.write_fragment(FragmentType::First, b"lost").unwrap();
        writer.write_fragment(FragmentType::None, b"").unwrap();
        writer.pad_block().unwrap();
        writer.write_fragment(FragmentType::Last, b"orphan").unwrap();
        writer.write_fragment(FragmentType::Full, b"kept").unwrap();

        let (records, stats) = read_all(writer.into_inner(), ReaderConfig::default());
        assert_eq!(records, vec![b"kept".to_vec()]);
        assert_eq!(stats.ordering_anomalies(), 2);
    }

    #[test]
    fn full_while_assembling_drops_buffer() {
        let bytes = fragments(&[
            (FragmentType::First, b"stale"),
            (FragmentType::Full, b"fresh"),
        ]);
        let (records, stats) = read_all(bytes, ReaderConfig::default());
        assert_eq!(records, vec![b"fresh".to_vec()]);
        assert_eq!(stats.ordering_anomalies(), 1);
    }

    #[test]
    fn first_while_assembling_restarts() {
        let bytes = fragments(&[
            (FragmentType::First, b"old"),
            (FragmentType::First, b"new"),
            (FragmentType::Last, b"!"),
        ]);
        let (records, stats) = read_all(bytes, ReaderConfig::default());
        assert_eq!(records, vec![b"new!".to_vec()]);
        assert_eq!(stats.ordering_anomalies(), 1);
    }

    #[test]
    fn orphan_middle_and_last_are_ignored() {
        let bytes = fragments(&[
            (FragmentType::Middle, b"m"),
            (FragmentType::Last, b"l"),
            (FragmentType::Full, b"ok"),
        ]);
        let (records, stats) = read_all(bytes, ReaderConfig::default());
        assert_eq!(records, vec![b"ok".to_vec()]);
        assert_eq!(stats.ordering_anomalies(), 2);
        assert_eq!(stats.resyncs(), 0);
    }

    #[test]
    fn checksum_failure_resyncs_to_next_block() {
        let mut writer = LogWriter::new(Vec::new());
        writer.add_record(b"bad").unwrap();
        writer.add_record(b"same block, lost").unwrap();
        writer.pad_block().unwrap();
        writer.add_record(b"good").unwrap();
        let mut bytes = writer.into_inner();
        bytes[HEADER_SIZE] ^= 0x01;

        let (records, stats) = read_all(bytes.clone(), ReaderConfig::default());
        assert_eq!(records, vec![b"good".to_vec()]);
        assert_eq!(stats.checksum_failures(), 1);
        assert_eq!(stats.resyncs(), 1);

        let (records, stats) = read_all(bytes, ReaderConfig::new().verify_checksums(false));
        assert_eq!(records.len(), 3);
        assert_eq!(records[0], b"cad");
        assert_eq!(stats.checksum_failures(), 0);
    }

    #[test]
    fn oversized_header_resyncs_aligned() {
        let header = FragmentHeader {
            masked_crc: 0,
            length: 40_000,
            type_byte: FragmentType::Full.as_byte(),
        };
        let mut bytes = header.encode().to_vec();
        bytes.resize(BLOCK_SIZE, 0);
        let mut writer = LogWriter::new(bytes);
        writer.add_record(b"after").unwrap();

        let mut reader = RecordReader::new(InMemorySource::new(writer.into_inner()));
        assert_eq!(reader.read().unwrap(), ReadOutcome::Record(b"after".to_vec()));
        assert_eq!(reader.stats().structural_failures(), 1);
        assert_eq!(reader.stats().bytes_skipped(), (BLOCK_SIZE - HEADER_SIZE) as u64);
    }

    #[test]
    fn corruption_discards_partial_record() {
        let mut writer = LogWriter::new(Vec::new());
        writer.write_fragment(FragmentType::First, b"head").unwrap();
        let corrupt_at = writer.bytes_written() as usize;
        writer.write_fragment(FragmentType::Last, b"tail").unwrap();
        writer.pad_block().unwrap();
        writer.write_fragment(FragmentType::Last, b"orphan").unwrap();
        let mut bytes = writer.into_inner();
        bytes[corrupt_at + HEADER_SIZE] ^= 0x80;

        let mut reader = RecordReader::new(InMemorySource::new(bytes));
        assert_eq!(reader.read().unwrap(), ReadOutcome::EndOfStream);
        let stats = reader.stats().snapshot();
        assert_eq!(stats.checksum_failures, 1);
        assert_eq!(stats.ordering_anomalies, 1);
        assert_eq!(stats.truncated_records, 0);
    }

    #[test]
    fn truncated_tail_is_dropped_silently() {
        let bytes = fragments(&[
            (FragmentType::Full, b"whole"),
            (FragmentType::First, b"never finished"),
        ]);
        let mut reader = RecordReader::new(InMemorySource::new(bytes));
        assert_eq!(reader.read().unwrap(), ReadOutcome::Record(b"whole".to_vec()));
        assert_eq!(reader.read().unwrap(), ReadOutcome::EndOfStream);
        assert!(!reader.is_assembling());
        assert_eq!(reader.stats().truncated_records(), 1);
    }

    #[test]
    fn consecutive_corrupt_blocks_stay_aligned() {
        let mut bytes = Vec::new();
        for _ in 0..3 {
            let mut block = vec![0xFFu8; BLOCK_SIZE];
            block[4] = 0x10;
            block[5] = 0x00;
            bytes.extend_from_slice(&block);
        }
        let mut writer = LogWriter::new(bytes);
        writer.add_record(b"survivor").unwrap();

        let mut reader = RecordReader::new(InMemorySource::new(writer.into_inner()));
        assert_eq!(reader.read().unwrap(), ReadOutcome::Record(b"survivor".to_vec()));
        assert_eq!(reader.stats().resyncs(), 3);
        assert_eq!(
            reader.stats().bytes_skipped(),
            3 * (BLOCK_SIZE - HEADER_SIZE - 16) as u64
        );
    }

    #[test]
    fn padding_then_record() {
        let mut bytes = vec![0u8; BLOCK_SIZE];
        let header = FragmentHeader {
            masked_crc: mask(fragment_checksum(1, b"hello")),
            length: 5,
            type_byte: 1,
        };
        bytes.extend_from_slice(&header.encode());
        bytes.extend_from_slice(b"hello");

        let (records, _) = read_all(bytes, ReaderConfig::default());
        assert_eq!(records, vec![b"hello".to_vec()]);
    }

    struct FailingSource;

    impl ByteSource for FailingSource {
        fn read(&mut self, _n: usize) -> StorageResult<Vec<u8>> {
            Err(StorageError::Closed)
        }

        fn tell(&self) -> u64 {
            0
        }
    }

    #[test]
    fn source_errors_propagate_once() {
        let mut reader = RecordReader::new(FailingSource);
        assert!(matches!(reader.next(), Some(Err(CoreError::Storage(_)))));
        assert!(reader.next().is_none());
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn written_records_read_back_unchanged(
            records in prop::collection::vec(
                prop::collection::vec(any::<u8>(), 0..2 * BLOCK_SIZE),
                0..12,
            ),
        ) {
            let mut writer = LogWriter::new(Vec::new());
            for record in &records {
                writer.add_record(record).unwrap();
            }

            let (read, stats) = read_all(writer.into_inner(), ReaderConfig::default());
            prop_assert_eq!(read, records);
            prop_assert!(stats.snapshot().is_clean());
        }
    }
}
