//! Recovery statistics for the record reader.
//!
//! Corruption never surfaces from [`RecordReader::read`](crate::RecordReader::read),
//! so these counters are how callers (and tests) observe that recovery
//! actually happened.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Counters maintained by a record reader.
///
/// All counters are atomic and can be read while a reader is running on
/// another thread. Values only ever increase.
#[derive(Debug, Default)]
pub struct ReaderStats {
    /// Logical records emitted.
    records: AtomicU64,
    /// Fragments consumed, padding included.
    fragments: AtomicU64,
    /// Fragments rejected by checksum verification.
    checksum_failures: AtomicU64,
    /// Fragments rejected for bad length or type.
    structural_failures: AtomicU64,
    /// Fragments whose type did not fit the assembly state.
    ordering_anomalies: AtomicU64,
    /// Skips to the next block boundary after corruption.
    resyncs: AtomicU64,
    /// Skips to the next block boundary over padding.
    padding_skips: AtomicU64,
    /// Bytes consumed by any block-boundary skip.
    bytes_skipped: AtomicU64,
    /// Partial records dropped at end of stream.
    truncated_records: AtomicU64,
}

impl ReaderStats {
    /// Creates a new stats instance.
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_record(&self) {
        self.records.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_fragment(&self) {
        self.fragments.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_checksum_failure(&self) {
        self.checksum_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_structural_failure(&self) {
        self.structural_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_ordering_anomaly(&self) {
        self.ordering_anomalies.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_resync(&self, skipped: u64) {
        self.resyncs.fetch_add(1, Ordering::Relaxed);
        self.bytes_skipped.fetch_add(skipped, Ordering::Relaxed);
    }

    pub(crate) fn record_padding_skip(&self, skipped: u64) {
        self.padding_skips.fetch_add(1, Ordering::Relaxed);
        self.bytes_skipped.fetch_add(skipped, Ordering::Relaxed);
    }

    pub(crate) fn record_truncated(&self) {
        self.truncated_records.fetch_add(1, Ordering::Relaxed);
    }

    /// Returns the number of logical records emitted.
    pub fn records(&self) -> u64 {
        self.records.load(Ordering::Relaxed)
    }

    /// Returns the number of fragments consumed.
    pub fn fragments(&self) -> u64 {
        self.fragments.load(Ordering::Relaxed)
    }

    /// Returns the number of checksum failures.
    pub fn checksum_failures(&self) -> u64 {
        self.checksum_failures.load(Ordering::Relaxed)
    }

    /// Returns the number of structural failures.
    pub fn structural_failures(&self) -> u64 {
        self.structural_failures.load(Ordering::Relaxed)
    }

    /// Returns the number of ordering anomalies.
    pub fn ordering_anomalies(&self) -> u64 {
        self.ordering_anomalies.load(Ordering::Relaxed)
    }

    /// Returns the number of corruption resyncs.
    pub fn resyncs(&self) -> u64 {
        self.resyncs.load(Ordering::Relaxed)
    }

    /// Returns the number of padding skips.
    pub fn padding_skips(&self) -> u64 {
        self.padding_skips.load(Ordering::Relaxed)
    }

    /// Returns the total bytes skipped to reach block boundaries.
    pub fn bytes_skipped(&self) -> u64 {
        self.bytes_skipped.load(Ordering::Relaxed)
    }

    /// Returns the number of partial records dropped at end of stream.
    pub fn truncated_records(&self) -> u64 {
        self.truncated_records.load(Ordering::Relaxed)
    }

    /// Returns a snapshot of all stats.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            records: self.records(),
            fragments: self.fragments(),
            checksum_failures: self.checksum_failures(),
            structural_failures: self.structural_failures(),
            ordering_anomalies: self.ordering_anomalies(),
            resyncs: self.resyncs(),
            padding_skips: self.padding_skips(),
            bytes_skipped: self.bytes_skipped(),
            truncated_records: self.truncated_records(),
        }
    }
}

/// A point-in-time snapshot of reader statistics.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct StatsSnapshot {
    /// Logical records emitted.
    pub records: u64,
    /// Fragments consumed.
    pub fragments: u64,
    /// Checksum failures.
    pub checksum_failures: u64,
    /// Structural failures.
    pub structural_failures: u64,
    /// Ordering anomalies.
    pub ordering_anomalies: u64,
    /// Corruption resyncs.
    pub resyncs: u64,
    /// Padding skips.
    pub padding_skips: u64,
    /// Bytes skipped to reach block boundaries.
    pub bytes_skipped: u64,
    /// Partial records dropped at end of stream.
    pub truncated_records: u64,
}

impl StatsSnapshot {
    /// Total fragments rejected as corrupt.
    #[must_use]
    pub fn corruption_events(&self) -> u64 {
        self.checksum_failures + self.structural_failures
    }

    /// Returns `true` if the reader saw no corruption, anomalies, or truncation.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.corruption_events() == 0 && self.ordering_anomalies == 0 && self.truncated_records == 0
    }

    /// Adds another snapshot's counters into this one.
    pub fn accumulate(&mut self, other: &StatsSnapshot) {
        self.records += other.records;
        self.fragments += other.fragments;
        self.checksum_failures += other.checksum_failures;
        self.structural_failures += other.structural_failures;
        self.ordering_anomalies += other.ordering_anomalies;
        self.resyncs += other.resyncs;
        self.padding_skips += other.padding_skips;
        self.bytes_skipped += other.bytes_skipped;
        self.truncated_records += other.truncated_records;
    }
}
