//! Verify command implementation.

use fsjson_core::{ReaderConfig, RecordReader, StatsSnapshot};
use fsjson_storage::FileSource;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Verification result for one file.
#[derive(Debug, Serialize)]
pub struct VerifyResult {
    /// File checked.
    pub path: PathBuf,
    /// Reader counters after reading every record.
    pub stats: StatsSnapshot,
}

impl VerifyResult {
    fn is_ok(&self) -> bool {
        self.stats.is_clean()
    }
}

/// Runs the verify command.
pub fn run(files: &[PathBuf], skip_crc: bool, format: &str) -> Result<(), Box<dyn std::error::Error>> {
    let mut results = Vec::with_capacity(files.len());
    for path in files {
        results.push(verify_file(path, skip_crc)?);
    }

    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&results)?),
        _ => {
            for result in &results {
                print_result(result);
            }
        }
    }

    if results.iter().all(VerifyResult::is_ok) {
        Ok(())
    } else {
        Err("Verification failed".into())
    }
}

/// Reads every record of `path` and returns the reader counters.
pub fn verify_file(path: &Path, skip_crc: bool) -> Result<VerifyResult, Box<dyn std::error::Error>> {
    let source = FileSource::open(path)?;
    let config = ReaderConfig::new().verify_checksums(!skip_crc);
    let mut reader = RecordReader::with_config(source, config);
    let stats = reader.stats();

    for record in reader.by_ref() {
        record?;
    }

    Ok(VerifyResult {
        path: path.to_path_buf(),
        stats: stats.snapshot(),
    })
}

fn print_result(result: &VerifyResult) {
    let stats = &result.stats;
    let mark = if result.is_ok() { "✓" } else { "✗" };
    println!("{mark} {}", result.path.display());
    println!("  Records:             {}", stats.records);
    println!("  Fragments:           {}", stats.fragments);
    println!("  Checksum failures:   {}", stats.checksum_failures);
    println!("  Structural failures: {}", stats.structural_failures);
    println!("  Ordering anomalies:  {}", stats.ordering_anomalies);
    println!("  Resyncs:             {}", stats.resyncs);
    println!("  Bytes skipped:       {}", stats.bytes_skipped);
    println!("  Truncated records:   {}", stats.truncated_records);
}
