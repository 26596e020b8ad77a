//! Convert command implementation.
//!
//! Exports every log file in a directory to `<dest>/<name>.json`, spreading
//! files over a pool of worker threads. Workers share nothing but an atomic
//! job index, a progress counter and the list of results.

use fsjson_core::{export_file, ExportOptions, ExportReport, StatsSnapshot};
use parking_lot::Mutex;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use thiserror::Error;
use tracing::{error, info, warn};

/// Errors that stop or fail a conversion.
#[derive(Debug, Error)]
pub enum ConvertError {
    /// The source path is not a directory.
    #[error("source directory does not exist: {}", .0.display())]
    SourceNotDirectory(PathBuf),

    /// A worker count of zero was requested.
    #[error("at least one worker is required")]
    NoWorkers,

    /// Filesystem error while preparing the conversion.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Some files could not be converted.
    #[error("{failed} of {total} files failed to convert")]
    Failed {
        /// Number of failed files.
        failed: usize,
        /// Number of files attempted.
        total: usize,
    },
}

/// Settings for one conversion run.
#[derive(Debug, Clone)]
pub struct ConvertOptions {
    /// Directory holding the log files.
    pub source_dir: PathBuf,
    /// Output directory; defaults to `<source_dir>/json`.
    pub dest_dir: Option<PathBuf>,
    /// Worker threads; defaults to one less than the CPU count.
    pub workers: Option<usize>,
    /// Delete `*.json` files in the destination first.
    pub clean_dest: bool,
    /// Skip checksum verification.
    pub skip_crc: bool,
    /// Only convert files whose name starts with this prefix.
    pub prefix: Option<String>,
}

/// Outcome of a conversion run.
#[derive(Debug, Default)]
pub struct ConvertSummary {
    /// Output directory.
    pub dest_dir: PathBuf,
    /// Reports for files converted successfully.
    pub reports: Vec<ExportReport>,
    /// Files that failed, with the error message.
    pub failures: Vec<(PathBuf, String)>,
}

impl ConvertSummary {
    /// Sum of reader counters over all converted files.
    pub fn totals(&self) -> StatsSnapshot {
        let mut totals = StatsSnapshot::default();
        for report in &self.reports {
            totals.accumulate(&report.reader);
        }
        totals
    }

    /// Total entities written.
    pub fn entities(&self) -> u64 {
        self.reports.iter().map(|report| report.entities).sum()
    }

    /// Total records that failed to decode.
    pub fn decode_failures(&self) -> u64 {
        self.reports.iter().map(|report| report.decode_failures).sum()
    }
}

/// Runs the convert command.
pub fn run(options: &ConvertOptions) -> Result<(), Box<dyn std::error::Error>> {
    let summary = convert(options)?;
    let totals = summary.totals();

    info!(
        files = summary.reports.len(),
        entities = summary.entities(),
        decode_failures = summary.decode_failures(),
        resyncs = totals.resyncs,
        "conversion finished, output in {}",
        summary.dest_dir.display()
    );

    if summary.failures.is_empty() {
        Ok(())
    } else {
        for (path, message) in &summary.failures {
            error!("{}: {}", path.display(), message);
        }
        Err(ConvertError::Failed {
            failed: summary.failures.len(),
            total: summary.failures.len() + summary.reports.len(),
        }
        .into())
    }
}

/// Validates the options and converts every matching file.
///
/// Per-file failures are collected in the summary rather than returned.
pub fn convert(options: &ConvertOptions) -> Result<ConvertSummary, ConvertError> {
    if !options.source_dir.is_dir() {
        return Err(ConvertError::SourceNotDirectory(options.source_dir.clone()));
    }
    let workers = match options.workers {
        Some(0) => return Err(ConvertError::NoWorkers),
        Some(n) => n,
        None => default_workers(),
    };

    let source_dir = fs::canonicalize(&options.source_dir)?;
    let dest_dir = match &options.dest_dir {
        Some(dir) => dir.clone(),
        None => source_dir.join("json"),
    };
    fs::create_dir_all(&dest_dir)?;

    if options.clean_dest {
        clean_json_files(&dest_dir)?;
    }

    let files = list_inputs(&source_dir, options.prefix.as_deref())?;
    info!(
        files = files.len(),
        workers,
        "converting {} into {}",
        source_dir.display(),
        dest_dir.display()
    );

    let export_options = ExportOptions::new().verify_checksums(!options.skip_crc);
    let (reports, failures) = process_files(&files, &dest_dir, &export_options, workers);

    Ok(ConvertSummary {
        dest_dir,
        reports,
        failures,
    })
}

/// One less than the available parallelism, and at least one.
pub fn default_workers() -> usize {
    thread::available_parallelism()
        .map(|n| n.get().saturating_sub(1))
        .unwrap_or(1)
        .max(1)
}

/// Regular files in `dir`, sorted by name.
pub fn list_inputs(dir: &Path, prefix: Option<&str>) -> io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let name = entry.file_name();
        if let Some(prefix) = prefix {
            if !name.to_string_lossy().starts_with(prefix) {
                continue;
            }
        }
        files.push(entry.path());
    }
    files.sort();
    Ok(files)
}

/// Deletes `*.json` files directly inside `dir`.
///
/// A file that cannot be deleted is logged and left in place.
pub fn clean_json_files(dir: &Path) -> io::Result<usize> {
    let mut entries = fs::read_dir(dir)?.peekable();
    if entries.peek().is_none() {
        return Ok(0);
    }

    info!("destination directory is not empty, deleting json files");
    let mut removed = 0;
    for entry in entries {
        let path = entry?.path();
        if !path.is_file() || path.extension().map_or(true, |ext| ext != "json") {
            continue;
        }
        match fs::remove_file(&path) {
            Ok(()) => removed += 1,
            Err(err) => warn!("could not delete {}: {}", path.display(), err),
        }
    }
    Ok(removed)
}

fn process_files(
    files: &[PathBuf],
    dest_dir: &Path,
    options: &ExportOptions,
    workers: usize,
) -> (Vec<ExportReport>, Vec<(PathBuf, String)>) {
    let next = AtomicUsize::new(0);
    let done = AtomicUsize::new(0);
    let reports = Mutex::new(Vec::with_capacity(files.len()));
    let failures = Mutex::new(Vec::new());
    let total = files.len();

    thread::scope(|scope| {
        for _ in 0..workers.min(total) {
            scope.spawn(|| loop {
                let index = next.fetch_add(1, Ordering::Relaxed);
                let Some(path) = files.get(index) else {
                    break;
                };

                info!("reading source from {}", path.display());
                match export_file(path, dest_dir, options) {
                    Ok(report) => {
                        if !report.is_clean() {
                            warn!(
                                checksum_failures = report.reader.checksum_failures,
                                structural_failures = report.reader.structural_failures,
                                decode_failures = report.decode_failures,
                                "{} had damaged records",
                                path.display()
                            );
                        }
                        reports.lock().push(report);
                    }
                    Err(err) => {
                        error!("failed to convert {}: {}", path.display(), err);
                        failures.lock().push((path.clone(), err.to_string()));
                    }
                }

                let finished = done.fetch_add(1, Ordering::Relaxed) + 1;
                info!("[{finished}/{total}] {}", path.display());
            });
        }
    });

    let mut reports = reports.into_inner();
    reports.sort_by(|a, b| a.source.cmp(&b.source));
    let mut failures = failures.into_inner();
    failures.sort();
    (reports, failures)
}

#[cfg(test)]
mod tests {
    use super::*;
    use fsjson_codec::{encode_entity, Entity, Key, PathElement, Property, PropertyValue};
    use fsjson_core::LogWriter;
    use tempfile::tempdir;

    fn write_log(path: &Path, ids: &[i64]) {
        let mut writer = LogWriter::new(Vec::new());
        for id in ids {
            let key = Key::new("app", vec![PathElement::with_id("Item", *id)]);
            let entity =
                Entity::new(key).with_property(Property::new("id", PropertyValue::Int64(*id)));
            writer.add_record(&encode_entity(&entity)).unwrap();
        }
        fs::write(path, writer.into_inner()).unwrap();
    }

    fn options(source: &Path) -> ConvertOptions {
        ConvertOptions {
            source_dir: source.to_path_buf(),
            dest_dir: None,
            workers: Some(2),
            clean_dest: false,
            skip_crc: false,
            prefix: None,
        }
    }

    #[test]
    fn converts_every_file() {
        let dir = tempdir().unwrap();
        for n in 0..5 {
            write_log(&dir.path().join(format!("output-{n}")), &[n, n + 100]);
        }

        let summary = convert(&options(dir.path())).unwrap();
        assert_eq!(summary.reports.len(), 5);
        assert!(summary.failures.is_empty());
        assert_eq!(summary.entities(), 10);

        let json_dir = fs::canonicalize(dir.path()).unwrap().join("json");
        assert_eq!(summary.dest_dir, json_dir);
        for n in 0..5 {
            assert!(json_dir.join(format!("output-{n}.json")).is_file());
        }
    }

    #[test]
    fn missing_source_is_fatal() {
        let dir = tempdir().unwrap();
        let err = convert(&options(&dir.path().join("nope"))).unwrap_err();
        assert!(matches!(err, ConvertError::SourceNotDirectory(_)));
    }

    #[test]
    fn zero_workers_is_rejected() {
        let dir = tempdir().unwrap();
        let mut opts = options(dir.path());
        opts.workers = Some(0);
        assert!(matches!(convert(&opts), Err(ConvertError::NoWorkers)));
    }

    #[test]
    fn prefix_filters_inputs() {
        let dir = tempdir().unwrap();
        write_log(&dir.path().join("output-0"), &[1]);
        write_log(&dir.path().join("other"), &[2]);
        fs::create_dir(dir.path().join("output-dir")).unwrap();

        let files = list_inputs(dir.path(), Some("output")).unwrap();
        assert_eq!(files, vec![dir.path().join("output-0")]);
    }

    #[test]
    fn clean_dest_removes_only_json() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("old.json"), "{}").unwrap();
        fs::write(dir.path().join("keep.txt"), "x").unwrap();

        assert_eq!(clean_json_files(dir.path()).unwrap(), 1);
        assert!(!dir.path().join("old.json").exists());
        assert!(dir.path().join("keep.txt").exists());
    }

    #[test]
    fn unwritable_output_is_reported_not_fatal() {
        let source = tempdir().unwrap();
        let dest = tempdir().unwrap();
        write_log(&source.path().join("a"), &[1]);
        write_log(&source.path().join("b"), &[2]);
        // a directory named like the output makes the write fail
        fs::create_dir(dest.path().join("b.json")).unwrap();

        let mut opts = options(source.path());
        opts.dest_dir = Some(dest.path().to_path_buf());
        let summary = convert(&opts).unwrap();
        assert_eq!(summary.reports.len(), 1);
        assert_eq!(summary.failures.len(), 1);
        assert!(summary.failures[0].0.ends_with("b"));
    }

    #[test]
    fn default_workers_is_positive() {
        assert!(default_workers() >= 1);
    }
}
