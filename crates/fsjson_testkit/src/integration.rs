//! Cross-crate integration test helpers.
//!
//! [`ExportHarness`] owns a temporary input and output directory, writes
//! log files built from entities, and runs the file exporter over them.

use crate::fixtures::{entity_log, write_log_file};
use fsjson_codec::Entity;
use fsjson_core::{export_file, export_source, ExportOptions, ExportReport};
use fsjson_storage::InMemorySource;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A pair of temporary directories for exporting log files.
pub struct ExportHarness {
    input: TempDir,
    output: TempDir,
    options: ExportOptions,
}

impl ExportHarness {
    /// Creates a harness with default export options.
    pub fn new() -> Self {
        Self::with_options(ExportOptions::default())
    }

    /// Creates a harness with the given export options.
    pub fn with_options(options: ExportOptions) -> Self {
        Self {
            input: TempDir::new().expect("Failed to create input dir"),
            output: TempDir::new().expect("Failed to create output dir"),
            options,
        }
    }

    /// Directory holding input logs.
    pub fn input_dir(&self) -> &Path {
        self.input.path()
    }

    /// Directory receiving JSON documents.
    pub fn output_dir(&self) -> &Path {
        self.output.path()
    }

    /// Writes raw log bytes as an input file.
    pub fn add_log(&self, name: &str, bytes: &[u8]) -> PathBuf {
        write_log_file(self.input_dir(), name, bytes)
    }

    /// Writes `entities` as an input file, one record each.
    pub fn add_entities(&self, name: &str, entities: &[Entity]) -> PathBuf {
        self.add_log(name, &entity_log(entities))
    }

    /// Exports one input file and parses the document it wrote.
    pub fn export(&self, name: &str) -> (ExportReport, Value) {
        let report = export_file(&self.input_dir().join(name), self.output_dir(), &self.options)
            .expect("Failed to export");
        let output = report.output.clone().expect("file export sets an output path");
        let text = std::fs::read_to_string(output).expect("Failed to read output");
        let document = serde_json::from_str(&text).expect("output is not valid JSON");
        (report, document)
    }
}

impl Default for ExportHarness {
    fn default() -> Self {
        Self::new()
    }
}

/// Exports an in-memory log and returns the report and document.
pub fn export_bytes(bytes: Vec<u8>, options: &ExportOptions) -> (ExportReport, Value) {
    let (tree, report) =
        export_source(InMemorySource::new(bytes), options).expect("in-memory sources do not fail");
    (report, tree.into_value())
}

/// Asserts that exporting from a file and from memory agree.
pub fn assert_file_matches_memory(harness: &ExportHarness, name: &str) {
    let bytes = std::fs::read(harness.input_dir().join(name)).expect("Failed to read input");
    let (file_report, file_doc) = harness.export(name);
    let (mem_report, mem_doc) = export_bytes(bytes, &harness.options);

    assert_eq!(file_doc, mem_doc);
    assert_eq!(file_report.records, mem_report.records);
    assert_eq!(file_report.entities, mem_report.entities);
    assert_eq!(file_report.reader, mem_report.reader);
}
