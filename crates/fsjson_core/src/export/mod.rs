//! Export of a log of entities to one JSON document.
//!
//! Each logical record is decoded as an entity and merged into a
//! [`DocumentTree`] by its key path. Records that fail to decode are logged
//! and counted; they do not abort the export.

mod document;
mod json;

pub use document::DocumentTree;
pub use json::{fields_to_json, timestamp_millis, value_to_json};

use crate::config::ExportOptions;
use crate::error::{CoreError, CoreResult};
use crate::log::{RecordReader, StatsSnapshot};
use fsjson_codec::{decode_entity, CodecError};
use fsjson_storage::{ByteSource, FileSource};
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Summary of one export.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExportReport {
    /// Input file, when exporting from disk.
    pub source: Option<PathBuf>,
    /// Output file, when exporting to disk.
    pub output: Option<PathBuf>,
    /// Logical records read.
    pub records: u64,
    /// Entities merged into the document.
    pub entities: u64,
    /// Records that could not be decoded or placed.
    pub decode_failures: u64,
    /// Reader counters at the end of the export.
    pub reader: StatsSnapshot,
}

impl ExportReport {
    /// Returns `true` if nothing was lost to corruption or decoding errors.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.decode_failures == 0 && self.reader.is_clean()
    }
}

/// Reads every record from `source` and builds the output document.
///
/// # Errors
///
/// Returns an error only if the byte source fails.
pub fn export_source<S: ByteSource>(
    source: S,
    options: &ExportOptions,
) -> CoreResult<(DocumentTree, ExportReport)> {
    let reader = RecordReader::with_config(source, options.reader.clone());
    let stats = reader.stats();
    let mut tree = DocumentTree::new();
    let mut report = ExportReport::default();

    for record in reader {
        let record = record?;
        report.records += 1;
        match merge_record(&mut tree, &record) {
            Ok(()) => report.entities += 1,
            Err(err) => {
                report.decode_failures += 1;
                warn!(
                    record = report.records,
                    bytes = record.len(),
                    error = %err,
                    "skipping record that is not a valid entity"
                );
            }
        }
    }

    report.reader = stats.snapshot();
    Ok((tree, report))
}

fn merge_record(tree: &mut DocumentTree, record: &[u8]) -> CoreResult<()> {
    let entity = decode_entity(record)?;
    let key = entity.key.as_ref().ok_or(CodecError::missing_field("key"))?;
    let fields = fields_to_json(entity.fields()?);
    tree.insert(key, fields)
}

/// Path of the JSON document written for `in_path`: `<out_dir>/<file name>.json`.
///
/// # Errors
///
/// Returns `InvalidOperation` if `in_path` has no file name.
pub fn output_path(in_path: &Path, out_dir: &Path) -> CoreResult<PathBuf> {
    let name = in_path.file_name().ok_or_else(|| {
        CoreError::invalid_operation(format!("{} has no file name", in_path.display()))
    })?;
    let mut name = name.to_os_string();
    name.push(".json");
    Ok(out_dir.join(name))
}

/// Exports one log file to `<out_dir>/<file name>.json`.
///
/// # Errors
///
/// Returns an error if the input cannot be read or the output cannot be
/// written.
pub fn export_file(in_path: &Path, out_dir: &Path, options: &ExportOptions) -> CoreResult<ExportReport> {
    debug!(path = %in_path.display(), "reading log");
    let source = FileSource::open(in_path)?;
    let (tree, mut report) = export_source(source, options)?;

    let out_path = output_path(in_path, out_dir)?;
    let mut writer = BufWriter::new(File::create(&out_path)?);
    tree.write_json(&mut writer, options.pretty)?;
    writer.flush()?;

    debug!(
        path = %out_path.display(),
        entities = report.entities,
        "JSON document written"
    );
    report.source = Some(in_path.to_path_buf());
    report.output = Some(out_path);
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::log::LogWriter;
    use fsjson_codec::{encode_entity, Entity, Key, PathElement, Property, PropertyValue};
    use fsjson_storage::InMemorySource;
    use serde_json::json;
    use tempfile::tempdir;

    fn entity(kind: &str, id: i64, field: &str, value: i64) -> Vec<u8> {
        let key = Key::new("app", vec![PathElement::with_id(kind, id)]);
        encode_entity(
            &Entity::new(key).with_property(Property::new(field, PropertyValue::Int64(value))),
        )
    }

    fn log(records: &[Vec<u8>]) -> Vec<u8> {
        let mut writer = LogWriter::new(Vec::new());
        for record in records {
            writer.add_record(record).unwrap();
        }
        writer.into_inner()
    }

    #[test]
    fn exports_entities() {
        let bytes = log(&[entity("K", 1, "a", 10), entity("K", 2, "a", 20)]);
        let (tree, report) =
            export_source(InMemorySource::new(bytes), &ExportOptions::default()).unwrap();

        assert_eq!(report.records, 2);
        assert_eq!(report.entities, 2);
        assert!(report.is_clean());
        assert_eq!(
            tree.into_value(),
            json!({"K": {"1": {"a": 10}, "2": {"a": 20}}})
        );
    }

    #[test]
    fn undecodable_records_are_counted() {
        let keyless = encode_entity(&Entity::default());
        let bytes = log(&[vec![0xFF, 0xFF], keyless, entity("K", 1, "a", 1)]);
        let (tree, report) =
            export_source(InMemorySource::new(bytes), &ExportOptions::default()).unwrap();

        assert_eq!(report.records, 3);
        assert_eq!(report.decode_failures, 2);
        assert_eq!(tree.entity_count(), 1);
        assert!(!report.is_clean());
    }

    #[test]
    fn output_path_appends_extension() {
        let path = output_path(Path::new("/data/output-0"), Path::new("/out")).unwrap();
        assert_eq!(path, PathBuf::from("/out/output-0.json"));
        assert!(output_path(Path::new("/"), Path::new("/out")).is_err());
    }

    #[test]
    fn export_file_writes_document() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("output-1");
        std::fs::write(&input, log(&[entity("Doc", 5, "n", 1)])).unwrap();

        let report = export_file(&input, dir.path(), &ExportOptions::default()).unwrap();
        let out = report.output.clone().unwrap();
        assert_eq!(out, dir.path().join("output-1.json"));

        let text = std::fs::read_to_string(out).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value, json!({"Doc": {"5": {"n": 1}}}));
        assert!(text.starts_with("{\n  \"Doc\""));
    }

    #[test]
    fn export_file_rejects_directory() {
        let dir = tempdir().unwrap();
        let err = export_file(dir.path(), dir.path(), &ExportOptions::default()).unwrap_err();
        assert!(matches!(err, CoreError::Storage(_)));
    }
}
