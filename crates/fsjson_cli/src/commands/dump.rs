//! Dump command implementation.

use fsjson_codec::decode_entity;
use fsjson_core::{ReaderConfig, RecordReader};
use fsjson_storage::FileSource;
use serde::Serialize;
use std::path::Path;

/// Logical record representation for output.
#[derive(Debug, Serialize)]
pub struct RecordInfo {
    /// Position of the record in the log.
    pub index: usize,
    /// Reader offset just after the record.
    pub end_offset: u64,
    /// Record size in bytes.
    pub size: usize,
    /// Entity key path, if the record decodes as an entity.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    /// Number of output fields, if the record decodes as an entity.
    ///
    /// A multi-valued property counts once.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<usize>,
}

/// Runs the dump command.
pub fn run(
    path: &Path,
    limit: Option<usize>,
    skip_crc: bool,
    format: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let records = read_records(path, limit, skip_crc)?;

    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&records)?);
        }
        _ => {
            print_text_output(&records);
        }
    }

    Ok(())
}

/// Reads up to `limit` records from `path`.
pub fn read_records(
    path: &Path,
    limit: Option<usize>,
    skip_crc: bool,
) -> Result<Vec<RecordInfo>, Box<dyn std::error::Error>> {
    let source = FileSource::open(path)?;
    let config = ReaderConfig::new().verify_checksums(!skip_crc);
    let mut reader = RecordReader::with_config(source, config);
    let max_records = limit.unwrap_or(usize::MAX);
    let mut records = Vec::new();

    while records.len() < max_records {
        let Some(data) = reader.read()?.into_record() else {
            break;
        };
        let entity = decode_entity(&data).ok();
        records.push(RecordInfo {
            index: records.len(),
            end_offset: reader.tell(),
            size: data.len(),
            key: entity
                .as_ref()
                .and_then(|entity| entity.key.as_ref())
                .map(ToString::to_string),
            properties: entity
                .and_then(|entity| entity.fields().ok())
                .map(|fields| fields.len()),
        });
    }

    Ok(records)
}

fn print_text_output(records: &[RecordInfo]) {
    println!("{:>6}  {:>12}  {:>8}  KEY", "INDEX", "END OFFSET", "SIZE");
    for record in records {
        println!(
            "{:>6}  {:>12}  {:>8}  {}",
            record.index,
            record.end_offset,
            record.size,
            record.key.as_deref().unwrap_or("-")
        );
    }
    println!();
    println!("Total records: {}", records.len());
}

#[cfg(test)]
mod tests {
    use super::*;
    use fsjson_codec::{encode_entity, Entity, Key, PathElement, Property, PropertyValue};
    use fsjson_core::{LogWriter, HEADER_SIZE};
    use tempfile::tempdir;

    #[test]
    fn dumps_records_with_keys() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("log");

        let key = Key::new("app", vec![PathElement::with_name("User", "ann")]);
        let mut writer = LogWriter::new(Vec::new());
        writer.add_record(&encode_entity(&Entity::new(key))).unwrap();
        writer.add_record(&[0xFF]).unwrap();
        writer.add_record(b"third").unwrap();
        std::fs::write(&path, writer.into_inner()).unwrap();

        let records = read_records(&path, None, false).unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].key.as_deref(), Some("User:ann"));
        assert_eq!(records[0].properties, Some(0));
        assert!(records[1].key.is_none());
        assert_eq!(records[2].size, 5);

        let limited = read_records(&path, Some(1), false).unwrap();
        assert_eq!(limited.len(), 1);
        assert_eq!(limited[0].end_offset, (HEADER_SIZE + records[0].size) as u64);
    }

    #[test]
    fn multi_valued_property_counts_once() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("log");

        let key = Key::new("app", vec![PathElement::with_id("Post", 1)]);
        let entity = Entity::new(key)
            .with_property(Property::new("title", PropertyValue::String(b"hi".to_vec())))
            .with_property(Property::new("tags", PropertyValue::String(b"a".to_vec())).multiple())
            .with_property(Property::new("tags", PropertyValue::String(b"b".to_vec())).multiple())
            .with_property(Property::new("tags", PropertyValue::String(b"c".to_vec())).multiple());
        let mut writer = LogWriter::new(Vec::new());
        writer.add_record(&encode_entity(&entity)).unwrap();
        std::fs::write(&path, writer.into_inner()).unwrap();

        let records = read_records(&path, None, false).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].properties, Some(2));
    }
}
