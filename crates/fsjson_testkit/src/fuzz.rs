//! Fuzz testing harnesses for fsjson.
//!
//! These functions can be used as cargo-fuzz targets or driven by
//! proptest. Each one asserts the invariants that must hold for any input.

use fsjson_codec::decode_entity;
use fsjson_core::{export_source, ExportOptions, ReadOutcome, ReaderConfig, RecordReader};
use fsjson_storage::InMemorySource;

/// Fuzz target for the record reader.
///
/// Arbitrary input must never panic and must terminate with the whole
/// input consumed. Emitted records never hold more bytes than the input.
pub fn fuzz_record_reader(data: &[u8]) {
    for verify in [true, false] {
        let config = ReaderConfig::new().verify_checksums(verify);
        let mut reader = RecordReader::with_config(InMemorySource::new(data.to_vec()), config);
        let mut total = 0usize;

        while let ReadOutcome::Record(record) =
            reader.read().expect("in-memory sources do not fail")
        {
            total += record.len();
        }

        assert!(total <= data.len(), "records cannot hold more bytes than the input");
        assert_eq!(reader.tell(), data.len() as u64, "end of stream before end of input");
        assert!(!reader.is_assembling());
    }
}

/// Fuzz target for entity decoding.
///
/// Arbitrary bytes either decode or return an error.
pub fn fuzz_entity_decode(data: &[u8]) {
    if let Ok(entity) = decode_entity(data) {
        let _ = entity.fields();
    }
}

/// Fuzz target for the full export path.
pub fn fuzz_export(data: &[u8]) {
    let (tree, report) = export_source(InMemorySource::new(data.to_vec()), &ExportOptions::default())
        .expect("in-memory sources do not fail");
    assert_eq!(report.entities, tree.entity_count());
    assert_eq!(report.records, report.entities + report.decode_failures);
}
