//! End-to-end export of log files to JSON documents.

use fsjson_codec::{encode_entity, Entity, Key, Meaning, PathElement, Property, PropertyValue};
use fsjson_core::{export_file, ExportOptions, BLOCK_SIZE};
use fsjson_testkit::prelude::*;
use serde_json::json;

#[test]
fn entities_nest_by_ancestry() {
    let harness = ExportHarness::new();
    harness.add_entities(
        "output-0",
        &[
            user_entity("ann", 30),
            order_entity("ann", 1, 9.5),
            order_entity("ann", 2, 20.0),
            user_entity("bob", 25),
        ],
    );

    let (report, doc) = harness.export("output-0");
    assert!(report.is_clean());
    assert_eq!(report.records, 4);
    assert_eq!(report.entities, 4);

    assert_eq!(doc["User"]["ann"]["name"], json!("ann"));
    assert_eq!(doc["User"]["ann"]["joined"], json!(1_577_836_800_000_i64));
    assert_eq!(doc["User"]["ann"]["Order"]["1"]["total"], json!(9.5));
    assert_eq!(doc["User"]["ann"]["Order"]["2"]["total"], json!(20.0));
    assert_eq!(doc["User"]["bob"]["age"], json!(25));
}

#[test]
fn later_writes_merge_into_earlier() {
    let key = key_with_ids(&[("Counter", 1)]);
    let first = Entity::new(key.clone())
        .with_property(Property::new("a", PropertyValue::Int64(1)))
        .with_property(Property::new("b", PropertyValue::Int64(1)));
    let second = Entity::new(key).with_property(Property::new("b", PropertyValue::Int64(2)));

    let (report, doc) = export_bytes(entity_log(&[first, second]), &ExportOptions::default());
    assert_eq!(report.entities, 2);
    assert_eq!(doc, json!({"Counter": {"1": {"a": 1, "b": 2}}}));
}

#[test]
fn typed_values_map_to_json() {
    let key = Key::new("s~app", vec![PathElement::with_name("Place", "home")]);
    let entity = Entity::new(key.clone())
        .with_property(Property::new("flag", PropertyValue::Bool(true)))
        .with_property(Property::new("nothing", PropertyValue::Null))
        .with_property(
            Property::new("at", PropertyValue::Point { x: 1.5, y: -2.0 })
                .meaning(Meaning::GeoRssPoint),
        )
        .with_property(Property::new(
            "owner",
            PropertyValue::Reference(key_with_ids(&[("User", 7), ("Device", 3)])),
        ))
        .with_property(Property::new("tags", PropertyValue::String(b"x".to_vec())).multiple())
        .with_property(Property::new("tags", PropertyValue::String(b"y".to_vec())).multiple());

    let (report, doc) = export_bytes(entity_log(&[entity]), &ExportOptions::default());
    assert!(report.is_clean());
    let place = &doc["Place"]["home"];
    assert_eq!(place["flag"], json!(true));
    assert_eq!(place["nothing"], json!(null));
    assert_eq!(place["at"], json!("1.5,-2.0"));
    assert_eq!(place["owner"], json!("User:7/Device:3"));
    assert_eq!(place["tags"], json!(["x", "y"]));
}

#[test]
fn undecodable_records_are_counted() {
    let bytes = LogBuilder::new()
        .record(&encode_entity(&user_entity("ann", 1)))
        .record(&[0xff, 0xff, 0xff])
        .record(&encode_entity(&user_entity("bob", 2)))
        .build();

    let (report, doc) = export_bytes(bytes, &ExportOptions::default());
    assert_eq!(report.records, 3);
    assert_eq!(report.entities, 2);
    assert_eq!(report.decode_failures, 1);
    assert!(!report.is_clean());
    assert_eq!(doc["User"].as_object().unwrap().len(), 2);
}

#[test]
fn corrupt_block_loses_only_its_entities() {
    let mut bytes = LogBuilder::new()
        .record(&encode_entity(&user_entity("lost", 1)))
        .pad_block()
        .record(&encode_entity(&user_entity("kept", 2)))
        .build();
    corrupt_payload(&mut bytes, 0);

    let harness = ExportHarness::new();
    harness.add_log("output-1", &bytes);
    let (report, doc) = harness.export("output-1");

    assert_eq!(report.entities, 1);
    assert_eq!(report.reader.checksum_failures, 1);
    assert!(doc["User"].get("lost").is_none());
    assert_eq!(doc["User"]["kept"]["age"], json!(2));
}

#[test]
fn large_entity_spans_blocks() {
    let key = key_with_ids(&[("Blob", 1)]);
    let entity = Entity::new(key).with_property(
        Property::new("data", PropertyValue::String(vec![b'z'; 3 * BLOCK_SIZE]))
            .meaning(Meaning::Text)
            .unindexed(),
    );

    let (report, doc) = export_bytes(entity_log(&[entity]), &ExportOptions::default());
    assert!(report.is_clean());
    assert!(report.reader.fragments > 1);
    assert_eq!(
        doc["Blob"]["1"]["data"].as_str().map(str::len),
        Some(3 * BLOCK_SIZE)
    );
}

#[test]
fn file_export_matches_memory_export() {
    let harness = ExportHarness::new();
    harness.add_entities(
        "output-2",
        &[user_entity("ann", 1), order_entity("ann", 4, 1.25)],
    );
    assert_file_matches_memory(&harness, "output-2");
}

#[test]
fn missing_input_is_an_error() {
    let harness = ExportHarness::new();
    let result = export_file(
        &harness.input_dir().join("absent"),
        harness.output_dir(),
        &ExportOptions::default(),
    );
    assert!(result.is_err());
}

#[test]
fn empty_log_exports_empty_object() {
    let harness = ExportHarness::new();
    harness.add_log("output-3", &[]);
    let (report, doc) = harness.export("output-3");
    assert_eq!(report.records, 0);
    assert_eq!(doc, json!({}));
}
