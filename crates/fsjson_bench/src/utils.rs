//! Benchmark utilities.

use fsjson_codec::{encode_entity, Entity, Key, Meaning, PathElement, Property, PropertyValue};
use fsjson_core::LogWriter;
use rand::Rng;

/// Generate random record data of the specified size.
pub fn random_data(size: usize) -> Vec<u8> {
    let mut rng = rand::thread_rng();
    (0..size).map(|_| rng.gen()).collect()
}

/// Generate `count` records with sizes drawn from `0..max_size`.
pub fn random_records(count: usize, max_size: usize) -> Vec<Vec<u8>> {
    let mut rng = rand::thread_rng();
    (0..count)
        .map(|_| random_data(rng.gen_range(0..max_size.max(1))))
        .collect()
}

/// Frame records into a log stream.
pub fn build_log<R: AsRef<[u8]>>(records: &[R]) -> Vec<u8> {
    let mut writer = LogWriter::new(Vec::new());
    for record in records {
        writer.add_record(record.as_ref()).unwrap();
    }
    writer.into_inner()
}

/// Generate an entity with a parent key and a mix of property types.
pub fn sample_entity(id: i64) -> Entity {
    let mut rng = rand::thread_rng();
    let key = Key::new(
        "s~bench",
        vec![
            PathElement::with_name("Account", format!("acct-{}", id % 16)),
            PathElement::with_id("Event", id),
        ],
    );
    Entity::new(key)
        .with_property(Property::new("count", PropertyValue::Int64(rng.gen())))
        .with_property(Property::new("score", PropertyValue::Double(rng.gen())))
        .with_property(Property::new("active", PropertyValue::Bool(rng.gen())))
        .with_property(Property::new(
            "label",
            PropertyValue::String(format!("event number {id}").into_bytes()),
        ))
        .with_property(
            Property::new("at", PropertyValue::Int64(1_600_000_000_000_000 + id))
                .meaning(Meaning::GdWhen),
        )
        .with_property(
            Property::new("body", PropertyValue::String(random_text(256)))
                .meaning(Meaning::Text)
                .unindexed(),
        )
}

/// Generate a log of `count` encoded entities.
pub fn entity_log(count: usize) -> Vec<u8> {
    let records: Vec<Vec<u8>> = (0..count as i64)
        .map(|id| encode_entity(&sample_entity(id + 1)))
        .collect();
    build_log(&records)
}

fn random_text(len: usize) -> Vec<u8> {
    let mut rng = rand::thread_rng();
    (0..len).map(|_| rng.gen_range(b'a'..=b'z')).collect()
}
