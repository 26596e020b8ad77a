//! `EntityProto` encoder.
//!
//! Writes the subset of the schema that [`crate::decode_entity`] reads.
//! Used to build fixtures and benchmark inputs.

use crate::entity::{Entity, IdOrName, Key, PathElement, Property, PropertyValue};
use crate::wire::WireWriter;

/// Encode an entity to `EntityProto` bytes.
pub fn encode_entity(entity: &Entity) -> Vec<u8> {
    let mut writer = WireWriter::new();
    if let Some(key) = &entity.key {
        writer.write_bytes(13, &encode_key(key));
    }
    for property in &entity.properties {
        let field = if property.indexed { 14 } else { 15 };
        writer.write_bytes(field, &encode_property(property));
    }
    writer.into_bytes()
}

/// Encode a key as a `Reference` message.
pub fn encode_key(key: &Key) -> Vec<u8> {
    let mut path = WireWriter::new();
    for element in &key.path {
        path.start_group(1);
        write_path_element(&mut path, element, [2, 3, 4]);
        path.end_group(1);
    }

    let mut writer = WireWriter::new();
    writer.write_string(13, &key.app);
    writer.write_bytes(14, &path.into_bytes());
    if let Some(namespace) = &key.namespace {
        writer.write_string(20, namespace);
    }
    writer.into_bytes()
}

fn write_path_element(writer: &mut WireWriter, element: &PathElement, fields: [u32; 3]) {
    writer.write_string(fields[0], &element.kind);
    match &element.id_or_name {
        IdOrName::Id(id) => writer.write_int64(fields[1], *id),
        IdOrName::Name(name) => writer.write_string(fields[2], name),
        IdOrName::Incomplete => {}
    }
}

fn encode_property(property: &Property) -> Vec<u8> {
    let mut writer = WireWriter::new();
    if let Some(meaning) = property.meaning {
        writer.write_int64(1, i64::from(meaning.as_i32()));
    }
    writer.write_string(3, &property.name);
    writer.write_bool(4, property.multiple);
    writer.write_bytes(5, &encode_value(&property.value));
    writer.into_bytes()
}

fn encode_value(value: &PropertyValue) -> Vec<u8> {
    let mut writer = WireWriter::new();
    match value {
        PropertyValue::Null => {}
        PropertyValue::Int64(n) => writer.write_int64(1, *n),
        PropertyValue::Bool(b) => writer.write_bool(2, *b),
        PropertyValue::String(bytes) => writer.write_bytes(3, bytes),
        PropertyValue::Double(d) => writer.write_double(4, *d),
        PropertyValue::Point { x, y } => {
            writer.start_group(5);
            writer.write_double(6, *x);
            writer.write_double(7, *y);
            writer.end_group(5);
        }
        PropertyValue::User(user) => {
            writer.start_group(8);
            writer.write_string(9, &user.email);
            writer.write_string(10, &user.auth_domain);
            if let Some(nickname) = &user.nickname {
                writer.write_string(11, nickname);
            }
            writer.end_group(8);
        }
        PropertyValue::Reference(key) => {
            writer.start_group(12);
            writer.write_string(13, &key.app);
            for element in &key.path {
                writer.start_group(14);
                write_path_element(&mut writer, element, [15, 16, 17]);
                writer.end_group(14);
            }
            if let Some(namespace) = &key.namespace {
                writer.write_string(20, namespace);
            }
            writer.end_group(12);
        }
    }
    writer.into_bytes()
}
