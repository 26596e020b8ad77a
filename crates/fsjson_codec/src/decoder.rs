//! `EntityProto` decoder.
//!
//! Field numbers follow the datastore v3 schema. Unknown fields are
//! skipped, groups included.

use crate::entity::{
    Entity, IdOrName, Key, Meaning, PathElement, Property, PropertyValue, UserValue,
};
use crate::error::{CodecError, CodecResult};
use crate::wire::{WireReader, WireType};

// EntityProto
const ENTITY_KEY: u32 = 13;
const ENTITY_PROPERTY: u32 = 14;
const ENTITY_RAW_PROPERTY: u32 = 15;

// Reference
const REFERENCE_APP: u32 = 13;
const REFERENCE_PATH: u32 = 14;
const REFERENCE_NAMESPACE: u32 = 20;

// Path
const PATH_ELEMENT: u32 = 1;
const PATH_ELEMENT_TYPE: u32 = 2;
const PATH_ELEMENT_ID: u32 = 3;
const PATH_ELEMENT_NAME: u32 = 4;

// Property
const PROPERTY_MEANING: u32 = 1;
const PROPERTY_NAME: u32 = 3;
const PROPERTY_MULTIPLE: u32 = 4;
const PROPERTY_VALUE: u32 = 5;

// PropertyValue
const VALUE_INT64: u32 = 1;
const VALUE_BOOLEAN: u32 = 2;
const VALUE_STRING: u32 = 3;
const VALUE_DOUBLE: u32 = 4;
const VALUE_POINT: u32 = 5;
const VALUE_POINT_X: u32 = 6;
const VALUE_POINT_Y: u32 = 7;
const VALUE_USER: u32 = 8;
const VALUE_USER_EMAIL: u32 = 9;
const VALUE_USER_AUTH_DOMAIN: u32 = 10;
const VALUE_USER_NICKNAME: u32 = 11;
const VALUE_REFERENCE: u32 = 12;
const VALUE_REFERENCE_APP: u32 = 13;
const VALUE_REFERENCE_PATH_ELEMENT: u32 = 14;
const VALUE_REFERENCE_TYPE: u32 = 15;
const VALUE_REFERENCE_ID: u32 = 16;
const VALUE_REFERENCE_NAME: u32 = 17;
const VALUE_REFERENCE_NAMESPACE: u32 = 20;

/// Decode an entity from `EntityProto` bytes.
///
/// # Errors
///
/// Returns an error if the bytes are not a well-formed message or a
/// property lacks its name.
pub fn decode_entity(bytes: &[u8]) -> CodecResult<Entity> {
    let mut reader = WireReader::new(bytes);
    let mut entity = Entity::default();

    while let Some((field, wire_type)) = reader.read_tag()? {
        match (field, wire_type) {
            (ENTITY_KEY, WireType::LengthDelimited) => {
                entity.key = Some(decode_key(reader.read_length_delimited()?)?);
            }
            (ENTITY_PROPERTY, WireType::LengthDelimited) => {
                let property = decode_property(reader.read_length_delimited()?, true)?;
                entity.properties.push(property);
            }
            (ENTITY_RAW_PROPERTY, WireType::LengthDelimited) => {
                let property = decode_property(reader.read_length_delimited()?, false)?;
                entity.properties.push(property);
            }
            (field, wire_type) => reader.skip(field, wire_type)?,
        }
    }

    Ok(entity)
}

/// Decode a `Reference` message into a key.
///
/// # Errors
///
/// Returns an error if the message is malformed.
pub fn decode_key(bytes: &[u8]) -> CodecResult<Key> {
    let mut reader = WireReader::new(bytes);
    let mut key = Key::default();

    while let Some((field, wire_type)) = reader.read_tag()? {
        match (field, wire_type) {
            (REFERENCE_APP, WireType::LengthDelimited) => key.app = reader.read_string()?,
            (REFERENCE_NAMESPACE, WireType::LengthDelimited) => {
                key.namespace = Some(reader.read_string()?);
            }
            (REFERENCE_PATH, WireType::LengthDelimited) => {
                key.path = decode_path(reader.read_length_delimited()?)?;
            }
            (field, wire_type) => reader.skip(field, wire_type)?,
        }
    }

    Ok(key)
}

fn decode_path(bytes: &[u8]) -> CodecResult<Vec<PathElement>> {
    let mut reader = WireReader::new(bytes);
    let mut path = Vec::new();

    while let Some((field, wire_type)) = reader.read_tag()? {
        match (field, wire_type) {
            (PATH_ELEMENT, WireType::StartGroup) => {
                path.push(decode_path_element(
                    &mut reader,
                    PATH_ELEMENT,
                    [PATH_ELEMENT_TYPE, PATH_ELEMENT_ID, PATH_ELEMENT_NAME],
                )?);
            }
            (field, wire_type) => reader.skip(field, wire_type)?,
        }
    }

    Ok(path)
}

/// Reads a path element group. The type, id and name field numbers differ
/// between `Path` and the reference form inside `PropertyValue`.
fn decode_path_element(
    reader: &mut WireReader<'_>,
    group: u32,
    [type_field, id_field, name_field]: [u32; 3],
) -> CodecResult<PathElement> {
    let mut kind = None;
    let mut id_or_name = IdOrName::Incomplete;

    while let Some((field, wire_type)) = reader.read_group_tag(group)? {
        match wire_type {
            WireType::LengthDelimited if field == type_field => {
                kind = Some(reader.read_string()?);
            }
            WireType::Varint if field == id_field => {
                id_or_name = IdOrName::Id(reader.read_varint()? as i64);
            }
            WireType::LengthDelimited if field == name_field => {
                id_or_name = IdOrName::Name(reader.read_string()?);
            }
            _ => reader.skip(field, wire_type)?,
        }
    }

    Ok(PathElement {
        kind: kind.ok_or(CodecError::missing_field("path element type"))?,
        id_or_name,
    })
}

fn decode_property(bytes: &[u8], indexed: bool) -> CodecResult<Property> {
    let mut reader = WireReader::new(bytes);
    let mut name = None;
    let mut meaning = None;
    let mut multiple = false;
    let mut value = PropertyValue::Null;

    while let Some((field, wire_type)) = reader.read_tag()? {
        match (field, wire_type) {
            (PROPERTY_MEANING, WireType::Varint) => {
                meaning = Some(Meaning::from_i32(reader.read_varint()? as i32));
            }
            (PROPERTY_NAME, WireType::LengthDelimited) => name = Some(reader.read_string()?),
            (PROPERTY_MULTIPLE, WireType::Varint) => multiple = reader.read_varint()? != 0,
            (PROPERTY_VALUE, WireType::LengthDelimited) => {
                value = decode_property_value(reader.read_length_delimited()?)?;
            }
            (field, wire_type) => reader.skip(field, wire_type)?,
        }
    }

    Ok(Property {
        name: name.ok_or(CodecError::missing_field("property name"))?,
        meaning,
        multiple,
        value,
        indexed,
    })
}

fn decode_property_value(bytes: &[u8]) -> CodecResult<PropertyValue> {
    let mut reader = WireReader::new(bytes);
    let mut value = PropertyValue::Null;

    while let Some((field, wire_type)) = reader.read_tag()? {
        value = match (field, wire_type) {
            (VALUE_INT64, WireType::Varint) => PropertyValue::Int64(reader.read_varint()? as i64),
            (VALUE_BOOLEAN, WireType::Varint) => PropertyValue::Bool(reader.read_varint()? != 0),
            (VALUE_STRING, WireType::LengthDelimited) => {
                PropertyValue::String(reader.read_length_delimited()?.to_vec())
            }
            (VALUE_DOUBLE, WireType::Fixed64) => PropertyValue::Double(reader.read_double()?),
            (VALUE_POINT, WireType::StartGroup) => decode_point(&mut reader)?,
            (VALUE_USER, WireType::StartGroup) => PropertyValue::User(decode_user(&mut reader)?),
            (VALUE_REFERENCE, WireType::StartGroup) => {
                PropertyValue::Reference(decode_reference_value(&mut reader)?)
            }
            (field, wire_type) => {
                reader.skip(field, wire_type)?;
                continue;
            }
        };
    }

    Ok(value)
}

fn decode_point(reader: &mut WireReader<'_>) -> CodecResult<PropertyValue> {
    let mut x = None;
    let mut y = None;
    while let Some((field, wire_type)) = reader.read_group_tag(VALUE_POINT)? {
        match (field, wire_type) {
            (VALUE_POINT_X, WireType::Fixed64) => x = Some(reader.read_double()?),
            (VALUE_POINT_Y, WireType::Fixed64) => y = Some(reader.read_double()?),
            (field, wire_type) => reader.skip(field, wire_type)?,
        }
    }
    Ok(PropertyValue::Point {
        x: x.ok_or(CodecError::missing_field("point x"))?,
        y: y.ok_or(CodecError::missing_field("point y"))?,
    })
}

fn decode_user(reader: &mut WireReader<'_>) -> CodecResult<UserValue> {
    let mut user = UserValue::default();
    while let Some((field, wire_type)) = reader.read_group_tag(VALUE_USER)? {
        match (field, wire_type) {
            (VALUE_USER_EMAIL, WireType::LengthDelimited) => user.email = reader.read_string()?,
            (VALUE_USER_AUTH_DOMAIN, WireType::LengthDelimited) => {
                user.auth_domain = reader.read_string()?;
            }
            (VALUE_USER_NICKNAME, WireType::LengthDelimited) => {
                user.nickname = Some(reader.read_string()?);
            }
            (field, wire_type) => reader.skip(field, wire_type)?,
        }
    }
    Ok(user)
}

fn decode_reference_value(reader: &mut WireReader<'_>) -> CodecResult<Key> {
    let mut key = Key::default();
    while let Some((field, wire_type)) = reader.read_group_tag(VALUE_REFERENCE)? {
        match (field, wire_type) {
            (VALUE_REFERENCE_APP, WireType::LengthDelimited) => key.app = reader.read_string()?,
            (VALUE_REFERENCE_NAMESPACE, WireType::LengthDelimited) => {
                key.namespace = Some(reader.read_string()?);
            }
            (VALUE_REFERENCE_PATH_ELEMENT, WireType::StartGroup) => {
                key.path.push(decode_path_element(
                    reader,
                    VALUE_REFERENCE_PATH_ELEMENT,
                    [VALUE_REFERENCE_TYPE, VALUE_REFERENCE_ID, VALUE_REFERENCE_NAME],
                )?);
            }
            (field, wire_type) => reader.skip(field, wire_type)?,
        }
    }
    Ok(key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::WireWriter;

    #[test]
    fn empty_message_is_empty_entity() {
        let entity = decode_entity(&[]).unwrap();
        assert!(entity.key.is_none());
        assert!(entity.properties.is_empty());
    }

    #[test]
    fn decodes_hand_built_key() {
        let mut path = WireWriter::new();
        path.start_group(1);
        path.write_string(2, "User");
        path.write_string(4, "alice");
        path.end_group(1);

        let mut reference = WireWriter::new();
        reference.write_string(13, "s~app");
        reference.write_bytes(14, &path.into_bytes());

        let mut entity = WireWriter::new();
        entity.write_bytes(13, &reference.into_bytes());
        // entity_group, skipped
        entity.write_bytes(16, &[]);

        let decoded = decode_entity(&entity.into_bytes()).unwrap();
        let key = decoded.key.unwrap();
        assert_eq!(key.app, "s~app");
        assert_eq!(key.path, vec![PathElement::with_name("User", "alice")]);
    }

    #[test]
    fn property_without_name_is_rejected() {
        let mut property = WireWriter::new();
        property.write_bytes(5, &[]);

        let mut entity = WireWriter::new();
        entity.write_bytes(14, &property.into_bytes());

        assert_eq!(
            decode_entity(&entity.into_bytes()),
            Err(CodecError::missing_field("property name"))
        );
    }

    #[test]
    fn unknown_fields_are_skipped() {
        let mut value = WireWriter::new();
        value.start_group(30);
        value.write_int64(31, 1);
        value.end_group(30);
        value.write_int64(1, 99);

        let mut property = WireWriter::new();
        property.write_string(3, "n");
        property.write_bytes(5, &value.into_bytes());
        property.write_string(99, "ignored");

        let mut entity = WireWriter::new();
        entity.write_bytes(14, &property.into_bytes());

        let decoded = decode_entity(&entity.into_bytes()).unwrap();
        assert_eq!(decoded.properties[0].value, PropertyValue::Int64(99));
    }

    #[test]
    fn garbage_is_an_error() {
        assert!(decode_entity(b"\xff\xff\xff").is_err());
    }
}
