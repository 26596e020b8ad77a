//! Typed property values.
//!
//! Applies property meanings to raw wire values: timestamps, blobs,
//! embedded entities and list properties.

use crate::decoder::decode_entity;
use crate::entity::{Entity, Key, Meaning, Property, PropertyValue};
use crate::error::{CodecError, CodecResult};

/// Maximum nesting of embedded entities.
const MAX_EMBEDDING_DEPTH: usize = 32;

/// An interpreted property value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Null value.
    Null,
    /// Boolean value.
    Boolean(bool),
    /// Signed integer.
    Integer(i64),
    /// Double.
    Double(f64),
    /// UTF-8 text.
    Text(String),
    /// Binary data.
    Bytes(Vec<u8>),
    /// Microseconds since the Unix epoch, UTC.
    Timestamp(i64),
    /// Geographic point.
    GeoPoint {
        /// Latitude.
        lat: f64,
        /// Longitude.
        lon: f64,
    },
    /// User, identified by email.
    User(String),
    /// Reference to another entity.
    Key(Key),
    /// Embedded entity fields.
    Entity(Vec<(String, Value)>),
    /// List property.
    List(Vec<Value>),
}

impl Property {
    /// Interprets the stored value using the property's meaning.
    ///
    /// # Errors
    ///
    /// Returns an error if an embedded entity cannot be decoded.
    pub fn to_value(&self) -> CodecResult<Value> {
        self.to_value_at(0)
    }

    fn to_value_at(&self, depth: usize) -> CodecResult<Value> {
        let value = match (&self.value, self.meaning) {
            (_, Some(Meaning::EmptyList)) => Value::List(Vec::new()),
            (PropertyValue::Null, _) => Value::Null,
            (PropertyValue::Int64(micros), Some(Meaning::GdWhen)) => Value::Timestamp(*micros),
            (PropertyValue::Int64(n), _) => Value::Integer(*n),
            (PropertyValue::Bool(b), _) => Value::Boolean(*b),
            (PropertyValue::Double(d), _) => Value::Double(*d),
            (PropertyValue::String(bytes), Some(Meaning::EntityProto)) => {
                if depth >= MAX_EMBEDDING_DEPTH {
                    return Err(CodecError::invalid_structure(
                        "embedded entities nested too deeply",
                    ));
                }
                Value::Entity(decode_entity(bytes)?.fields_at(depth + 1)?)
            }
            (PropertyValue::String(bytes), Some(Meaning::Blob | Meaning::ByteString)) => {
                Value::Bytes(bytes.clone())
            }
            (PropertyValue::String(bytes), Some(Meaning::Text)) => {
                Value::Text(String::from_utf8_lossy(bytes).into_owned())
            }
            (PropertyValue::String(bytes), _) => match String::from_utf8(bytes.clone()) {
                Ok(text) => Value::Text(text),
                Err(err) => Value::Bytes(err.into_bytes()),
            },
            (PropertyValue::Point { x, y }, _) => Value::GeoPoint { lat: *x, lon: *y },
            (PropertyValue::User(user), _) => Value::User(user.email.clone()),
            (PropertyValue::Reference(key), _) => Value::Key(key.clone()),
        };
        Ok(value)
    }
}

impl Entity {
    /// Returns the entity's fields in first-seen order.
    ///
    /// Properties flagged `multiple` are collected into one list per name;
    /// a repeated single-valued name keeps its last value.
    ///
    /// # Errors
    ///
    /// Returns an error if an embedded entity cannot be decoded.
    pub fn fields(&self) -> CodecResult<Vec<(String, Value)>> {
        self.fields_at(0)
    }

    fn fields_at(&self, depth: usize) -> CodecResult<Vec<(String, Value)>> {
        let mut fields: Vec<(String, Value)> = Vec::with_capacity(self.properties.len());

        for property in &self.properties {
            let value = property.to_value_at(depth)?;
            let slot = fields.iter_mut().find(|(name, _)| *name == property.name);

            match (slot, property.multiple) {
                (Some((_, Value::List(items))), true) => items.push(value),
                (Some((_, existing)), true) => *existing = Value::List(vec![value]),
                (Some((_, existing)), false) => *existing = value,
                (None, true) => fields.push((property.name.clone(), Value::List(vec![value]))),
                (None, false) => fields.push((property.name.clone(), value)),
            }
        }

        Ok(fields)
    }
}
