//! # fsjson Codec
//!
//! Decoding of datastore entities stored as `EntityProto` protobuf
//! messages.
//!
//! The crate is split into three layers:
//! - [`WireReader`] / [`WireWriter`]: protobuf wire format primitives
//! - [`decode_entity`] / [`encode_entity`]: the entity schema
//! - [`Value`]: property values with their meanings applied
//!
//! ## Usage
//!
//! ```
//! use fsjson_codec::{decode_entity, encode_entity, Entity, Key, PathElement, Property, PropertyValue, Value};
//!
//! let key = Key::new("app", vec![PathElement::with_name("User", "alice")]);
//! let entity = Entity::new(key).with_property(Property::new("age", PropertyValue::Int64(30)));
//!
//! let decoded = decode_entity(&encode_entity(&entity)).unwrap();
//! assert_eq!(decoded.fields().unwrap(), vec![("age".to_string(), Value::Integer(30))]);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod decoder;
mod encoder;
mod entity;
mod error;
mod value;
mod wire;

pub use decoder::{decode_entity, decode_key};
pub use encoder::{encode_entity, encode_key};
pub use entity::{Entity, IdOrName, Key, Meaning, PathElement, Property, PropertyValue, UserValue};
pub use error::{CodecError, CodecResult};
pub use value::Value;
pub use wire::{WireReader, WireType, WireWriter};
