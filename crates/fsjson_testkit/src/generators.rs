//! Property-based test generators using proptest.
//!
//! Provides strategies for generating random records, entities and
//! corruption plans.

use fsjson_codec::{Entity, Key, Meaning, PathElement, Property, PropertyValue};
use fsjson_core::BLOCK_SIZE;
use proptest::prelude::*;

/// Strategy for record payloads, biased toward sizes near block boundaries.
pub fn record_strategy() -> impl Strategy<Value = Vec<u8>> {
    prop_oneof![
        4 => prop::collection::vec(any::<u8>(), 0..256),
        2 => prop::collection::vec(any::<u8>(), BLOCK_SIZE - 16..BLOCK_SIZE + 16),
        1 => prop::collection::vec(any::<u8>(), 2 * BLOCK_SIZE..3 * BLOCK_SIZE),
    ]
}

/// Strategy for a sequence of records.
pub fn records_strategy(max: usize) -> impl Strategy<Value = Vec<Vec<u8>>> {
    prop::collection::vec(record_strategy(), 0..max)
}

/// Strategy for entity kinds.
pub fn kind_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[A-Z][a-zA-Z]{0,11}").expect("Invalid regex")
}

/// Strategy for key path elements.
pub fn path_element_strategy() -> impl Strategy<Value = PathElement> {
    prop_oneof![
        (kind_strategy(), 1i64..i64::MAX).prop_map(|(kind, id)| PathElement::with_id(kind, id)),
        (
            kind_strategy(),
            prop::string::string_regex("[a-z0-9_-]{1,16}").expect("Invalid regex"),
        )
            .prop_map(|(kind, name)| PathElement::with_name(kind, name)),
    ]
}

/// Strategy for keys with up to three ancestors.
pub fn key_strategy() -> impl Strategy<Value = Key> {
    prop::collection::vec(path_element_strategy(), 1..4)
        .prop_map(|path| Key::new("s~generated", path))
}

/// Strategy for single-valued properties with JSON-friendly values.
pub fn property_strategy() -> impl Strategy<Value = Property> {
    let name = prop::string::string_regex("[a-z][a-z_]{0,11}").expect("Invalid regex");
    let value = prop_oneof![
        any::<i64>().prop_map(|n| (PropertyValue::Int64(n), None)),
        any::<bool>().prop_map(|b| (PropertyValue::Bool(b), None)),
        (-1e12f64..1e12f64).prop_map(|d| (PropertyValue::Double(d), None)),
        "[ -~]{0,32}".prop_map(|s| (PropertyValue::String(s.into_bytes()), None)),
        (0i64..4_102_444_800_000_000)
            .prop_map(|t| (PropertyValue::Int64(t), Some(Meaning::GdWhen))),
    ];
    (name, value).prop_map(|(name, (value, meaning))| {
        let mut property = Property::new(name, value);
        property.meaning = meaning;
        property
    })
}

/// Strategy for keyed entities.
pub fn entity_strategy() -> impl Strategy<Value = Entity> {
    (key_strategy(), prop::collection::vec(property_strategy(), 0..8)).prop_map(
        |(key, properties)| Entity {
            key: Some(key),
            properties,
        },
    )
}

/// How to damage a stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Corruption {
    /// Flip one bit at the given position (taken modulo the stream length).
    FlipBit {
        /// Byte position.
        position: usize,
        /// Bit index.
        bit: u8,
    },
    /// Overwrite a run of bytes with a fixed value.
    Smear {
        /// Start position (taken modulo the stream length).
        position: usize,
        /// Run length.
        len: usize,
        /// Fill byte.
        fill: u8,
    },
}

impl Corruption {
    /// Applies the corruption in place. Empty streams are left alone.
    pub fn apply(&self, bytes: &mut [u8]) {
        if bytes.is_empty() {
            return;
        }
        match *self {
            Self::FlipBit { position, bit } => {
                bytes[position % bytes.len()] ^= 1 << (bit % 8);
            }
            Self::Smear {
                position,
                len,
                fill,
            } => {
                let start = position % bytes.len();
                let end = (start + len).min(bytes.len());
                bytes[start..end].fill(fill);
            }
        }
    }
}

/// Strategy for corruption plans.
pub fn corruption_strategy() -> impl Strategy<Value = Corruption> {
    prop_oneof![
        (any::<usize>(), any::<u8>()).prop_map(|(position, bit)| Corruption::FlipBit { position, bit }),
        (any::<usize>(), 1usize..64, any::<u8>())
            .prop_map(|(position, len, fill)| Corruption::Smear { position, len, fill }),
    ]
}
