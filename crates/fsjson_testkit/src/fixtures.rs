//! Log and entity fixtures.
//!
//! [`LogBuilder`] assembles byte streams from whole records, single
//! fragments and raw bytes; the corruption helpers then damage them at
//! known offsets.

use fsjson_codec::{encode_entity, Entity, Key, Meaning, PathElement, Property, PropertyValue};
use fsjson_core::{
    mask, FragmentHeader, FragmentType, LogWriter, ReaderConfig, RecordReader, StatsSnapshot,
    BLOCK_SIZE, HEADER_SIZE,
};
use fsjson_storage::InMemorySource;
use std::path::{Path, PathBuf};

/// Builds a log byte stream.
#[derive(Debug, Default, Clone)]
pub struct LogBuilder {
    bytes: Vec<u8>,
}

impl LogBuilder {
    /// Creates an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    fn writer(&mut self) -> LogWriter<Vec<u8>> {
        let offset = self.bytes.len() as u64;
        LogWriter::with_block_offset(std::mem::take(&mut self.bytes), offset)
    }

    /// Appends a logical record, fragmenting as needed.
    pub fn record(mut self, data: &[u8]) -> Self {
        let mut writer = self.writer();
        writer
            .add_record(data)
            .expect("writing to a Vec cannot fail");
        self.bytes = writer.into_inner();
        self
    }

    /// Appends several records.
    pub fn records<I, R>(self, records: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: AsRef<[u8]>,
    {
        records
            .into_iter()
            .fold(self, |builder, record| builder.record(record.as_ref()))
    }

    /// Appends one fragment with a valid checksum at the current offset.
    ///
    /// # Panics
    ///
    /// Panics if the fragment does not fit in the current block.
    pub fn fragment(mut self, fragment_type: FragmentType, payload: &[u8]) -> Self {
        let mut writer = self.writer();
        writer
            .write_fragment(fragment_type, payload)
            .expect("fragment must fit in the current block");
        self.bytes = writer.into_inner();
        self
    }

    /// Appends a header with arbitrary fields followed by `payload`.
    ///
    /// The checksum is computed over the given type byte and payload.
    pub fn raw_fragment(mut self, type_byte: u8, length: u16, payload: &[u8]) -> Self {
        let header = FragmentHeader {
            masked_crc: mask(fsjson_core::fragment_checksum(type_byte, payload)),
            length,
            type_byte,
        };
        self.bytes.extend_from_slice(&header.encode());
        self.bytes.extend_from_slice(payload);
        self
    }

    /// Appends raw bytes.
    pub fn raw(mut self, bytes: &[u8]) -> Self {
        self.bytes.extend_from_slice(bytes);
        self
    }

    /// Appends `n` zero bytes.
    pub fn zeros(mut self, n: usize) -> Self {
        self.bytes.resize(self.bytes.len() + n, 0);
        self
    }

    /// Zero-fills up to the next block boundary.
    pub fn pad_block(self) -> Self {
        let rem = self.bytes.len() % BLOCK_SIZE;
        if rem == 0 {
            self
        } else {
            self.zeros(BLOCK_SIZE - rem)
        }
    }

    /// Current length of the stream.
    pub fn offset(&self) -> usize {
        self.bytes.len()
    }

    /// Returns the stream.
    pub fn build(self) -> Vec<u8> {
        self.bytes
    }
}

/// Flips one bit of the byte at `offset`.
pub fn flip_bit(bytes: &mut [u8], offset: usize, bit: u8) {
    bytes[offset] ^= 1 << (bit % 8);
}

/// Damages the first payload byte of the fragment whose header is at `header_offset`.
pub fn corrupt_payload(bytes: &mut [u8], header_offset: usize) {
    flip_bit(bytes, header_offset + HEADER_SIZE, 0);
}

/// Damages the stored checksum of the fragment at `header_offset`.
pub fn corrupt_checksum(bytes: &mut [u8], header_offset: usize) {
    flip_bit(bytes, header_offset, 3);
}

/// Overwrites the length field of the fragment at `header_offset`.
pub fn set_length(bytes: &mut [u8], header_offset: usize, length: u16) {
    bytes[header_offset + 4..header_offset + 6].copy_from_slice(&length.to_le_bytes());
}

/// Overwrites the type byte of the fragment at `header_offset`.
pub fn set_type(bytes: &mut [u8], header_offset: usize, type_byte: u8) {
    bytes[header_offset + 6] = type_byte;
}

/// Result of reading a whole stream.
#[derive(Debug, Clone)]
pub struct ReadResult {
    /// Records in stream order.
    pub records: Vec<Vec<u8>>,
    /// Reader counters at end of stream.
    pub stats: StatsSnapshot,
    /// Final cursor position.
    pub end_offset: u64,
}

/// Reads every record from `bytes`.
pub fn read_all(bytes: Vec<u8>, config: ReaderConfig) -> ReadResult {
    let mut reader = RecordReader::with_config(InMemorySource::new(bytes), config);
    let records = reader
        .by_ref()
        .collect::<Result<Vec<_>, _>>()
        .expect("in-memory sources do not fail");
    ReadResult {
        records,
        stats: reader.stats().snapshot(),
        end_offset: reader.tell(),
    }
}

/// Reads every record with checksum verification enabled.
pub fn read_verified(bytes: Vec<u8>) -> ReadResult {
    read_all(bytes, ReaderConfig::default())
}

/// Creates a key from `(kind, id)` pairs.
pub fn key_with_ids(path: &[(&str, i64)]) -> Key {
    Key::new(
        "s~fixture",
        path.iter()
            .map(|(kind, id)| PathElement::with_id(*kind, *id))
            .collect(),
    )
}

/// A `User` entity named `name` with a few typed properties.
pub fn user_entity(name: &str, age: i64) -> Entity {
    let key = Key::new("s~fixture", vec![PathElement::with_name("User", name)]);
    Entity::new(key)
        .with_property(Property::new("name", PropertyValue::String(name.as_bytes().to_vec())))
        .with_property(Property::new("age", PropertyValue::Int64(age)))
        .with_property(
            Property::new("joined", PropertyValue::Int64(1_577_836_800_000_000))
                .meaning(Meaning::GdWhen),
        )
}

/// An `Order` entity under `User:<user>`.
pub fn order_entity(user: &str, id: i64, total: f64) -> Entity {
    let key = Key::new(
        "s~fixture",
        vec![
            PathElement::with_name("User", user),
            PathElement::with_id("Order", id),
        ],
    );
    Entity::new(key).with_property(Property::new("total", PropertyValue::Double(total)))
}

/// Encodes entities as a log stream, one record each.
pub fn entity_log(entities: &[Entity]) -> Vec<u8> {
    LogBuilder::new()
        .records(entities.iter().map(encode_entity))
        .build()
}

/// Writes `bytes` to `dir/name` and returns the path.
pub fn write_log_file(dir: &Path, name: &str, bytes: &[u8]) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, bytes).expect("failed to write log file");
    path
}
