//! Protobuf wire format primitives.
//!
//! Only what the entity schema needs: varints, fixed 32/64-bit values,
//! length-delimited fields and proto2 groups.

use crate::error::{CodecError, CodecResult};

/// Protobuf wire type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireType {
    /// Base-128 varint.
    Varint,
    /// Little-endian 64-bit value.
    Fixed64,
    /// Length-prefixed bytes.
    LengthDelimited,
    /// Start of a proto2 group.
    StartGroup,
    /// End of a proto2 group.
    EndGroup,
    /// Little-endian 32-bit value.
    Fixed32,
}

impl WireType {
    /// Parses the low three bits of a tag.
    pub fn from_bits(bits: u8) -> CodecResult<Self> {
        match bits {
            0 => Ok(Self::Varint),
            1 => Ok(Self::Fixed64),
            2 => Ok(Self::LengthDelimited),
            3 => Ok(Self::StartGroup),
            4 => Ok(Self::EndGroup),
            5 => Ok(Self::Fixed32),
            wire_type => Err(CodecError::InvalidWireType { wire_type }),
        }
    }

    /// Returns the three-bit encoding.
    #[must_use]
    pub const fn bits(self) -> u8 {
        match self {
            Self::Varint => 0,
            Self::Fixed64 => 1,
            Self::LengthDelimited => 2,
            Self::StartGroup => 3,
            Self::EndGroup => 4,
            Self::Fixed32 => 5,
        }
    }
}

/// Maximum nesting of groups the reader will skip through.
const MAX_SKIP_DEPTH: usize = 64;

/// Reads protobuf fields from a byte slice.
pub struct WireReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> WireReader<'a> {
    /// Create a new reader for the given bytes.
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Check if all bytes have been consumed.
    pub fn is_empty(&self) -> bool {
        self.pos >= self.data.len()
    }

    /// Current position in the input.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Get remaining bytes.
    pub fn remaining(&self) -> &'a [u8] {
        &self.data[self.pos..]
    }

    #[inline]
    fn read_byte(&mut self) -> CodecResult<u8> {
        let byte = *self.data.get(self.pos).ok_or(CodecError::UnexpectedEof)?;
        self.pos += 1;
        Ok(byte)
    }

    #[inline]
    fn read_bytes(&mut self, len: usize) -> CodecResult<&'a [u8]> {
        let end = self.pos.checked_add(len).ok_or(CodecError::UnexpectedEof)?;
        let bytes = self.data.get(self.pos..end).ok_or(CodecError::UnexpectedEof)?;
        self.pos = end;
        Ok(bytes)
    }

    /// Reads a base-128 varint.
    pub fn read_varint(&mut self) -> CodecResult<u64> {
        let mut result = 0u64;
        let mut shift = 0u32;
        loop {
            let byte = self.read_byte()?;
            if shift == 63 && byte > 1 {
                return Err(CodecError::VarintOverflow);
            }
            result |= u64::from(byte & 0x7F) << shift;
            if byte & 0x80 == 0 {
                return Ok(result);
            }
            shift += 7;
        }
    }

    /// Reads the next field tag, or `None` at end of input.
    pub fn read_tag(&mut self) -> CodecResult<Option<(u32, WireType)>> {
        if self.is_empty() {
            return Ok(None);
        }
        let tag = self.read_varint()?;
        let field = u32::try_from(tag >> 3)
            .map_err(|_| CodecError::invalid_structure("field number out of range"))?;
        if field == 0 {
            return Err(CodecError::invalid_structure("field number 0"));
        }
        let wire_type = WireType::from_bits((tag & 0x07) as u8)?;
        Ok(Some((field, wire_type)))
    }

    /// Reads the next tag inside the group opened by `group_field`.
    ///
    /// Returns `None` once the matching end-group tag is consumed.
    pub fn read_group_tag(&mut self, group_field: u32) -> CodecResult<Option<(u32, WireType)>> {
        match self.read_tag()? {
            None => Err(CodecError::UnexpectedEof),
            Some((field, WireType::EndGroup)) if field == group_field => Ok(None),
            Some((field, WireType::EndGroup)) => Err(CodecError::invalid_structure(format!(
                "end of group {field} inside group {group_field}"
            ))),
            Some(tag) => Ok(Some(tag)),
        }
    }

    /// Reads a little-endian 64-bit value.
    pub fn read_fixed64(&mut self) -> CodecResult<u64> {
        let bytes = self.read_bytes(8)?;
        let mut buf = [0u8; 8];
        buf.copy_from_slice(bytes);
        Ok(u64::from_le_bytes(buf))
    }

    /// Reads a little-endian 32-bit value.
    pub fn read_fixed32(&mut self) -> CodecResult<u32> {
        let bytes = self.read_bytes(4)?;
        Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    /// Reads a double stored as fixed64.
    pub fn read_double(&mut self) -> CodecResult<f64> {
        self.read_fixed64().map(f64::from_bits)
    }

    /// Reads a length-prefixed byte string.
    pub fn read_length_delimited(&mut self) -> CodecResult<&'a [u8]> {
        let len = self.read_varint()?;
        let len = usize::try_from(len).map_err(|_| CodecError::UnexpectedEof)?;
        self.read_bytes(len)
    }

    /// Reads a length-prefixed UTF-8 string.
    pub fn read_string(&mut self) -> CodecResult<String> {
        let bytes = self.read_length_delimited()?;
        String::from_utf8(bytes.to_vec()).map_err(|_| CodecError::InvalidUtf8)
    }

    /// Skips over the value of a field whose tag was just read.
    pub fn skip(&mut self, field: u32, wire_type: WireType) -> CodecResult<()> {
        self.skip_nested(field, wire_type, 0)
    }

    fn skip_nested(&mut self, field: u32, wire_type: WireType, depth: usize) -> CodecResult<()> {
        match wire_type {
            WireType::Varint => self.read_varint().map(drop),
            WireType::Fixed64 => self.read_bytes(8).map(drop),
            WireType::Fixed32 => self.read_bytes(4).map(drop),
            WireType::LengthDelimited => self.read_length_delimited().map(drop),
            WireType::StartGroup => {
                if depth >= MAX_SKIP_DEPTH {
                    return Err(CodecError::invalid_structure("groups nested too deeply"));
                }
                while let Some((inner, inner_type)) = self.read_group_tag(field)? {
                    self.skip_nested(inner, inner_type, depth + 1)?;
                }
                Ok(())
            }
            WireType::EndGroup => Err(CodecError::invalid_structure(format!(
                "unexpected end of group {field}"
            ))),
        }
    }
}

/// Writes protobuf fields into a byte buffer.
#[derive(Debug, Default)]
pub struct WireWriter {
    buffer: Vec<u8>,
}

impl WireWriter {
    /// Create a new writer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Writes a raw varint.
    pub fn write_varint(&mut self, mut value: u64) {
        while value >= 0x80 {
            self.buffer.push((value as u8 & 0x7F) | 0x80);
            value >>= 7;
        }
        self.buffer.push(value as u8);
    }

    /// Writes a field tag.
    pub fn write_tag(&mut self, field: u32, wire_type: WireType) {
        self.write_varint((u64::from(field) << 3) | u64::from(wire_type.bits()));
    }

    /// Writes a varint field holding a signed value.
    pub fn write_int64(&mut self, field: u32, value: i64) {
        self.write_tag(field, WireType::Varint);
        self.write_varint(value as u64);
    }

    /// Writes a boolean field.
    pub fn write_bool(&mut self, field: u32, value: bool) {
        self.write_tag(field, WireType::Varint);
        self.write_varint(u64::from(value));
    }

    /// Writes a double field.
    pub fn write_double(&mut self, field: u32, value: f64) {
        self.write_tag(field, WireType::Fixed64);
        self.buffer.extend_from_slice(&value.to_bits().to_le_bytes());
    }

    /// Writes a length-delimited field.
    pub fn write_bytes(&mut self, field: u32, value: &[u8]) {
        self.write_tag(field, WireType::LengthDelimited);
        self.write_varint(value.len() as u64);
        self.buffer.extend_from_slice(value);
    }

    /// Writes a string field.
    pub fn write_string(&mut self, field: u32, value: &str) {
        self.write_bytes(field, value.as_bytes());
    }

    /// Opens a group.
    pub fn start_group(&mut self, field: u32) {
        self.write_tag(field, WireType::StartGroup);
    }

    /// Closes a group.
    pub fn end_group(&mut self, field: u32) {
        self.write_tag(field, WireType::EndGroup);
    }

    /// Consumes the writer and returns the encoded bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.buffer
    }
}
