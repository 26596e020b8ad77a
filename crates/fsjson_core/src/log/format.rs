//! On-disk layout of the block-framed log.

/// Size of one physical block. Blocks start at offset zero.
pub const BLOCK_SIZE: usize = 32 * 1024;

/// Fragment header size.
/// masked crc (4) + length (2) + type (1) = 7 bytes
pub const HEADER_SIZE: usize = 4 + 2 + 1;

/// Largest payload a single fragment can carry.
pub const MAX_FRAGMENT_PAYLOAD: usize = BLOCK_SIZE - HEADER_SIZE;

/// Type of a physical fragment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum FragmentType {
    /// Zero-filled or preallocated space; never carries data.
    None = 0,
    /// A complete logical record.
    Full = 1,
    /// First piece of a fragmented record.
    First = 2,
    /// Interior piece of a fragmented record.
    Middle = 3,
    /// Final piece of a fragmented record.
    Last = 4,
}

impl FragmentType {
    /// Converts a byte to a fragment type.
    pub fn from_byte(b: u8) -> Option<Self> {
        match b {
            0 => Some(Self::None),
            1 => Some(Self::Full),
            2 => Some(Self::First),
            3 => Some(Self::Middle),
            4 => Some(Self::Last),
            _ => None,
        }
    }

    /// Converts the fragment type to a byte.
    #[must_use]
    pub const fn as_byte(self) -> u8 {
        self as u8
    }

    /// Returns the upper-case name used in log messages.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::None => "NONE",
            Self::Full => "FULL",
            Self::First => "FIRST",
            Self::Middle => "MIDDLE",
            Self::Last => "LAST",
        }
    }
}

/// Decoded fragment header.
///
/// ```text
/// | masked crc (u32 LE) | length (u16 LE) | type (u8) |
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FragmentHeader {
    /// CRC32C of `type || payload`, masked.
    pub masked_crc: u32,
    /// Payload length in bytes.
    pub length: u16,
    /// Raw type byte; may hold a value outside [`FragmentType`].
    pub type_byte: u8,
}

impl FragmentHeader {
    /// Parses a header from its fixed-width encoding.
    #[must_use]
    pub fn decode(bytes: &[u8; HEADER_SIZE]) -> Self {
        Self {
            masked_crc: u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
            length: u16::from_le_bytes([bytes[4], bytes[5]]),
            type_byte: bytes[6],
        }
    }

    /// Serializes the header.
    #[must_use]
    pub fn encode(&self) -> [u8; HEADER_SIZE] {
        let mut out = [0u8; HEADER_SIZE];
        out[0..4].copy_from_slice(&self.masked_crc.to_le_bytes());
        out[4..6].copy_from_slice(&self.length.to_le_bytes());
        out[6] = self.type_byte;
        out
    }
}

/// One physical fragment as read from the stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment {
    /// Offset of the fragment header in the stream.
    pub offset: u64,
    /// Fragment type.
    pub fragment_type: FragmentType,
    /// Payload bytes. Always empty for [`FragmentType::None`].
    pub payload: Vec<u8>,
}

/// Bytes left in the block containing `offset`, in `1..=BLOCK_SIZE`.
#[must_use]
pub fn block_remaining(offset: u64) -> usize {
    BLOCK_SIZE - (offset % BLOCK_SIZE as u64) as usize
}

/// Returns `true` if `offset` sits on a block boundary.
#[must_use]
pub fn is_block_aligned(offset: u64) -> bool {
    offset % BLOCK_SIZE as u64 == 0
}
