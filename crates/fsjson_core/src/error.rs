//! Error types for fsjson core.

use std::fmt;
use std::io;
use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in fsjson core operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Byte source error.
    #[error("storage error: {0}")]
    Storage(#[from] fsjson_storage::StorageError),

    /// Entity codec error.
    #[error("codec error: {0}")]
    Codec(#[from] fsjson_codec::CodecError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A header claims more payload than its block can hold.
    #[error("fragment at offset {offset} claims {length} bytes but only {remaining} remain in the block")]
    FragmentTooLarge {
        /// Offset of the fragment header.
        offset: u64,
        /// Payload length from the header.
        length: usize,
        /// Bytes remaining in the block, header included.
        remaining: usize,
    },

    /// Stored and computed checksums differ.
    #[error("checksum mismatch at offset {offset}: expected {expected:08x}, got {actual:08x}")]
    ChecksumMismatch {
        /// Offset of the fragment header.
        offset: u64,
        /// Unmasked checksum from the header.
        expected: u32,
        /// Checksum computed over the fragment.
        actual: u32,
    },

    /// The type byte is not a known fragment type.
    #[error("unsupported fragment type {type_byte} at offset {offset}")]
    UnknownFragmentType {
        /// Offset of the fragment header.
        offset: u64,
        /// The raw type byte.
        type_byte: u8,
    },

    /// Operation not permitted in current state.
    #[error("invalid operation: {message}")]
    InvalidOperation {
        /// Description of why operation is invalid.
        message: String,
    },
}

/// Class of framing corruption the record reader recovers from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CorruptionKind {
    /// The framing itself is inconsistent (bad length or type).
    Structural,
    /// The fragment failed checksum verification.
    Integrity,
}

impl fmt::Display for CorruptionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Structural => f.write_str("structural"),
            Self::Integrity => f.write_str("integrity"),
        }
    }
}

impl CoreError {
    /// Creates an invalid operation error.
    pub fn invalid_operation(message: impl Into<String>) -> Self {
        Self::InvalidOperation {
            message: message.into(),
        }
    }

    /// Classifies framing errors that are recovered by resynchronizing.
    ///
    /// Returns `None` for everything else, which must propagate.
    #[must_use]
    pub fn corruption_kind(&self) -> Option<CorruptionKind> {
        match self {
            Self::FragmentTooLarge { .. } | Self::UnknownFragmentType { .. } => {
                Some(CorruptionKind::Structural)
            }
            Self::ChecksumMismatch { .. } => Some(CorruptionKind::Integrity),
            _ => None,
        }
    }

    /// Returns `true` if the record reader recovers from this error locally.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        self.corruption_kind().is_some()
    }
}
