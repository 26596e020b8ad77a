//! Error types for byte sources.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for byte source operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur while reading from a byte source.
///
/// End-of-stream is not an error: it is reported as a short read.
#[derive(Debug, Error)]
pub enum StorageError {
    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The path does not name a regular file.
    #[error("not a regular file: {}", path.display())]
    NotAFile {
        /// The offending path.
        path: PathBuf,
    },

    /// The source has been closed.
    #[error("source is closed")]
    Closed,
}
