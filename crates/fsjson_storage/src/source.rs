//! Byte source trait definition.

use crate::error::StorageResult;

/// A sequential, forward-only byte source.
///
/// Sources are **opaque byte streams**. The log reader owns all format
/// interpretation - sources do not understand blocks or fragments.
///
/// # Invariants
///
/// - `read(n)` returns at most `n` bytes
/// - Fewer than `n` bytes (including zero) means the stream is exhausted
/// - `tell` equals the total number of bytes returned so far
/// - The position never moves backwards
///
/// # Implementors
///
/// - [`super::InMemorySource`] - For testing
/// - [`super::IoSource`] / [`super::FileSource`] - For files and pipes
pub trait ByteSource: Send {
    /// Reads up to `n` bytes from the current position.
    ///
    /// # Errors
    ///
    /// Returns an error only if the underlying I/O fails. Running out of
    /// data is signalled by returning fewer bytes than requested.
    fn read(&mut self, n: usize) -> StorageResult<Vec<u8>>;

    /// Returns the current byte offset from the start of the stream.
    fn tell(&self) -> u64;
}

impl<S: ByteSource + ?Sized> ByteSource for &mut S {
    fn read(&mut self, n: usize) -> StorageResult<Vec<u8>> {
        (**self).read(n)
    }

    fn tell(&self) -> u64 {
        (**self).tell()
    }
}

impl<S: ByteSource + ?Sized> ByteSource for Box<S> {
    fn read(&mut self, n: usize) -> StorageResult<Vec<u8>> {
        (**self).read(n)
    }

    fn tell(&self) -> u64 {
        (**self).tell()
    }
}
