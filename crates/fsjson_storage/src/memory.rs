//! In-memory byte source for testing.

use crate::error::{StorageError, StorageResult};
use crate::source::ByteSource;

/// An in-memory byte source.
///
/// This source yields bytes from an owned buffer and is suitable for:
/// - Unit tests
/// - Integration tests
/// - Inputs that have already been loaded into memory
///
/// # Example
///
/// ```rust
/// use fsjson_storage::{ByteSource, InMemorySource};
///
/// let mut source = InMemorySource::new(b"test data".to_vec());
/// assert_eq!(source.read(4).unwrap(), b"test");
/// assert_eq!(source.read(100).unwrap(), b" data");
/// assert!(source.read(1).unwrap().is_empty());
/// assert_eq!(source.tell(), 9);
/// ```
#[derive(Debug, Default, Clone)]
pub struct InMemorySource {
    data: Vec<u8>,
    pos: usize,
    closed: bool,
}

impl InMemorySource {
    /// Creates a new source positioned at the start of `data`.
    #[must_use]
    pub fn new(data: Vec<u8>) -> Self {
        Self {
            data,
            pos: 0,
            closed: false,
        }
    }

    /// Returns the total length of the underlying buffer.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` if the underlying buffer is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns the bytes not yet consumed.
    #[must_use]
    pub fn remaining(&self) -> &[u8] {
        &self.data[self.pos..]
    }

    /// Closes the source; further reads fail with [`StorageError::Closed`].
    pub fn close(&mut self) {
        self.closed = true;
    }

    /// Consumes the source and returns the underlying buffer.
    #[must_use]
    pub fn into_inner(self) -> Vec<u8> {
        self.data
    }
}

impl From<Vec<u8>> for InMemorySource {
    fn from(data: Vec<u8>) -> Self {
        Self::new(data)
    }
}

impl ByteSource for InMemorySource {
    fn read(&mut self, n: usize) -> StorageResult<Vec<u8>> {
        if self.closed {
            return Err(StorageError::Closed);
        }

        let end = self.pos.saturating_add(n).min(self.data.len());
        let chunk = self.data[self.pos..end].to_vec();
        self.pos = end;
        Ok(chunk)
    }

    fn tell(&self) -> u64 {
        self.pos as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_new_is_at_start() {
        let source = InMemorySource::new(b"hello".to_vec());
        assert_eq!(source.tell(), 0);
        assert_eq!(source.len(), 5);
        assert_eq!(source.remaining(), b"hello");
    }

    #[test]
    fn memory_read_advances_position() {
        let mut source = InMemorySource::new(b"hello world".to_vec());

        assert_eq!(source.read(5).unwrap(), b"hello");
        assert_eq!(source.tell(), 5);

        assert_eq!(source.read(6).unwrap(), b" world");
        assert_eq!(source.tell(), 11);
    }

    #[test]
    fn memory_short_read_at_end() {
        let mut source = InMemorySource::new(b"abc".to_vec());
        source.read(2).unwrap();

        let data = source.read(10).unwrap();
        assert_eq!(data, b"c");
        assert_eq!(source.tell(), 3);

        assert!(source.read(10).unwrap().is_empty());
        assert_eq!(source.tell(), 3);
    }

    #[test]
    fn memory_zero_length_read() {
        let mut source = InMemorySource::new(b"abc".to_vec());
        assert!(source.read(0).unwrap().is_empty());
        assert_eq!(source.tell(), 0);
    }

    #[test]
    fn memory_empty_source() {
        let mut source = InMemorySource::default();
        assert!(source.is_empty());
        assert!(source.read(7).unwrap().is_empty());
    }

    #[test]
    fn memory_huge_request_does_not_overflow() {
        let mut source = InMemorySource::new(vec![1, 2, 3]);
        source.read(1).unwrap();
        assert_eq!(source.read(usize::MAX).unwrap(), vec![2, 3]);
    }

    #[test]
    fn memory_closed_fails() {
        let mut source = InMemorySource::new(b"abc".to_vec());
        source.close();
        assert!(matches!(source.read(1), Err(StorageError::Closed)));
    }

    #[test]
    fn memory_through_mut_ref() {
        fn read_three<S: ByteSource>(mut source: S) -> Vec<u8> {
            source.read(3).unwrap()
        }

        let mut source = InMemorySource::new(b"abcdef".to_vec());
        assert_eq!(read_three(&mut source), b"abc");
        assert_eq!(source.tell(), 3);
    }

    #[test]
    fn memory_boxed_dyn() {
        let mut source: Box<dyn ByteSource> = Box::new(InMemorySource::new(b"xyz".to_vec()));
        assert_eq!(source.read(2).unwrap(), b"xy");
        assert_eq!(source.tell(), 2);
    }
}
