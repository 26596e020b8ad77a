//! # fsjson Storage
//!
//! Sequential byte sources for the fsjson log reader.
//!
//! This crate provides the lowest-level input abstraction. Sources are
//! **opaque byte streams** - they do not interpret the data they yield.
//!
//! ## Design Principles
//!
//! - Sources are forward-only: `read(n)` and `tell()`, nothing else
//! - A short read means end-of-stream, never an error
//! - No knowledge of log blocks, fragments, or entities
//! - Must be `Send` so a worker thread can own one
//!
//! ## Available Sources
//!
//! - [`InMemorySource`] - For testing and already-buffered data
//! - [`IoSource`] - Adapter over any [`std::io::Read`]
//! - [`FileSource`] - Buffered file reader
//!
//! ## Example
//!
//! ```rust
//! use fsjson_storage::{ByteSource, InMemorySource};
//!
//! let mut source = InMemorySource::new(b"hello world".to_vec());
//! assert_eq!(source.read(5).unwrap(), b"hello");
//! assert_eq!(source.tell(), 5);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod file;
mod memory;
mod source;

pub use error::{StorageError, StorageResult};
pub use file::{FileSource, IoSource};
pub use memory::InMemorySource;
pub use source::ByteSource;
