//! # fsjson Testkit
//!
//! Test utilities for fsjson.
//!
//! This crate provides:
//! - Log builders and corruption helpers
//! - Property-based test generators using proptest
//! - Known-answer vectors for the log format
//! - Export harnesses over temporary directories
//! - Fuzz testing harnesses
//!
//! ## Usage
//!
//! ```rust
//! use fsjson_testkit::prelude::*;
//!
//! let bytes = LogBuilder::new().record(b"a").record(b"b").build();
//! let result = read_verified(bytes);
//! assert_eq!(result.records, vec![b"a".to_vec(), b"b".to_vec()]);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod fuzz;
pub mod generators;
pub mod integration;
pub mod vectors;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::fuzz::*;
    pub use crate::generators::*;
    pub use crate::integration::*;
    pub use crate::vectors::*;
}

pub use fixtures::*;
pub use fuzz::*;
pub use generators::*;
pub use integration::*;
pub use vectors::*;
