//! CLI command implementations.

pub mod convert;
pub mod dump;
pub mod verify;
