//! Benchmark helpers for fsjson.

pub mod utils;
