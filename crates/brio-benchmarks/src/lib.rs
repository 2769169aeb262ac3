//! brio benchmarking suite
//!
//! Benchmarks for constraint parsing, version selection, tree resolution and
//! target deduplication.

pub mod common;

pub use common::*;
