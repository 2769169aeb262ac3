//! # brio-core
//!
//! Core types and utilities shared across all brio crates.
//!
//! This crate provides:
//! - [`Version`] values with total ordering and strict parsing
//! - [`Query`] constraint expressions and highest-available selection
//! - [`Visibility`] tokens for flags, definitions and links
//! - [`BrioError`] for unified error handling
//!
//! ## Architecture
//!
//! - `types`: versions, version lists, queries, visibility
//! - `error`: error type, classification and result alias
//! - `utils`: identity hashing and path helpers

pub mod error;
pub mod types;
pub mod utils;

// Re-export commonly used types
pub use error::{BrioError, BrioResult, ErrorKind};
pub use types::{
    Bound, Op, Query, Version, VersionList, Visibility, VisibilityIssue, VisibilitySubject,
    VisibilityWarning,
};
