//! Utility functions and helpers.
//!
//! Common functionality used across multiple brio crates.

pub mod hash;
pub mod path;

pub use hash::{blake3_hash, IdentityHasher};
pub use path::{is_safe_component, versioned_dir_name};
