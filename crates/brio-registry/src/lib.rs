//! Registry access for brio
//!
//! This crate provides the registry collaborators (an HTTP client for
//! npm-compatible registries and an in-memory stand-in) and the
//! [`RegistrySession`], which memoizes every registry and filesystem lookup
//! made during one resolution.

pub mod client;
pub mod api;
pub mod cache;
pub mod session;

// Re-export main types
pub use client::{HttpRegistry, MemoryRegistry, RegistrySource, INSTALL_ACCEPT};
pub use api::{Distribution, PackageData, VersionRecord, LATEST_TAG};
pub use cache::{CacheStats, LocalPackage, SessionCache};
pub use session::RegistrySession;

use brio_core::error::BrioError;

/// Result type for registry operations
pub type RegistryResult<T> = Result<T, BrioError>;
