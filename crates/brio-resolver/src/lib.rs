//! Dependency resolution and build target computation for brio
//!
//! Resolution runs in three stages, all driven through one
//! [`RegistrySession`](brio_registry::RegistrySession):
//!
//! - [`tree`] turns a manifest's constraints into a concrete version tree
//! - [`flags`] computes the flags and definitions each package receives
//! - [`targets`] folds configured packages into deduplicated build targets
//!
//! [`build::create_build_targets`] runs the last two stages over a resolved tree.

pub mod build;
pub mod flags;
pub mod targets;
pub mod tree;

// Re-export main types
pub use build::{create_build_targets, BuildOutput, MAIN_TARGET};
pub use flags::{fill_placeholders, is_placeholder, resolve_visibility, try_match};
pub use targets::{Target, TargetLink, TargetSet};
pub use tree::{Node, Resolver};

use brio_core::error::BrioError;

/// Result type for resolver operations
pub type ResolveResult<T> = Result<T, BrioError>;
