//! Configuration parsing for brio
//!
//! This crate handles parsing and validation of `brio.toml` manifests,
//! project discovery, and the layered settings used by a resolution session.

pub mod toml;
pub mod merge;

// Re-export main types
pub use self::toml::{
    DefinitionLists, DefinitionsSection, DependencySpec, DependencyTag, FlagsSection, Manifest,
    PackageKind, PackageSection, TargetSection, MANIFEST_FILE,
};
pub use merge::{ConfigLayering, ConfigLoader, ConfigSource, Settings, SettingsFile};

use brio_core::error::BrioError;

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, BrioError>;
