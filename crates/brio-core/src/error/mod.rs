//! Error types and result aliases for brio operations.
//!
//! One error type covers parsing, resolution, manifest identity and flag
//! propagation failures. Visibility problems are not errors: they are
//! recovered locally and surface as
//! [`VisibilityWarning`](crate::types::VisibilityWarning) values instead.

use thiserror::Error;

/// Unified error type for all brio operations
#[derive(Error, Debug)]
pub enum BrioError {
    // Parse errors
    #[error("Invalid version format: '{input}'")]
    InvalidVersionFormat { input: String },

    #[error("Invalid version expression: '{input}'")]
    InvalidConstraintExpression { input: String },

    // Resolution errors
    #[error("Unable to find a version of '{name}' satisfying '{constraint}'")]
    UnresolvableConstraint { name: String, constraint: String },

    #[error("Package '{name}' not found in registry")]
    PackageNotFound { name: String },

    #[error("Package '{name}@{version}' not found in registry")]
    PackageVersionNotFound { name: String, version: String },

    #[error("Vendored package '{name}@{version}' not found")]
    VendorPackageNotFound { name: String, version: String },

    #[error("Registry GET {url} returned {status}")]
    Registry { status: u16, url: String },

    #[error("Network error: {message}")]
    Network {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Cyclic dependency detected: {cycle}")]
    CyclicDependency { cycle: String },

    // Manifest identity errors
    #[error("Manifest {path} does not match the requested package: {reason}")]
    ConfigIdentity { path: String, reason: String },

    // Flag propagation errors
    #[error("{category} {what} '{flag}' is not supplied to package '{package}'")]
    FlagConstraint {
        package: String,
        category: String,
        what: String,
        flag: String,
    },

    #[error("Placeholder '{placeholder}' in dependency '{package}' does not match any supplied value")]
    InvalidPlaceholderReference { package: String, placeholder: String },

    // Config errors
    #[error("Failed to parse {path}: {message}")]
    TomlParse { path: String, message: String },

    #[error("Configuration field '{field}' is invalid: {reason}")]
    ConfigValidation { field: String, reason: String },

    // IO errors
    #[error("IO error: {message}")]
    Io {
        message: String,
        #[source]
        source: std::io::Error,
    },
}

/// Result type alias for brio operations
pub type BrioResult<T> = Result<T, BrioError>;

/// Coarse classification of a [`BrioError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed version or constraint text
    Parse,
    /// Unsatisfiable constraint, missing package, registry or network failure
    Resolution,
    /// A manifest on disk names a different package or version
    ConfigIdentity,
    /// Missing global/required flag or unresolvable placeholder
    FlagConstraint,
    /// Manifest or settings could not be read
    Config,
    Io,
}

impl BrioError {
    /// Create a network error from any error type
    pub fn network<E>(message: String, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Network {
            message,
            source: Some(Box::new(source)),
        }
    }

    /// Create an IO error from std::io::Error
    pub fn io(message: String, source: std::io::Error) -> Self {
        Self::Io { message, source }
    }

    pub fn identity(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ConfigIdentity {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            BrioError::InvalidVersionFormat { .. }
            | BrioError::InvalidConstraintExpression { .. } => ErrorKind::Parse,
            BrioError::UnresolvableConstraint { .. }
            | BrioError::PackageNotFound { .. }
            | BrioError::PackageVersionNotFound { .. }
            | BrioError::VendorPackageNotFound { .. }
            | BrioError::Registry { .. }
            | BrioError::Network { .. }
            | BrioError::CyclicDependency { .. } => ErrorKind::Resolution,
            BrioError::ConfigIdentity { .. } => ErrorKind::ConfigIdentity,
            BrioError::FlagConstraint { .. } | BrioError::InvalidPlaceholderReference { .. } => {
                ErrorKind::FlagConstraint
            },
            BrioError::TomlParse { .. } | BrioError::ConfigValidation { .. } => ErrorKind::Config,
            BrioError::Io { .. } => ErrorKind::Io,
        }
    }

    /// Check if this error is recoverable
    pub fn is_recoverable(&self) -> bool {
        matches!(self, BrioError::Network { .. } | BrioError::Io { .. })
    }

    /// Get a user-friendly suggestion for fixing this error
    pub fn suggestion(&self) -> Option<&'static str> {
        match self {
            BrioError::InvalidVersionFormat { .. } => {
                Some("Versions take the form MAJOR.MINOR.PATCH, optionally followed by -tag")
            },
            BrioError::InvalidConstraintExpression { .. } => {
                Some("Use an exact version, a comparator (>=1.2), a range (1.2 - 2), ~, ^ or *")
            },
            BrioError::PackageNotFound { .. } | BrioError::PackageVersionNotFound { .. } => {
                Some("Check the package name spelling or vendor the package under vendor/")
            },
            BrioError::VendorPackageNotFound { .. } => {
                Some("Place the package under vendor/<name> or vendor/<name>__<version>")
            },
            BrioError::UnresolvableConstraint { .. } => {
                Some("Relax the version constraint or check which versions the registry advertises")
            },
            BrioError::Network { .. } => Some("Check your internet connection and try again"),
            BrioError::CyclicDependency { .. } => {
                Some("Remove circular dependencies by restructuring your packages")
            },
            BrioError::ConfigIdentity { .. } => {
                Some("Make sure vendored and installed manifests carry the expected name and version")
            },
            BrioError::FlagConstraint { .. } => {
                Some("Supply the flag from the project's global flags or from the parent dependency")
            },
            BrioError::InvalidPlaceholderReference { .. } => {
                Some("Placeholders $(NAME) must match a flag the parent package actually receives")
            },
            _ => None,
        }
    }
}
