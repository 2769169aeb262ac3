//! brio.toml manifest parsing and validation

use std::collections::BTreeMap;
use serde::{Deserialize, Serialize};
use brio_core::types::{Query, Version};
use brio_core::error::BrioError;
use crate::ConfigResult;

/// Manifest file name looked up in project and package directories
pub const MANIFEST_FILE: &str = "brio.toml";

/// Complete brio.toml manifest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    /// Package metadata section
    pub package: PackageSection,

    /// Flags this package requests from its parent and the project
    #[serde(default)]
    pub flags: FlagsSection,

    /// Preprocessor definitions this package requests
    #[serde(default)]
    pub definitions: DefinitionsSection,

    /// Declared dependencies
    #[serde(default)]
    pub dependencies: BTreeMap<String, DependencySpec>,

    /// Build targets (only meaningful for the project being built)
    #[serde(default)]
    pub targets: BTreeMap<String, TargetSection>,
}

/// Package metadata section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct PackageSection {
    /// Package name (required)
    pub name: String,

    /// Package version (required)
    pub version: Version,

    /// Application or reusable package
    #[serde(default)]
    pub kind: PackageKind,

    /// Package consists of headers only
    #[serde(default)]
    pub header_only: bool,

    /// Target used when none is named explicitly
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_target: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PackageKind {
    App,
    #[default]
    Pkg,
}

/// `[flags]` section
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct FlagsSection {
    /// Raw visibility token; resolved later with a fallback, never rejected here
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visibility: Option<String>,
    pub allow_only_global: bool,
    pub allow_only_required: bool,
    /// Flags that must come from the project's global flags
    pub global: Vec<String>,
    /// Flags that must come from the parent
    pub required: Vec<String>,
    /// Flags always applied to this package
    pub included: Vec<String>,
}

/// PRIVATE and PUBLIC halves of a definition list
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DefinitionLists {
    pub private: Vec<String>,
    pub public: Vec<String>,
}

impl DefinitionLists {
    pub fn is_empty(&self) -> bool {
        self.private.is_empty() && self.public.is_empty()
    }
}

/// `[definitions]` section
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct DefinitionsSection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visibility: Option<String>,
    pub allow_only_global: bool,
    pub allow_only_required: bool,
    /// Only global definitions are resolved for this package
    pub singleton: bool,
    pub global: DefinitionLists,
    pub required: DefinitionLists,
    pub optional: DefinitionLists,
    pub included: DefinitionLists,
}

/// Dependency specification: a bare constraint or a detailed table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DependencySpec {
    /// Simple version constraint string
    Simple(String),
    /// Detailed dependency tag
    Detailed(DependencyTag),
}

/// Detailed dependency declaration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct DependencyTag {
    /// Version constraint
    pub version: String,
    /// Package lives under the project's vendor directory
    pub vendor: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link_visibility: Option<String>,
    /// Flags handed to the dependency; may contain `$(NAME)` placeholders
    pub flags: Vec<String>,
    /// Definitions handed to the dependency; may contain placeholders
    pub definitions: Vec<String>,
    /// Extra flags on the link edge
    pub linker_flags: Vec<String>,
}

impl DependencySpec {
    /// Get the constraint string
    pub fn version(&self) -> &str {
        match self {
            DependencySpec::Simple(version) => version,
            DependencySpec::Detailed(tag) => &tag.version,
        }
    }

    /// Normalize to a detailed tag
    pub fn to_tag(&self) -> DependencyTag {
        match self {
            DependencySpec::Simple(version) => DependencyTag {
                version: version.clone(),
                ..DependencyTag::default()
            },
            DependencySpec::Detailed(tag) => tag.clone(),
        }
    }

    /// Check if this is a vendored dependency
    pub fn is_vendor(&self) -> bool {
        matches!(self, DependencySpec::Detailed(DependencyTag { vendor: true, .. }))
    }

    /// Parse the version constraint
    pub fn query(&self) -> ConfigResult<Query> {
        Query::parse(self.version())
    }
}

/// `[targets.<name>]` section
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct TargetSection {
    /// Flags offered to every package in the graph
    pub global_flags: Vec<String>,
    pub global_definitions: Vec<String>,
    /// Flags for the root package itself (package projects only)
    pub package_flags: Vec<String>,
    pub package_definitions: Vec<String>,
    /// Extra flags on the main target's links
    pub link_flags: Vec<String>,
}

impl Manifest {
    pub fn name(&self) -> &str {
        &self.package.name
    }

    pub fn version(&self) -> &Version {
        &self.package.version
    }

    pub fn is_app(&self) -> bool {
        self.package.kind == PackageKind::App
    }

    /// Look up a target, falling back to the default target
    pub fn target(&self, name: Option<&str>) -> Option<(&str, &TargetSection)> {
        let name = name.or(self.package.default_target.as_deref())?;
        self.targets.get_key_value(name).map(|(k, v)| (k.as_str(), v))
    }
}

/// Parse TOML string to a manifest
pub fn parse_manifest(content: &str) -> ConfigResult<Manifest> {
    // toml_edit first for positioned syntax errors
    content.parse::<toml_edit::DocumentMut>()
        .map_err(|e| BrioError::TomlParse {
            path: MANIFEST_FILE.to_string(),
            message: format!("TOML syntax error: {}", e),
        })?;

    let manifest: Manifest = toml::from_str(content)
        .map_err(|e| BrioError::TomlParse {
            path: MANIFEST_FILE.to_string(),
            message: e.to_string(),
        })?;

    validate_manifest(&manifest)?;

    Ok(manifest)
}

/// Serialize a manifest to a TOML string
pub fn serialize_manifest(manifest: &Manifest) -> ConfigResult<String> {
    toml::to_string_pretty(manifest)
        .map_err(|e| BrioError::TomlParse {
            path: MANIFEST_FILE.to_string(),
            message: format!("TOML serialization error: {}", e),
        })
}

/// Validate manifest completeness
pub fn validate_manifest(manifest: &Manifest) -> ConfigResult<()> {
    if manifest.package.name.is_empty() {
        return Err(BrioError::ConfigValidation {
            field: "package.name".to_string(),
            reason: "Package name is required in [package] section".to_string(),
        });
    }

    if !is_valid_package_name(&manifest.package.name) {
        return Err(BrioError::ConfigValidation {
            field: "package.name".to_string(),
            reason: format!(
                "Invalid package name '{}'. Names may contain letters, digits, '-', '_', '.' and a leading @scope/",
                manifest.package.name
            ),
        });
    }

    for (name, spec) in &manifest.dependencies {
        if !is_valid_package_name(name) {
            return Err(BrioError::ConfigValidation {
                field: format!("dependencies.{}", name),
                reason: format!("Invalid dependency name '{}'", name),
            });
        }
        spec.query()?;
    }

    if let Some(default) = &manifest.package.default_target {
        if !manifest.targets.contains_key(default) {
            return Err(BrioError::ConfigValidation {
                field: "package.default-target".to_string(),
                reason: format!("Default target '{}' is not defined under [targets]", default),
            });
        }
    }

    Ok(())
}

/// Load and parse brio.toml from file path
pub async fn load_from_file(path: &camino::Utf8Path) -> ConfigResult<Manifest> {
    let content = tokio::fs::read_to_string(path).await
        .map_err(|e| BrioError::io(format!("Failed to read {}", path), e))?;

    parse_manifest(&content)
        .map_err(|e| match e {
            BrioError::TomlParse { message, .. } => BrioError::TomlParse {
                path: path.to_string(),
                message,
            },
            BrioError::ConfigValidation { field, reason } => BrioError::ConfigValidation {
                field,
                reason: format!("In file {}: {}", path, reason),
            },
            other => other,
        })
}

/// Check if a package name is valid
fn is_valid_package_name(name: &str) -> bool {
    if name.is_empty() || name.len() > 214 {
        return false;
    }

    let bare = match name.strip_prefix('@') {
        Some(scoped) => match scoped.split_once('/') {
            Some((scope, pkg)) if !scope.is_empty() && !pkg.is_empty() => {
                if !scope.chars().all(is_name_char) {
                    return false;
                }
                pkg
            },
            _ => return false,
        },
        None => name,
    };

    bare.chars().next().map_or(false, |c| c.is_ascii_alphanumeric())
        && bare.chars().all(is_name_char)
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.')
}
