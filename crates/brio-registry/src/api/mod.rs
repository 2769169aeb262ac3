//! Registry API response types

use std::collections::{BTreeMap, HashMap};
use serde::{Deserialize, Serialize};
use brio_config::Manifest;

/// Dist-tag naming the newest stable release
pub const LATEST_TAG: &str = "latest";

/// Package document returned by `GET /<name>`
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct PackageData {
    /// Package name
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Named release pointers, e.g. `latest`
    #[serde(default, rename = "dist-tags")]
    pub dist_tags: HashMap<String, String>,
    /// All advertised versions keyed by version string
    #[serde(default)]
    pub versions: HashMap<String, VersionRecord>,
}

/// Metadata for one published version (`GET /<name>/<version>`)
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct VersionRecord {
    pub name: String,
    pub version: String,
    /// Declared dependencies: name to constraint text
    #[serde(default)]
    pub dependencies: BTreeMap<String, String>,
    /// Distribution information
    #[serde(default)]
    pub dist: Distribution,
}

/// Distribution information for a package tarball
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Distribution {
    /// Tarball download URL
    #[serde(default)]
    pub tarball: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shasum: Option<String>,
    /// Unpacked size in bytes
    #[serde(default, rename = "unpackedSize", skip_serializing_if = "Option::is_none")]
    pub unpacked_size: Option<u64>,
}

impl VersionRecord {
    /// Build the record a local manifest stands in for
    pub fn from_manifest(manifest: &Manifest) -> Self {
        Self {
            name: manifest.package.name.clone(),
            version: manifest.package.version.to_string(),
            dependencies: manifest
                .dependencies
                .iter()
                .map(|(name, spec)| (name.clone(), spec.version().to_string()))
                .collect(),
            dist: Distribution::default(),
        }
    }
}
