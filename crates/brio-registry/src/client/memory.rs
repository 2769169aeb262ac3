//! In-memory registry used by tests, benches and offline tooling

use std::collections::BTreeMap;
use dashmap::DashMap;

use brio_core::error::BrioError;
use super::RegistrySource;
use crate::api::{PackageData, VersionRecord, LATEST_TAG};
use crate::RegistryResult;

/// Registry backed by a map, counting every fetch it serves
#[derive(Debug, Default)]
pub struct MemoryRegistry {
    packages: DashMap<String, PackageData>,
    fetches: DashMap<String, usize>,
}

impl MemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advertise `name@version` with the given dependency constraints
    pub fn publish(&self, name: &str, version: &str, dependencies: &[(&str, &str)]) -> &Self {
        let record = VersionRecord {
            name: name.to_string(),
            version: version.to_string(),
            dependencies: dependencies
                .iter()
                .map(|(dep, constraint)| (dep.to_string(), constraint.to_string()))
                .collect::<BTreeMap<_, _>>(),
            ..VersionRecord::default()
        };

        let mut entry = self.packages.entry(name.to_string()).or_insert_with(|| PackageData {
            name: name.to_string(),
            ..PackageData::default()
        });
        entry.versions.insert(version.to_string(), record);
        self
    }

    /// Point a dist-tag at a version
    pub fn tag(&self, name: &str, tag: &str, version: &str) -> &Self {
        if let Some(mut data) = self.packages.get_mut(name) {
            data.dist_tags.insert(tag.to_string(), version.to_string());
        }
        self
    }

    pub fn tag_latest(&self, name: &str, version: &str) -> &Self {
        self.tag(name, LATEST_TAG, version)
    }

    /// Number of fetches (package or single version) served for `name`
    pub fn fetch_count(&self, name: &str) -> usize {
        self.fetches.get(name).map_or(0, |count| *count)
    }

    pub fn total_fetches(&self) -> usize {
        self.fetches.iter().map(|entry| *entry.value()).sum()
    }

    fn count(&self, name: &str) {
        *self.fetches.entry(name.to_string()).or_insert(0) += 1;
    }
}

impl RegistrySource for MemoryRegistry {
    async fn fetch_package(&self, name: &str) -> RegistryResult<PackageData> {
        self.count(name);
        self.packages
            .get(name)
            .map(|data| data.clone())
            .ok_or_else(|| BrioError::PackageNotFound {
                name: name.to_string(),
            })
    }

    async fn fetch_version(&self, name: &str, version: &str) -> RegistryResult<VersionRecord> {
        self.count(name);
        self.packages
            .get(name)
            .and_then(|data| data.versions.get(version).cloned())
            .ok_or_else(|| BrioError::PackageVersionNotFound {
                name: name.to_string(),
                version: version.to_string(),
            })
    }
}
