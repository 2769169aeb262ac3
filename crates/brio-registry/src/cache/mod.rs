//! Session-scoped caches backing a [`RegistrySession`](crate::RegistrySession)

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use camino::Utf8PathBuf;
use dashmap::DashMap;

use brio_config::Manifest;
use brio_core::types::{Query, Version, VersionList};
use crate::api::{PackageData, VersionRecord};

/// A package manifest found on disk
#[derive(Debug, Clone, PartialEq)]
pub struct LocalPackage {
    /// Found under the project's vendor directory
    pub vendor: bool,
    /// Directory holding the manifest
    pub path: Utf8PathBuf,
    pub manifest: Manifest,
}

impl LocalPackage {
    pub fn name(&self) -> &str {
        self.manifest.name()
    }

    pub fn version(&self) -> &Version {
        self.manifest.version()
    }
}

/// Every table a resolution session memoizes.
///
/// Entries are never evicted: a session lives for one resolution and a
/// (name, constraint) pair must keep yielding the same version throughout.
#[derive(Debug, Default)]
pub struct SessionCache {
    /// name -> package document
    data: DashMap<String, Arc<PackageData>>,
    /// (name, version) -> version record
    versions: DashMap<(String, String), Arc<VersionRecord>>,
    /// name -> sorted advertised versions
    lists: DashMap<String, Arc<VersionList>>,
    /// (name, constraint) -> chosen version
    resolved: DashMap<(String, String), Version>,
    /// name -> every version chosen so far
    selected: DashMap<String, VersionList>,
    /// name -> versions available on disk
    local_versions: DashMap<String, VersionList>,
    /// (name, version) -> local manifest
    packages: DashMap<(String, String), Arc<LocalPackage>>,

    hits: AtomicUsize,
    misses: AtomicUsize,
    remote_fetches: AtomicUsize,
}

/// Cache statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: usize,
    pub misses: usize,
    /// Requests that reached the registry source
    pub remote_fetches: usize,
    /// Package documents held
    pub packages: usize,
    /// Memoized (name, constraint) resolutions
    pub resolved: usize,
    /// Manifests registered from disk
    pub local_packages: usize,
}

impl SessionCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn track<T>(&self, found: Option<T>) -> Option<T> {
        let counter = if found.is_some() { &self.hits } else { &self.misses };
        counter.fetch_add(1, Ordering::Relaxed);
        found
    }

    pub fn data(&self, name: &str) -> Option<Arc<PackageData>> {
        self.track(self.data.get(name).map(|entry| Arc::clone(entry.value())))
    }

    pub fn insert_data(&self, name: &str, data: PackageData) -> Arc<PackageData> {
        let data = Arc::new(data);
        self.data.insert(name.to_string(), Arc::clone(&data));
        data
    }

    /// Version record held either directly or inside a fetched package document
    pub fn version(&self, name: &str, version: &str) -> Option<Arc<VersionRecord>> {
        let key = (name.to_string(), version.to_string());
        if let Some(record) = self.versions.get(&key) {
            return self.track(Some(Arc::clone(record.value())));
        }

        let from_data = self
            .data
            .get(name)
            .and_then(|data| data.versions.get(version).cloned())
            .map(Arc::new);
        if let Some(record) = &from_data {
            self.versions.insert(key, Arc::clone(record));
        }
        self.track(from_data)
    }

    pub fn insert_version(&self, name: &str, version: &str, record: VersionRecord) -> Arc<VersionRecord> {
        let record = Arc::new(record);
        self.versions
            .insert((name.to_string(), version.to_string()), Arc::clone(&record));
        record
    }

    pub fn list(&self, name: &str) -> Option<Arc<VersionList>> {
        self.track(self.lists.get(name).map(|entry| Arc::clone(entry.value())))
    }

    pub fn insert_list(&self, name: &str, list: VersionList) -> Arc<VersionList> {
        let list = Arc::new(list);
        self.lists.insert(name.to_string(), Arc::clone(&list));
        list
    }

    /// Version previously chosen for `(name, constraint)`
    pub fn resolved(&self, name: &str, constraint: &str) -> Option<Version> {
        self.track(
            self.resolved
                .get(&(name.to_string(), constraint.to_string()))
                .map(|entry| entry.clone()),
        )
    }

    /// Memoize a resolution and remember the version as selected.
    ///
    /// The first version stored for a pair wins; later stores return it.
    pub fn store_resolved(&self, name: &str, constraint: &str, version: Version) -> Version {
        let chosen = self
            .resolved
            .entry((name.to_string(), constraint.to_string()))
            .or_insert(version)
            .clone();
        self.selected
            .entry(name.to_string())
            .or_default()
            .insert(chosen.clone());
        chosen
    }

    /// Highest already-selected version of `name` matching `query`
    pub fn find_selected(&self, name: &str, query: &Query) -> Option<Version> {
        self.selected
            .get(name)
            .and_then(|list| list.find(query).cloned())
    }

    /// Versions of `name` available on disk
    pub fn local_list(&self, name: &str) -> Option<VersionList> {
        self.local_versions.get(name).map(|list| list.clone())
    }

    pub fn local_package(&self, name: &str, version: &str) -> Option<Arc<LocalPackage>> {
        self.packages
            .get(&(name.to_string(), version.to_string()))
            .map(|entry| Arc::clone(entry.value()))
    }

    /// Register a manifest found on disk. Returns the stored entry, which is
    /// the earlier one when the same name and version was already registered.
    pub fn insert_local(&self, package: LocalPackage) -> Arc<LocalPackage> {
        let name = package.name().to_string();
        let version = package.version().clone();
        let stored = self
            .packages
            .entry((name.clone(), version.to_string()))
            .or_insert_with(|| Arc::new(package))
            .value()
            .clone();
        self.local_versions.entry(name).or_default().insert(version);
        stored
    }

    pub fn record_fetch(&self) {
        self.remote_fetches.fetch_add(1, Ordering::Relaxed);
    }

    /// Get cache statistics
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            remote_fetches: self.remote_fetches.load(Ordering::Relaxed),
            packages: self.data.len(),
            resolved: self.resolved.len(),
            local_packages: self.packages.len(),
        }
    }
}

#[cfg(test)]
mod tests;
