//! Resolution session: registry and filesystem lookups behind one memo
//!
//! A [`RegistrySession`] owns every cache a resolution needs. Version records
//! are looked up in this order, first hit wins and is cached:
//!
//! 1. the version table, then any already-fetched package document
//! 2. a manifest on disk under `vendor/<name>`, `vendor/<name>__<version>` or
//!    `<installed>/<name>__<version>`
//! 3. a single-version fetch from the registry source

use std::sync::Arc;
use camino::{Utf8Path, Utf8PathBuf};
use rayon::prelude::*;
use tracing::{debug, info};
use walkdir::WalkDir;

use brio_config::merge::{DEFAULT_INSTALLED_DIR, DEFAULT_VENDOR_DIR};
use brio_config::toml::{load_from_file, parse_manifest};
use brio_config::{Settings, MANIFEST_FILE};
use brio_core::error::BrioError;
use brio_core::types::{Query, Version, VersionList};
use brio_core::utils::{is_safe_component, versioned_dir_name};

use crate::api::{PackageData, VersionRecord, LATEST_TAG};
use crate::cache::{CacheStats, LocalPackage, SessionCache};
use crate::client::RegistrySource;
use crate::RegistryResult;

/// Session object shared by the resolver for one resolution
#[derive(Debug)]
pub struct RegistrySession<S> {
    source: S,
    base_dir: Utf8PathBuf,
    vendor_dir: Utf8PathBuf,
    installed_dir: Utf8PathBuf,
    cache: SessionCache,
}

/// One place a local manifest may live
struct Candidate {
    dir: Utf8PathBuf,
    vendor: bool,
    /// Version must equal the requested one, otherwise it is an identity error
    strict: bool,
}

impl<S: RegistrySource> RegistrySession<S> {
    /// Create a session rooted at `base_dir` with the default directory layout
    pub fn new(source: S, base_dir: impl Into<Utf8PathBuf>) -> Self {
        let base_dir = base_dir.into();
        Self {
            vendor_dir: base_dir.join(DEFAULT_VENDOR_DIR),
            installed_dir: base_dir.join(DEFAULT_INSTALLED_DIR),
            base_dir,
            source,
            cache: SessionCache::new(),
        }
    }

    /// Create a session using the directories from layered settings
    pub fn with_settings(source: S, base_dir: impl Into<Utf8PathBuf>, settings: &Settings) -> Self {
        let base_dir = base_dir.into();
        Self {
            vendor_dir: base_dir.join(&settings.vendor_dir),
            installed_dir: base_dir.join(&settings.installed_dir),
            base_dir,
            source,
            cache: SessionCache::new(),
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn base_dir(&self) -> &Utf8Path {
        &self.base_dir
    }

    pub fn stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Package document for `name`, fetched at most once per session
    pub async fn get_data(&self, name: &str) -> RegistryResult<Arc<PackageData>> {
        if let Some(data) = self.cache.data(name) {
            debug!("Cache hit for {}", name);
            return Ok(data);
        }

        self.cache.record_fetch();
        let data = self.source.fetch_package(name).await?;
        debug!("Fetched {} ({} versions)", name, data.versions.len());
        Ok(self.cache.insert_data(name, data))
    }

    /// Version record for `name@version`.
    ///
    /// A vendored package is never looked up remotely; if no manifest for it
    /// exists on disk the lookup fails with [`BrioError::VendorPackageNotFound`].
    pub async fn get_version(
        &self,
        name: &str,
        version: &Version,
        vendor: bool,
    ) -> RegistryResult<Arc<VersionRecord>> {
        let key = version.to_string();
        if let Some(record) = self.cache.version(name, &key) {
            return Ok(record);
        }

        if let Some(package) = self.get_pkg(name, version).await? {
            debug!("Using local {}@{} from {}", name, key, package.path);
            let record = VersionRecord::from_manifest(&package.manifest);
            return Ok(self.cache.insert_version(name, &key, record));
        }

        if vendor {
            return Err(BrioError::VendorPackageNotFound {
                name: name.to_string(),
                version: key,
            });
        }

        self.cache.record_fetch();
        let record = self.source.fetch_version(name, &key).await?;
        Ok(self.cache.insert_version(name, &key, record))
    }

    /// Sorted list of every parseable version the registry advertises
    pub async fn get_list(&self, name: &str) -> RegistryResult<Arc<VersionList>> {
        if let Some(list) = self.cache.list(name) {
            return Ok(list);
        }

        let data = self.get_data(name).await?;
        let list = VersionList::from_strings(data.versions.keys().map(String::as_str));
        if list.len() < data.versions.len() {
            debug!(
                "Skipped {} unparsable versions of {}",
                data.versions.len() - list.len(),
                name
            );
        }
        Ok(self.cache.insert_list(name, list))
    }

    /// The `latest` dist-tag, or the highest advertised version
    pub async fn latest(&self, name: &str) -> RegistryResult<Version> {
        let data = self.get_data(name).await?;
        if let Some(tagged) = data.dist_tags.get(LATEST_TAG) {
            return Version::parse(tagged);
        }

        let list = self.get_list(name).await?;
        list.last().cloned().ok_or_else(|| BrioError::PackageVersionNotFound {
            name: name.to_string(),
            version: LATEST_TAG.to_string(),
        })
    }

    /// Whether the registry advertises exactly `version` for `name`
    pub async fn exists(&self, name: &str, version: &str) -> RegistryResult<bool> {
        Version::parse(version)?;
        let data = self.get_data(name).await?;
        Ok(data.versions.contains_key(version))
    }

    /// Local manifest for `name@version`, if one exists on disk
    pub async fn get_pkg(
        &self,
        name: &str,
        version: &Version,
    ) -> RegistryResult<Option<Arc<LocalPackage>>> {
        let key = version.to_string();
        if let Some(package) = self.cache.local_package(name, &key) {
            return Ok(Some(package));
        }

        if !is_safe_component(name) {
            debug!("Not searching disk for unsafe package name {:?}", name);
            return Ok(None);
        }

        let versioned = versioned_dir_name(name, &key);
        let candidates = [
            Candidate { dir: self.vendor_dir.join(name), vendor: true, strict: false },
            Candidate { dir: self.vendor_dir.join(&versioned), vendor: true, strict: true },
            Candidate { dir: self.installed_dir.join(&versioned), vendor: false, strict: true },
        ];

        for candidate in candidates {
            let path = candidate.dir.join(MANIFEST_FILE);
            if !path.is_file() {
                continue;
            }

            let manifest = load_from_file(&path).await?;
            check_package_kind(&path, &manifest)?;
            if manifest.name() != name {
                return Err(BrioError::identity(
                    path.as_str(),
                    format!("expected package '{}', found '{}'", name, manifest.name()),
                ));
            }
            if manifest.version() != version {
                if candidate.strict {
                    return Err(BrioError::identity(
                        path.as_str(),
                        format!("expected version {}, found {}", key, manifest.version()),
                    ));
                }
                continue;
            }

            return Ok(Some(self.set_pkg(LocalPackage {
                vendor: candidate.vendor,
                path: candidate.dir,
                manifest,
            })));
        }

        Ok(None)
    }

    /// Register a local package for the rest of the session
    pub fn set_pkg(&self, package: LocalPackage) -> Arc<LocalPackage> {
        self.cache.insert_local(package)
    }

    /// Versions of `name` present on disk
    pub fn local_versions(&self, name: &str) -> Option<VersionList> {
        self.cache.local_list(name)
    }

    /// Scan the vendor and installed directories and register every manifest
    /// found there. Returns how many packages were registered.
    pub fn load_local(&self) -> RegistryResult<usize> {
        let mut found = Vec::new();
        for (root, vendor) in [(&self.vendor_dir, true), (&self.installed_dir, false)] {
            if root.is_dir() {
                found.extend(find_manifests(root)?.into_iter().map(|dir| (dir, vendor)));
            }
        }

        let packages = found
            .into_par_iter()
            .map(|(dir, vendor)| read_local(dir, vendor))
            .collect::<RegistryResult<Vec<_>>>()?;

        let count = packages.len();
        for package in packages {
            debug!("Registered local {}@{}", package.name(), package.version());
            self.set_pkg(package);
        }
        info!("Loaded {} local packages from {}", count, self.base_dir);
        Ok(count)
    }

    /// Version memoized for `(name, constraint)`
    pub fn get_res(&self, name: &str, constraint: &str) -> Option<Version> {
        self.cache.resolved(name, constraint)
    }

    /// Memoize the version chosen for `(name, constraint)`. Returns the
    /// version that is now bound to the pair.
    pub fn store_ver(&self, name: &str, constraint: &str, version: Version) -> Version {
        self.cache.store_resolved(name, constraint, version)
    }

    /// Highest version of `name` already chosen this session that satisfies `query`
    pub fn find_selected(&self, name: &str, query: &Query) -> Option<Version> {
        self.cache.find_selected(name, query)
    }
}

/// Directories directly below `root` holding a manifest. Scoped packages
/// (`@org/name`) sit one level deeper.
fn find_manifests(root: &Utf8Path) -> RegistryResult<Vec<Utf8PathBuf>> {
    let mut dirs = Vec::new();
    for entry in WalkDir::new(root).min_depth(1).max_depth(2).sort_by_file_name() {
        let entry = entry.map_err(|e| {
            let message = format!("Failed to scan {}", root);
            match e.into_io_error() {
                Some(source) => BrioError::io(message, source),
                None => BrioError::ConfigValidation {
                    field: "local packages".to_string(),
                    reason: message,
                },
            }
        })?;
        if !entry.file_type().is_dir() {
            continue;
        }

        let Ok(dir) = Utf8PathBuf::from_path_buf(entry.into_path()) else {
            continue;
        };
        let scoped = dir
            .parent()
            .and_then(Utf8Path::file_name)
            .is_some_and(|parent| parent.starts_with('@'));
        let depth_ok = dir.parent() == Some(root) || scoped;

        if depth_ok && dir.join(MANIFEST_FILE).is_file() {
            dirs.push(dir);
        }
    }
    Ok(dirs)
}

fn read_local(dir: Utf8PathBuf, vendor: bool) -> RegistryResult<LocalPackage> {
    let path = dir.join(MANIFEST_FILE);
    let content = std::fs::read_to_string(&path)
        .map_err(|e| BrioError::io(format!("Failed to read {}", path), e))?;
    let manifest = parse_manifest(&content).map_err(|e| match e {
        BrioError::TomlParse { message, .. } => BrioError::TomlParse {
            path: path.to_string(),
            message,
        },
        other => other,
    })?;
    check_package_kind(&path, &manifest)?;

    Ok(LocalPackage { vendor, path: dir, manifest })
}

fn check_package_kind(path: &Utf8Path, manifest: &brio_config::Manifest) -> RegistryResult<()> {
    if manifest.is_app() {
        return Err(BrioError::identity(
            path.as_str(),
            format!("'{}' is an application and cannot be used as a dependency", manifest.name()),
        ));
    }
    Ok(())
}
