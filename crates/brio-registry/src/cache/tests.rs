//! Unit tests for the session cache

use super::*;
use std::collections::HashMap;

fn package_data(name: &str, versions: &[&str]) -> PackageData {
    PackageData {
        name: name.to_string(),
        versions: versions
            .iter()
            .map(|v| {
                (
                    v.to_string(),
                    VersionRecord {
                        name: name.to_string(),
                        version: v.to_string(),
                        ..VersionRecord::default()
                    },
                )
            })
            .collect::<HashMap<_, _>>(),
        ..PackageData::default()
    }
}

fn local(name: &str, version: &str) -> LocalPackage {
    let manifest = brio_config::toml::parse_manifest(&format!(
        "[package]\nname = \"{}\"\nversion = \"{}\"\n",
        name, version
    ))
    .unwrap();
    LocalPackage {
        vendor: true,
        path: Utf8PathBuf::from(format!("vendor/{}", name)),
        manifest,
    }
}

#[test]
fn test_data_hits_and_misses() {
    let cache = SessionCache::new();
    assert!(cache.data("libA").is_none());

    cache.insert_data("libA", package_data("libA", &["1.0.0"]));
    assert_eq!(cache.data("libA").unwrap().name, "libA");

    let stats = cache.stats();
    assert_eq!(stats.hits, 1);
    assert_eq!(stats.misses, 1);
    assert_eq!(stats.packages, 1);
}

#[test]
fn test_version_falls_back_to_fetched_document() {
    let cache = SessionCache::new();
    cache.insert_data("libA", package_data("libA", &["1.0.0", "1.4.2"]));

    let record = cache.version("libA", "1.4.2").unwrap();
    assert_eq!(record.version, "1.4.2");
    assert!(cache.version("libA", "3.0.0").is_none());

    // Second lookup comes straight from the version table
    let again = cache.version("libA", "1.4.2").unwrap();
    assert!(Arc::ptr_eq(&record, &again));
}

#[test]
fn test_store_resolved_first_wins() {
    let cache = SessionCache::new();

    let first = cache.store_resolved("libA", "^1.0.0", Version::new(1, 4, 2));
    let second = cache.store_resolved("libA", "^1.0.0", Version::new(1, 0, 0));

    assert_eq!(first, Version::new(1, 4, 2));
    assert_eq!(second, Version::new(1, 4, 2));
    assert_eq!(cache.resolved("libA", "^1.0.0"), Some(Version::new(1, 4, 2)));
    assert_eq!(cache.stats().resolved, 1);
}

#[test]
fn test_find_selected() {
    let cache = SessionCache::new();
    cache.store_resolved("libA", "1.0.0", Version::new(1, 0, 0));
    cache.store_resolved("libA", "^1.2.0", Version::new(1, 4, 2));

    let query = Query::parse("^1.0.0").unwrap();
    assert_eq!(cache.find_selected("libA", &query), Some(Version::new(1, 4, 2)));

    let query = Query::parse("<1.1").unwrap();
    assert_eq!(cache.find_selected("libA", &query), Some(Version::new(1, 0, 0)));

    let query = Query::parse("^2").unwrap();
    assert_eq!(cache.find_selected("libA", &query), None);
    assert_eq!(cache.find_selected("libB", &query), None);
}

#[test]
fn test_local_packages() {
    let cache = SessionCache::new();
    cache.insert_local(local("libV", "1.0.0"));
    cache.insert_local(local("libV", "1.2.0"));
    cache.insert_local(local("libV", "1.2.0"));

    let list = cache.local_list("libV").unwrap();
    assert_eq!(list.len(), 2);
    assert_eq!(list.last(), Some(&Version::new(1, 2, 0)));

    let package = cache.local_package("libV", "1.2.0").unwrap();
    assert!(package.vendor);
    assert_eq!(package.name(), "libV");
    assert!(cache.local_package("libV", "2.0.0").is_none());
    assert_eq!(cache.stats().local_packages, 2);
}

#[test]
fn test_remote_fetch_counter() {
    let cache = SessionCache::new();
    cache.record_fetch();
    cache.record_fetch();
    assert_eq!(cache.stats().remote_fetches, 2);
}
