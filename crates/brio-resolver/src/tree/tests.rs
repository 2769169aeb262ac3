//! Unit tests for tree resolution

use super::*;
use std::fs;
use camino::Utf8PathBuf;
use tempfile::TempDir;

use brio_config::toml::parse_manifest;
use brio_registry::MemoryRegistry;

fn project() -> (TempDir, Utf8PathBuf) {
    let tmp = TempDir::new().unwrap();
    let base = Utf8PathBuf::from_path_buf(tmp.path().to_path_buf()).unwrap();
    (tmp, base)
}

fn app(dependencies: &str) -> Manifest {
    parse_manifest(&format!(
        "[package]\nname = \"app\"\nversion = \"0.1.0\"\nkind = \"app\"\n\n[dependencies]\n{}",
        dependencies
    ))
    .unwrap()
}

fn registry() -> MemoryRegistry {
    let registry = MemoryRegistry::new();
    registry
        .publish("libA", "1.0.0", &[])
        .publish("libA", "1.4.2", &[("libC", "^0.3.0")])
        .publish("libA", "2.0.0", &[])
        .publish("libB", "2.1.0", &[])
        .publish("libB", "2.1.5", &[("libC", "^0.3.0")])
        .publish("libB", "2.2.0", &[])
        .publish("libC", "0.3.0", &[])
        .publish("libC", "0.3.4", &[])
        .publish("libC", "0.4.0", &[]);
    registry
}

#[tokio::test]
async fn test_end_to_end_selection() {
    let (_tmp, base) = project();
    let session = RegistrySession::new(registry(), base);
    let resolver = Resolver::new(&session);

    let root = resolver
        .resolve_root(&app("libA = \"^1.0.0\"\nlibB = \"~2.1.0\"\n"))
        .await
        .unwrap();

    assert_eq!(root.find("libA").unwrap().resolved, Some(Version::new(1, 4, 2)));
    assert_eq!(root.find("libB").unwrap().resolved, Some(Version::new(2, 1, 5)));
    assert_eq!(root.find("libC").unwrap().resolved, Some(Version::new(0, 3, 4)));
    assert_eq!(root.count(), 5);
}

#[tokio::test]
async fn test_tagged_duplicate_never_shadows_release() {
    // iteration order of the advertised versions varies between documents
    for _ in 0..40 {
        let source = MemoryRegistry::new();
        source
            .publish("libT", "1.2.3-beta", &[("libBeta", "1.0.0")])
            .publish("libT", "1.2.3", &[("libStable", "1.0.0")])
            .publish("libBeta", "1.0.0", &[])
            .publish("libStable", "1.0.0", &[]);

        let (_tmp, base) = project();
        let session = RegistrySession::new(source, base);
        let root = Resolver::new(&session)
            .resolve_root(&app("libT = \"^1.0.0\"\n"))
            .await
            .unwrap();

        let lib_t = root.find("libT").unwrap();
        assert_eq!(lib_t.resolved.as_ref().and_then(|v| v.tag.clone()), None);
        assert!(root.find("libStable").is_some());
        assert!(root.find("libBeta").is_none());
    }
}

#[tokio::test]
async fn test_same_constraint_fetched_once() {
    let (_tmp, base) = project();
    let session = RegistrySession::new(registry(), base);
    let resolver = Resolver::new(&session);

    let root = resolver
        .resolve_root(&app("libA = \"^1.0.0\"\nlibB = \"~2.1.0\"\n"))
        .await
        .unwrap();

    // libC ^0.3.0 is reached from both libA and libB
    let under_a = root.dependencies[0].find("libC").unwrap();
    let under_b = root.dependencies[1].find("libC").unwrap();
    assert_eq!(under_a.resolved, under_b.resolved);
    assert_eq!(session.source().fetch_count("libC"), 1);
    assert_eq!(session.get_res("libC", "^0.3.0"), Some(Version::new(0, 3, 4)));
}

#[tokio::test]
async fn test_lower_bound_prefers_highest_available() {
    let (_tmp, base) = project();
    let session = RegistrySession::new(registry(), base);
    let resolver = Resolver::new(&session);

    let root = resolver.resolve_root(&app("libA = \">=1.1.0\"\n")).await.unwrap();
    assert_eq!(root.dependencies[0].resolved, Some(Version::new(2, 0, 0)));
}

#[tokio::test]
async fn test_reuse_of_exact_pin() {
    let (_tmp, base) = project();
    let source = registry();
    source
        .publish("libD", "1.0.0", &[("libC", "0.3.0")])
        .publish("libE", "1.0.0", &[("libC", "^0.3.0")]);
    let session = RegistrySession::new(source, base);
    let resolver = Resolver::new(&session);

    let root = resolver
        .resolve_root(&app("libD = \"1.0.0\"\nlibE = \"1.0.0\"\n"))
        .await
        .unwrap();

    let pinned = root.dependencies[0].find("libC").unwrap();
    let ranged = root.dependencies[1].find("libC").unwrap();
    assert_eq!(pinned.resolved, Some(Version::new(0, 3, 0)));
    assert_eq!(ranged.resolved, Some(Version::new(0, 3, 0)));
}

#[tokio::test]
async fn test_unresolvable_constraint() {
    let (_tmp, base) = project();
    let session = RegistrySession::new(registry(), base);
    let resolver = Resolver::new(&session);

    let err = resolver.resolve_root(&app("libA = \"^9.0.0\"\n")).await.unwrap_err();
    assert!(matches!(err, BrioError::UnresolvableConstraint { ref name, .. } if name == "libA"));
}

#[tokio::test]
async fn test_unknown_package() {
    let (_tmp, base) = project();
    let session = RegistrySession::new(registry(), base);
    let resolver = Resolver::new(&session);

    let err = resolver.resolve_root(&app("libZ = \"^1.0.0\"\n")).await.unwrap_err();
    assert!(matches!(err, BrioError::PackageNotFound { .. }));
}

#[tokio::test]
async fn test_cycle_is_reported() {
    let (_tmp, base) = project();
    let source = MemoryRegistry::new();
    source
        .publish("a", "1.0.0", &[("b", "^1.0.0")])
        .publish("b", "1.0.0", &[("a", "^1.0.0")]);
    let session = RegistrySession::new(source, base);
    let resolver = Resolver::new(&session);

    let err = resolver.resolve_root(&app("a = \"1.0.0\"\n")).await.unwrap_err();
    match err {
        BrioError::CyclicDependency { cycle } => assert_eq!(cycle, "a -> b -> a"),
        other => panic!("Expected CyclicDependency, got {:?}", other),
    }
}

#[tokio::test]
async fn test_vendor_resolution_is_local() {
    let (_tmp, base) = project();
    let dir = base.join("vendor/libV");
    fs::create_dir_all(&dir).unwrap();
    fs::write(
        dir.join("brio.toml"),
        "[package]\nname = \"libV\"\nversion = \"1.2.0\"\n\n[dependencies]\nlibC = \"~0.3\"\n",
    )
    .unwrap();

    let session = RegistrySession::new(registry(), base);
    let resolver = Resolver::new(&session);

    let root = resolver
        .resolve_root(&app("libV = { version = \"^1.0.0\", vendor = true }\n"))
        .await
        .unwrap();

    let libv = root.find("libV").unwrap();
    assert!(libv.vendor);
    assert_eq!(libv.resolved, Some(Version::new(1, 2, 0)));
    assert_eq!(libv.dependencies[0].resolved, Some(Version::new(0, 3, 4)));
    assert_eq!(session.source().fetch_count("libV"), 0);
}

#[tokio::test]
async fn test_missing_vendor_package() {
    let (_tmp, base) = project();
    let session = RegistrySession::new(registry(), base);
    let resolver = Resolver::new(&session);

    let err = resolver
        .resolve_root(&app("libA = { version = \"^1.0.0\", vendor = true }\n"))
        .await
        .unwrap_err();
    assert!(matches!(err, BrioError::VendorPackageNotFound { .. }));
    assert_eq!(session.source().total_fetches(), 0);
}

#[tokio::test]
async fn test_render_tree() {
    let (_tmp, base) = project();
    let session = RegistrySession::new(registry(), base);
    let resolver = Resolver::new(&session);

    let root = resolver
        .resolve_root(&app("libA = \"^1.0.0\"\nlibB = \"2.1.0\"\n"))
        .await
        .unwrap();

    let expected = "\
app@0.1.0
|_ libA@1.4.2
|  \\_ libC@0.3.4
\\_ libB@2.1.0
";
    assert_eq!(root.to_string(), expected);
}
