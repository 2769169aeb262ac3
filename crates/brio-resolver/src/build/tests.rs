//! Unit tests for build target computation

use super::*;
use std::fs;
use camino::Utf8PathBuf;
use tempfile::TempDir;

use brio_config::toml::parse_manifest;
use brio_core::types::VisibilityIssue;
use brio_registry::MemoryRegistry;

use crate::tree::Resolver;

fn project() -> (TempDir, Utf8PathBuf) {
    let tmp = TempDir::new().unwrap();
    let base = Utf8PathBuf::from_path_buf(tmp.path().to_path_buf()).unwrap();
    (tmp, base)
}

/// Write an installed package manifest. `body` continues the `[package]` table.
fn install(base: &Utf8PathBuf, name: &str, version: &str, body: &str) {
    let dir = base.join(".brio/modules").join(format!("{}__{}", name, version));
    fs::create_dir_all(&dir).unwrap();
    fs::write(
        dir.join("brio.toml"),
        format!("[package]\nname = \"{}\"\nversion = \"{}\"\n{}", name, version, body),
    )
    .unwrap();
}

fn app(body: &str) -> Manifest {
    parse_manifest(&format!(
        "[package]\nname = \"app\"\nversion = \"0.1.0\"\nkind = \"app\"\n{}",
        body
    ))
    .unwrap()
}

async fn build(base: Utf8PathBuf, manifest: &Manifest, target: Option<&str>) -> ResolveResult<BuildOutput> {
    let session = RegistrySession::new(MemoryRegistry::new(), base);
    let root = Resolver::new(&session).resolve_root(manifest).await?;
    create_build_targets(&session, manifest, &root, target).await
}

#[tokio::test]
async fn test_identical_siblings_collapse() {
    let (_tmp, base) = project();
    install(&base, "libA", "1.0.0", "\n[dependencies]\nlibC = \"1.0.0\"\n");
    install(&base, "libB", "1.0.0", "\n[dependencies]\nlibC = \"1.0.0\"\n");
    install(&base, "libC", "1.0.0", "");

    let manifest = app("\n[dependencies]\nlibA = \"1.0.0\"\nlibB = \"1.0.0\"\n");
    let output = build(base, &manifest, None).await.unwrap();

    assert_eq!(output.targets.len(), 3);
    assert_eq!(output.targets.links().len(), 4);
    let into_c = output.targets.links().iter().filter(|link| link.to == "libC").count();
    assert_eq!(into_c, 2);
    assert!(output.warnings.is_empty());
}

#[tokio::test]
async fn test_single_flag_change_splits_target() {
    let (_tmp, base) = project();
    install(&base, "libA", "1.0.0", "\n[dependencies]\nlibC = \"1.0.0\"\n");
    install(
        &base,
        "libB",
        "1.0.0",
        "\n[dependencies]\nlibC = { version = \"1.0.0\", flags = [\"-DFAST\"] }\n",
    );
    install(&base, "libC", "1.0.0", "");

    let manifest = app("\n[dependencies]\nlibA = \"1.0.0\"\nlibB = \"1.0.0\"\n");
    let output = build(base, &manifest, None).await.unwrap();

    assert_eq!(output.targets.len(), 4);
    assert!(output.targets.get("libC").unwrap().flags.is_empty());
    assert_eq!(output.targets.get("libC__2").unwrap().flags, vec!["-DFAST"]);

    let link = output.targets.links().iter().find(|link| link.from == "libB").unwrap();
    assert_eq!(link.to, "libC__2");
}

#[tokio::test]
async fn test_required_flag_from_ancestor() {
    let (_tmp, base) = project();
    install(&base, "libA", "1.0.0", "\n[dependencies]\nlibB = \"1.0.0\"\n");
    install(&base, "libB", "1.0.0", "\n[flags]\nrequired = [\"-DFOO\"]\n");

    let manifest = app("\n[dependencies]\nlibA = { version = \"1.0.0\", flags = [\"-DFOO\"] }\n");
    let output = build(base, &manifest, None).await.unwrap();

    assert_eq!(output.targets.get("libB").unwrap().flags, vec!["-DFOO"]);
}

#[tokio::test]
async fn test_required_flag_missing() {
    let (_tmp, base) = project();
    install(&base, "libA", "1.0.0", "\n[dependencies]\nlibB = \"1.0.0\"\n");
    install(&base, "libB", "1.0.0", "\n[flags]\nrequired = [\"-DFOO\"]\n");

    let manifest = app("\n[dependencies]\nlibA = \"1.0.0\"\n");
    let err = build(base, &manifest, None).await.unwrap_err();

    assert!(matches!(err, BrioError::FlagConstraint { ref package, ref flag, .. }
        if package == "libB" && flag == "-DFOO"));
}

#[tokio::test]
async fn test_header_only_coercion_is_a_warning() {
    let (_tmp, base) = project();
    install(
        &base,
        "libH",
        "1.0.0",
        "header-only = true\n\n[flags]\nvisibility = \"PRIVATE\"\n\n[dependencies]\nlibC = { version = \"1.0.0\", link-visibility = \"PUBLIC\" }\n",
    );
    install(&base, "libC", "1.0.0", "");

    let manifest = app("\n[dependencies]\nlibH = \"1.0.0\"\n");
    let output = build(base, &manifest, None).await.unwrap();

    let header = output.targets.get("libH").unwrap();
    assert!(header.header_only);
    assert_eq!(header.flags_visibility, Visibility::Interface);
    assert_eq!(header.definitions_visibility, Visibility::Interface);

    let link = output.targets.links().iter().find(|link| link.from == "libH").unwrap();
    assert_eq!(link.visibility, Visibility::Interface);

    assert_eq!(output.warnings.len(), 2);
    assert!(output.warnings.iter().all(|w| w.reason == VisibilityIssue::HeaderOnly));
    assert_eq!(output.warnings[0].subject, VisibilitySubject::Flags);
    assert_eq!(output.warnings[1].subject, VisibilitySubject::Link);
}

#[tokio::test]
async fn test_globals_and_placeholders() {
    let (_tmp, base) = project();
    install(
        &base,
        "libA",
        "1.0.0",
        "\n[flags]\nglobal = [\"F_CPU\"]\n\n[dependencies]\nlibB = { version = \"1.0.0\", flags = [\"$(-DF_CPU)\", \"-Os\"] }\n",
    );
    install(&base, "libB", "1.0.0", "");

    let manifest = app(
        "default-target = \"uno\"\n\n[dependencies]\nlibA = \"1.0.0\"\n\n[targets.uno]\nglobal-flags = [\"F_CPU->-DF_CPU=16000000L\"]\nlink-flags = [\"-Wl,--gc-sections\"]\n",
    );
    let output = build(base, &manifest, None).await.unwrap();

    assert_eq!(output.targets.get("libA").unwrap().flags, vec!["-DF_CPU=16000000L"]);
    assert_eq!(output.targets.get("libB").unwrap().flags, vec!["-DF_CPU=16000000L", "-Os"]);

    let main = output.targets.links().iter().find(|link| link.from == MAIN_TARGET).unwrap();
    assert_eq!(main.flags, vec!["-Wl,--gc-sections"]);
}

#[tokio::test]
async fn test_unmatched_placeholder_names_dependency() {
    let (_tmp, base) = project();
    install(
        &base,
        "libA",
        "1.0.0",
        "\n[dependencies]\nlibB = { version = \"1.0.0\", flags = [\"$(STD)\"] }\n",
    );
    install(&base, "libB", "1.0.0", "");

    let manifest = app("\n[dependencies]\nlibA = \"1.0.0\"\n");
    let err = build(base, &manifest, None).await.unwrap_err();

    assert!(matches!(err, BrioError::InvalidPlaceholderReference { ref package, .. } if package == "libB"));
}

#[tokio::test]
async fn test_package_root_is_built() {
    let (_tmp, base) = project();
    install(&base, "libA", "1.0.0", "");

    let manifest = parse_manifest(
        "[package]\nname = \"libP\"\nversion = \"0.1.0\"\ndefault-target = \"test\"\n\n[dependencies]\nlibA = \"1.0.0\"\n\n[targets.test]\npackage-flags = [\"-O2\", \"-lm\"]\npackage-definitions = [\"TESTING\"]\n",
    )
    .unwrap();
    let output = build(base.clone(), &manifest, None).await.unwrap();

    let root = output.targets.get("libP").unwrap();
    assert_eq!(root.flags, vec!["-O2"]);
    assert_eq!(root.definitions.private, vec!["TESTING"]);
    assert_eq!(root.path, base);
    assert!(output.targets.get("libA").is_some());

    let main = output.targets.links().iter().find(|link| link.from == MAIN_TARGET).unwrap();
    assert_eq!(main.to, "libP");
    assert_eq!(main.visibility, Visibility::Private);
    assert_eq!(main.flags, vec!["-lm"]);
}

#[tokio::test]
async fn test_unknown_target() {
    let (_tmp, base) = project();
    let manifest = app("");

    let err = build(base, &manifest, Some("mega")).await.unwrap_err();
    assert!(matches!(err, BrioError::ConfigValidation { ref field, .. } if field == "targets.mega"));
}

#[tokio::test]
async fn test_package_must_be_on_disk() {
    let (_tmp, base) = project();
    let registry = MemoryRegistry::new();
    registry.publish("libR", "1.0.0", &[]);
    let session = RegistrySession::new(registry, base);

    let manifest = app("\n[dependencies]\nlibR = \"^1.0.0\"\n");
    let root = Resolver::new(&session).resolve_root(&manifest).await.unwrap();
    let err = create_build_targets(&session, &manifest, &root, None).await.unwrap_err();

    assert!(matches!(err, BrioError::PackageVersionNotFound { ref name, .. } if name == "libR"));
}
