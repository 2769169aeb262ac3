//! Path helpers for package directories.

use std::path::{Component, Path};

/// Directory name used for a pinned package: `<name>__<version>`
pub fn versioned_dir_name(name: &str, version: &str) -> String {
    format!("{}__{}", name, version)
}

/// Check that a package name can be joined onto a base directory without
/// escaping it. Scoped names (`@org/pkg`) are allowed.
pub fn is_safe_component(name: &str) -> bool {
    if name.is_empty() {
        return false;
    }

    let path = Path::new(name);
    if path.is_absolute() {
        return false;
    }

    path.components().all(|c| matches!(c, Component::Normal(_)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_versioned_dir_name() {
        assert_eq!(versioned_dir_name("libA", "1.4.2"), "libA__1.4.2");
    }

    #[test]
    fn test_safe_components() {
        assert!(is_safe_component("libA"));
        assert!(is_safe_component("@org/libA"));

        assert!(!is_safe_component(""));
        assert!(!is_safe_component("../libA"));
        assert!(!is_safe_component("/etc"));
        assert!(!is_safe_component("a/../../b"));
    }
}
