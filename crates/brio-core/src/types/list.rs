//! Sorted, duplicate-free version lists.

use serde::Serialize;

use super::query::Query;
use super::version::Version;

/// Ascending list of distinct versions
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct VersionList {
    versions: Vec<Version>,
}

impl VersionList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a list from advertised version strings, skipping anything that
    /// does not parse.
    pub fn from_strings<'a, I>(texts: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        texts.into_iter().filter_map(|t| Version::parse(t).ok()).collect()
    }

    /// Insert a version, keeping the list sorted. Returns false if an equal
    /// version was already present; an untagged version still replaces a
    /// tagged one.
    pub fn insert(&mut self, version: Version) -> bool {
        match self.versions.binary_search(&version) {
            Ok(pos) => {
                if version.tag < self.versions[pos].tag {
                    self.versions[pos] = version;
                }
                false
            },
            Err(pos) => {
                self.versions.insert(pos, version);
                true
            },
        }
    }

    /// Highest version in the list that satisfies `query`
    pub fn find(&self, query: &Query) -> Option<&Version> {
        self.versions.iter().rev().find(|v| query.matches(v))
    }

    pub fn contains(&self, version: &Version) -> bool {
        self.versions.binary_search(version).is_ok()
    }

    pub fn first(&self) -> Option<&Version> {
        self.versions.first()
    }

    pub fn last(&self) -> Option<&Version> {
        self.versions.last()
    }

    pub fn len(&self) -> usize {
        self.versions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.versions.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Version> {
        self.versions.iter()
    }

    pub fn as_slice(&self) -> &[Version] {
        &self.versions
    }
}

impl FromIterator<Version> for VersionList {
    fn from_iter<T: IntoIterator<Item = Version>>(iter: T) -> Self {
        let mut versions: Vec<Version> = iter.into_iter().collect();
        // among equal versions the untagged one sorts first and survives dedup
        versions.sort_by(|a, b| a.cmp(b).then_with(|| a.tag.cmp(&b.tag)));
        versions.dedup();
        Self { versions }
    }
}

impl<'a> IntoIterator for &'a VersionList {
    type Item = &'a Version;
    type IntoIter = std::slice::Iter<'a, Version>;

    fn into_iter(self) -> Self::IntoIter {
        self.versions.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list(texts: &[&str]) -> VersionList {
        VersionList::from_strings(texts.iter().copied())
    }

    #[test]
    fn test_from_strings_sorts_and_skips_invalid() {
        let l = list(&["2.0.0", "garbage", "1.0.0", "1.2", "1.2.0", "1.0.0"]);
        let rendered: Vec<String> = l.iter().map(|v| v.to_string()).collect();
        assert_eq!(rendered, vec!["1.0.0", "1.2.0", "2.0.0"]);
    }

    #[test]
    fn test_untagged_version_wins_over_tagged() {
        for texts in [["1.2.3-beta", "1.2.3"], ["1.2.3", "1.2.3-beta"]] {
            let l = list(&texts);
            assert_eq!(l.len(), 1);
            assert_eq!(l.as_slice()[0].to_string(), "1.2.3");
        }

        let l = list(&["1.2.3-rc", "1.2.3-alpha"]);
        assert_eq!(l.as_slice()[0].to_string(), "1.2.3-alpha");

        let mut l = list(&["1.2.3-beta"]);
        assert!(!l.insert(Version::new(1, 2, 3)));
        assert_eq!(l.as_slice()[0].tag, None);
        assert!(!l.insert(Version::parse("1.2.3-rc").unwrap()));
        assert_eq!(l.as_slice()[0].tag, None);
    }

    #[test]
    fn test_insert_dedupes() {
        let mut l = list(&["1.0.0", "3.0.0"]);
        assert!(l.insert(Version::new(2, 0, 0)));
        assert!(!l.insert(Version::new(2, 0, 0)));
        assert_eq!(l.len(), 3);
        assert_eq!(l.as_slice()[1], Version::new(2, 0, 0));
    }

    #[test]
    fn test_find_highest_match() {
        let l = list(&["1.0.0", "1.4.2", "1.9.0", "2.0.0"]);
        let q = Query::parse("<1.5.0").unwrap();
        assert_eq!(l.find(&q), Some(&Version::new(1, 4, 2)));

        let q = Query::parse("3.x").unwrap();
        assert_eq!(l.find(&q), None);
    }
}
