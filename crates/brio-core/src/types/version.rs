//! Three-component version values.
//!
//! A [`Version`] is `MAJOR.MINOR.PATCH` with an optional trailing tag
//! (`1.2.3-beta`, `1.2.3-rc.1`). The tag is kept for display but takes no
//! part in ordering or equality, so `1.2.3-beta == 1.2.3`.

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use crate::error::{BrioError, BrioResult};

/// Immutable version value (major.minor.patch[-tag])
#[derive(Debug, Clone)]
pub struct Version {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
    pub tag: Option<String>,
}

impl Version {
    /// Create a new version without a tag
    pub fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            major,
            minor,
            patch,
            tag: None,
        }
    }

    /// Parse version text, stripping a leading `=` and then a leading `v`.
    pub fn parse(text: &str) -> BrioResult<Self> {
        let input = text.trim();
        let invalid = || BrioError::InvalidVersionFormat {
            input: text.to_string(),
        };

        let body = input.strip_prefix('=').unwrap_or(input);
        let body = body.strip_prefix('v').unwrap_or(body);

        let (core, tag) = match body.split_once('-') {
            Some((core, tag)) => {
                if !is_valid_tag(tag) {
                    return Err(invalid());
                }
                (core, Some(tag.to_string()))
            },
            None => (body, None),
        };

        let mut parts = core.split('.');
        let (Some(major), Some(minor), Some(patch), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(invalid());
        };

        Ok(Version {
            major: parse_component(major).ok_or_else(invalid)?,
            minor: parse_component(minor).ok_or_else(invalid)?,
            patch: parse_component(patch).ok_or_else(invalid)?,
            tag,
        })
    }

    /// Check whether text is a complete version
    pub fn is_valid(text: &str) -> bool {
        Self::parse(text).is_ok()
    }

    /// Normalized `M.m.p` form without the tag
    pub fn core_string(&self) -> String {
        format!("{}.{}.{}", self.major, self.minor, self.patch)
    }

    fn triple(&self) -> (u64, u64, u64) {
        (self.major, self.minor, self.patch)
    }
}

/// Parse a purely numeric version component
pub(crate) fn parse_component(text: &str) -> Option<u64> {
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    text.parse().ok()
}

// tag := [0-9a-zA-Z]+ ( "." [0-9]+ )?
pub(crate) fn is_valid_tag(tag: &str) -> bool {
    let (word, number) = match tag.split_once('.') {
        Some((word, number)) => (word, Some(number)),
        None => (tag, None),
    };
    let word_ok = !word.is_empty() && word.bytes().all(|b| b.is_ascii_alphanumeric());
    let number_ok = number.map_or(true, |n| parse_component(n).is_some());
    word_ok && number_ok
}

impl FromStr for Version {
    type Err = BrioError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Version::parse(s)
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)?;

        if let Some(ref tag) = self.tag {
            write!(f, "-{}", tag)?;
        }

        Ok(())
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.triple() == other.triple()
    }
}

impl Eq for Version {}

impl Hash for Version {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.triple().hash(state);
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        self.triple().cmp(&other.triple())
    }
}

impl Serialize for Version {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Version {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Version::parse(&text).map_err(de::Error::custom)
    }
}
