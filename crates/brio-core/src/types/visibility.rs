//! Propagation scope tokens for flags, definitions and links.

use serde::{Deserialize, Serialize};
use std::fmt;

/// PRIVATE / PUBLIC / INTERFACE scope
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Visibility {
    Private,
    Public,
    Interface,
}

impl Visibility {
    /// Recognize a visibility token, ignoring case and surrounding spaces
    pub fn from_token(token: &str) -> Option<Self> {
        match token.trim().to_ascii_uppercase().as_str() {
            "PRIVATE" => Some(Visibility::Private),
            "PUBLIC" => Some(Visibility::Public),
            "INTERFACE" => Some(Visibility::Interface),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Visibility::Private => "PRIVATE",
            Visibility::Public => "PUBLIC",
            Visibility::Interface => "INTERFACE",
        }
    }
}

impl Default for Visibility {
    fn default() -> Self {
        Visibility::Private
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a visibility setting applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum VisibilitySubject {
    Flags,
    Definitions,
    Link,
}

impl fmt::Display for VisibilitySubject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            VisibilitySubject::Flags => "flags",
            VisibilitySubject::Definitions => "definitions",
            VisibilitySubject::Link => "link",
        })
    }
}

/// A recovered visibility problem: the declared token was replaced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VisibilityWarning {
    pub package: String,
    pub subject: VisibilitySubject,
    pub declared: String,
    pub used: Visibility,
    pub reason: VisibilityIssue,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum VisibilityIssue {
    /// header-only targets can only be INTERFACE
    HeaderOnly,
    /// not one of PRIVATE, PUBLIC, INTERFACE
    Unrecognized,
}

impl fmt::Display for VisibilityWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.reason {
            VisibilityIssue::HeaderOnly => write!(
                f,
                "{}: {} visibility {} ignored for header-only package, using {}",
                self.package, self.subject, self.declared, self.used
            ),
            VisibilityIssue::Unrecognized => write!(
                f,
                "{}: unknown {} visibility '{}', using {}",
                self.package, self.subject, self.declared, self.used
            ),
        }
    }
}
