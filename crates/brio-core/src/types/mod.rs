//! Core data types for brio.
//!
//! - Version values and sorted version lists
//! - Constraint queries over versions
//! - Visibility tokens shared by targets and links

pub mod list;
pub mod query;
pub mod version;
pub mod visibility;

pub use list::VersionList;
pub use query::{Bound, Op, Query};
pub use version::Version;
pub use visibility::{Visibility, VisibilityIssue, VisibilitySubject, VisibilityWarning};
