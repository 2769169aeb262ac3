//! Flag and definition propagation
//!
//! Every configured package receives flags and definitions from three places:
//!
//! - GLOBAL: values offered by the project's target to every package
//! - REQUIRED: values the package demands from its parent (or, failing
//!   that, from any ancestor or the globals)
//! - other: whatever else the parent hands down
//!
//! Missing global or required values are fatal. Values a package refuses
//! through `allow-only-global` / `allow-only-required` are dropped with a
//! warning.

use regex::Regex;
use tracing::warn;

use brio_config::{DefinitionsSection, FlagsSection};
use brio_core::error::BrioError;
use brio_core::types::{Visibility, VisibilityIssue, VisibilitySubject, VisibilityWarning};

use crate::targets::Definitions;
use crate::ResolveResult;

const FLAG: &str = "flag";
const DEFINITION: &str = "definition";

/// Check for a `$(NAME)` placeholder, NAME being `[a-zA-Z_-][a-zA-Z0-9_]*`
pub fn is_placeholder(value: &str) -> bool {
    placeholder_key(value).is_some()
}

fn placeholder_key(value: &str) -> Option<&str> {
    let key = value.trim().strip_prefix("$(")?.strip_suffix(')')?;
    let mut chars = key.chars();
    let first = chars.next()?;
    let valid = (first.is_ascii_alphabetic() || first == '_' || first == '-')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
    valid.then_some(key)
}

/// Match a supplied value against a requested key.
///
/// `given` matches `^key\b`: it starts with `key` and a word boundary
/// follows. A `key->value` form yields `value`; any other match yields
/// `given` unchanged.
pub fn try_match(key: &str, given: &str) -> Option<String> {
    let pattern = Regex::new(&format!(r"^{}\b", regex::escape(key))).ok()?;
    let found = pattern.find(given)?;
    match given[found.end()..].strip_prefix("->") {
        Some(mapped) => Some(mapped.to_string()),
        None => Some(given.to_string()),
    }
}

/// Substitute placeholders in the values a parent hands to `dependency`.
///
/// Plain values pass through. A placeholder takes the first of the parent's
/// own values it matches; an unmatched or malformed placeholder is fatal.
pub fn fill_placeholders(
    dependency: &str,
    supplied: &[String],
    requested: &[String],
) -> ResolveResult<Vec<String>> {
    let mut filled = Vec::with_capacity(requested.len());
    for value in requested {
        let trimmed = value.trim();
        if !trimmed.starts_with("$(") {
            filled.push(value.clone());
            continue;
        }

        let matched = placeholder_key(trimmed)
            .and_then(|key| supplied.iter().find_map(|given| try_match(key, given)));
        match matched {
            Some(result) => filled.push(result),
            None => {
                return Err(BrioError::InvalidPlaceholderReference {
                    package: dependency.to_string(),
                    placeholder: value.clone(),
                })
            }
        }
    }
    Ok(filled)
}

/// Append each value not already present
pub(crate) fn append_unique<I>(all: &mut Vec<String>, values: I)
where
    I: IntoIterator<Item = String>,
{
    for value in values {
        if !all.contains(&value) {
            all.push(value);
        }
    }
}

fn missing(package: &str, category: &str, what: &str, flag: &str) -> BrioError {
    BrioError::FlagConstraint {
        package: package.to_string(),
        category: category.to_string(),
        what: what.to_string(),
        flag: flag.to_string(),
    }
}

/// Fill every requested global value from the project's globals
pub(crate) fn fill_global(
    package: &str,
    what: &str,
    globals: &[String],
    requested: &[String],
) -> ResolveResult<Vec<String>> {
    requested
        .iter()
        .map(|key| {
            globals
                .iter()
                .find_map(|given| try_match(key, given))
                .ok_or_else(|| missing(package, "global", what, key))
        })
        .collect()
}

/// Values on offer to one package: what its parent handed down, then the
/// values each ancestor received (nearest first), then the globals.
pub struct Supply<'s> {
    given: &'s [String],
    fallbacks: Vec<&'s [String]>,
    consumed: Vec<bool>,
}

impl<'s> Supply<'s> {
    pub fn new(given: &'s [String], ancestors: &[&'s [String]], globals: &'s [String]) -> Self {
        let mut fallbacks = ancestors.to_vec();
        fallbacks.push(globals);
        Self {
            given,
            fallbacks,
            consumed: vec![false; given.len()],
        }
    }

    fn take_given(&mut self, key: &str) -> Option<String> {
        for (index, given) in self.given.iter().enumerate() {
            if let Some(value) = try_match(key, given) {
                self.consumed[index] = true;
                return Some(value);
            }
        }
        None
    }

    /// Fill a required value, searching the parent first
    fn take(&mut self, key: &str) -> Option<String> {
        self.take_given(key).or_else(|| {
            self.fallbacks
                .iter()
                .find_map(|values| values.iter().find_map(|given| try_match(key, given)))
        })
    }

    fn take_required(
        &mut self,
        package: &str,
        what: &str,
        requested: &[String],
    ) -> ResolveResult<Vec<String>> {
        requested
            .iter()
            .map(|key| self.take(key).ok_or_else(|| missing(package, "required", what, key)))
            .collect()
    }

    /// Parent values no required or optional request consumed
    fn leftovers(&self) -> Vec<String> {
        self.given
            .iter()
            .zip(&self.consumed)
            .filter(|(_, used)| !**used)
            .map(|(value, _)| value.clone())
            .collect()
    }
}

/// Compute the flags `package` is built with
pub fn propagate_flags(
    package: &str,
    section: &FlagsSection,
    globals: &[String],
    supply: &mut Supply<'_>,
) -> ResolveResult<Vec<String>> {
    let mut all = Vec::new();
    append_unique(&mut all, fill_global(package, FLAG, globals, &section.global)?);

    if section.allow_only_global {
        let ignored = supply.leftovers();
        if !ignored.is_empty() || !section.required.is_empty() {
            warn!(
                "{} accepts only global flags, ignoring {:?} and required {:?}",
                package, ignored, section.required
            );
        }
    } else {
        let required = supply.take_required(package, FLAG, &section.required)?;
        append_unique(&mut all, required);

        let other = supply.leftovers();
        if section.allow_only_required && !other.is_empty() {
            warn!("{} accepts only required flags, ignoring {:?}", package, other);
        } else {
            append_unique(&mut all, other);
        }
    }

    append_unique(&mut all, section.included.iter().cloned());
    Ok(all)
}

/// Compute the PRIVATE and PUBLIC definitions `package` is built with
pub fn propagate_definitions(
    package: &str,
    section: &DefinitionsSection,
    globals: &[String],
    supply: &mut Supply<'_>,
) -> ResolveResult<Definitions> {
    let mut all = Definitions::default();
    append_unique(&mut all.private, fill_global(package, DEFINITION, globals, &section.global.private)?);
    append_unique(&mut all.public, fill_global(package, DEFINITION, globals, &section.global.public)?);

    if section.singleton || section.allow_only_global {
        let ignored = supply.leftovers();
        if !ignored.is_empty() {
            warn!("{} accepts only global definitions, ignoring {:?}", package, ignored);
        }
    } else {
        let required_private = supply.take_required(package, DEFINITION, &section.required.private)?;
        let required_public = supply.take_required(package, DEFINITION, &section.required.public)?;
        append_unique(&mut all.private, required_private);
        append_unique(&mut all.public, required_public);

        let optional_private: Vec<String> =
            section.optional.private.iter().filter_map(|key| supply.take_given(key)).collect();
        let optional_public: Vec<String> =
            section.optional.public.iter().filter_map(|key| supply.take_given(key)).collect();
        append_unique(&mut all.private, optional_private);
        append_unique(&mut all.public, optional_public);

        let other = supply.leftovers();
        if section.allow_only_required && !other.is_empty() {
            warn!("{} accepts only required definitions, ignoring {:?}", package, other);
        } else {
            append_unique(&mut all.private, other);
        }
    }

    append_unique(&mut all.private, section.included.private.iter().cloned());
    append_unique(&mut all.public, section.included.public.iter().cloned());
    Ok(all)
}

/// Decide the visibility actually used for `subject`.
///
/// Header-only packages always use INTERFACE. Otherwise an unset token means
/// PRIVATE and an unknown token falls back to PRIVATE. Any replacement of a
/// declared token is reported, never rejected.
pub fn resolve_visibility(
    package: &str,
    subject: VisibilitySubject,
    declared: Option<&str>,
    header_only: bool,
) -> (Visibility, Option<VisibilityWarning>) {
    let declared = declared.map(str::trim).filter(|token| !token.is_empty());
    let parsed = declared.map(Visibility::from_token);

    let (used, reason) = match (header_only, parsed) {
        (true, None) | (true, Some(Some(Visibility::Interface))) => (Visibility::Interface, None),
        (true, Some(_)) => (Visibility::Interface, Some(VisibilityIssue::HeaderOnly)),
        (false, None) => (Visibility::Private, None),
        (false, Some(Some(visibility))) => (visibility, None),
        (false, Some(None)) => (Visibility::Private, Some(VisibilityIssue::Unrecognized)),
    };

    let warning = reason.map(|reason| VisibilityWarning {
        package: package.to_string(),
        subject,
        declared: declared.unwrap_or_default().to_string(),
        used,
        reason,
    });
    if let Some(warning) = &warning {
        warn!("{}", warning);
    }
    (used, warning)
}
