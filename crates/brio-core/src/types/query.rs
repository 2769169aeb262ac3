//! Version constraint expressions.
//!
//! [`Query::parse`] classifies constraint text in a fixed order:
//!
//! 1. exact version (`1.2.3`, `=1.2.3`, `v1.2.3`) → `= v`
//! 2. disjunction (`1.x || >=3`) → any alternative
//! 3. hyphen range (`1.2 - 2.3.4`)
//! 4. conjunction of two comparators (`>=1.2.3 <2`)
//! 5. single comparator (`>=1.2`, `<3.x`), zero-filled
//! 6. tilde (`~1.2.3`), falling back to rule 8 when not a full version
//! 7. caret (`^0.2.3`)
//! 8. bare/partial/wildcard (`1.2`, `1.x`, `*`, empty)
//!
//! Tilde, caret and bare operands may carry a leading `=` and `v`
//! (`^=1.2.3`, `=v1.x`). Past the largest representable component an upper
//! bound is left open.
//!
//! Anything else is rejected with
//! [`BrioError::InvalidConstraintExpression`].

use std::fmt;
use std::str::FromStr;

use super::list::VersionList;
use super::version::{is_valid_tag, parse_component, Version};
use crate::error::{BrioError, BrioResult};

/// Comparison operator of a single bound
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    Eq,
    Lt,
    Le,
    Gt,
    Ge,
}

impl Op {
    pub fn symbol(&self) -> &'static str {
        match self {
            Op::Eq => "=",
            Op::Lt => "<",
            Op::Le => "<=",
            Op::Gt => ">",
            Op::Ge => ">=",
        }
    }

    fn is_lower(&self) -> bool {
        matches!(self, Op::Gt | Op::Ge)
    }

    fn is_upper(&self) -> bool {
        matches!(self, Op::Lt | Op::Le)
    }
}

/// One-sided (or exact) constraint on a version
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bound {
    pub op: Op,
    pub version: Version,
}

impl Bound {
    pub fn new(op: Op, version: Version) -> Self {
        Self { op, version }
    }

    pub fn matches(&self, v: &Version) -> bool {
        match self.op {
            Op::Eq => *v == self.version,
            Op::Lt => *v < self.version,
            Op::Le => *v <= self.version,
            Op::Gt => *v > self.version,
            Op::Ge => *v >= self.version,
        }
    }

    /// Pick a candidate from an ascending list.
    ///
    /// Lower bounds only ever look at the highest element: if the newest
    /// advertised version does not satisfy `>=`/`>`, nothing is chosen.
    pub fn find_best<'a>(&self, list: &'a VersionList) -> Option<&'a Version> {
        match self.op {
            Op::Eq => list.iter().find(|v| **v == self.version),
            Op::Lt | Op::Le => list.iter().rev().find(|v| self.matches(v)),
            Op::Gt | Op::Ge => list.last().filter(|v| self.matches(v)),
        }
    }
}

impl fmt::Display for Bound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.op.symbol(), self.version)
    }
}

/// Parsed constraint expression
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Query {
    /// `op version`
    Single(Bound),
    /// `lower` (`>`/`>=`) and `upper` (`<`/`<=`) must both hold
    Dual { lower: Bound, upper: Bound },
    /// Any of the alternatives (`a || b`)
    Any(Vec<Query>),
}

impl Query {
    pub fn exact(version: Version) -> Self {
        Query::Single(Bound::new(Op::Eq, version))
    }

    fn range(lower: Version, upper: Version) -> Self {
        Query::Dual {
            lower: Bound::new(Op::Ge, lower),
            upper: Bound::new(Op::Lt, upper),
        }
    }

    fn at_least(version: Version) -> Self {
        Query::Single(Bound::new(Op::Ge, version))
    }

    /// Classify and parse constraint text
    pub fn parse(text: &str) -> BrioResult<Self> {
        let input = text.trim();
        let invalid = || BrioError::InvalidConstraintExpression {
            input: text.to_string(),
        };

        if let Ok(v) = Version::parse(input) {
            return Ok(Query::exact(v));
        }

        if input.contains("||") {
            let alternatives = input
                .split("||")
                .map(|alt| Query::parse_simple(alt.trim()).ok_or_else(invalid))
                .collect::<BrioResult<Vec<_>>>()?;
            return Ok(Query::Any(alternatives));
        }

        Query::parse_simple(input).ok_or_else(invalid)
    }

    fn parse_simple(input: &str) -> Option<Self> {
        if let Ok(v) = Version::parse(input) {
            return Some(Query::exact(v));
        }

        if let Some((from, to)) = input.split_once(" - ") {
            return parse_hyphen_range(from.trim(), to.trim());
        }

        let tokens: Vec<&str> = input.split_whitespace().collect();
        match tokens.as_slice() {
            [] => Some(Query::at_least(Version::new(0, 0, 0))),
            [a, b] => parse_conjunction(a, b),
            [single] => parse_single(single),
            _ => None,
        }
    }

    pub fn matches(&self, v: &Version) -> bool {
        match self {
            Query::Single(bound) => bound.matches(v),
            Query::Dual { lower, upper } => lower.matches(v) && upper.matches(v),
            Query::Any(alternatives) => alternatives.iter().any(|q| q.matches(v)),
        }
    }

    /// Choose a version from an ascending list.
    ///
    /// A dual bound takes the upper bound's pick and accepts it only if the
    /// lower bound agrees. Alternatives yield the highest of their picks.
    pub fn find_best<'a>(&self, list: &'a VersionList) -> Option<&'a Version> {
        match self {
            Query::Single(bound) => bound.find_best(list),
            Query::Dual { lower, upper } => upper.find_best(list).filter(|v| lower.matches(v)),
            Query::Any(alternatives) => alternatives.iter().filter_map(|q| q.find_best(list)).max(),
        }
    }

    /// The pinned version, if this is an exact query
    pub fn as_exact(&self) -> Option<&Version> {
        match self {
            Query::Single(Bound { op: Op::Eq, version }) => Some(version),
            _ => None,
        }
    }
}

impl FromStr for Query {
    type Err = BrioError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Query::parse(s)
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Query::Single(bound) => write!(f, "{}", bound),
            Query::Dual { lower, upper } => write!(f, "{} {}", lower, upper),
            Query::Any(alternatives) => {
                for (i, q) in alternatives.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" || ")?;
                    }
                    write!(f, "{}", q)?;
                }
                Ok(())
            },
        }
    }
}

/// Leading numeric components of an incomplete version; everything from the
/// first wildcard on is dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Partial {
    parts: Vec<u64>,
}

impl Partial {
    fn parse(text: &str) -> Option<Self> {
        let text = text.strip_prefix('v').unwrap_or(text);
        let (core, tagged) = match text.split_once('-') {
            Some((core, tag)) if is_valid_tag(tag) => (core, true),
            Some(_) => return None,
            None => (text, false),
        };
        if core.is_empty() {
            return (!tagged).then(|| Partial { parts: Vec::new() });
        }

        let components: Vec<&str> = core.split('.').collect();
        if components.len() > 3 {
            return None;
        }

        let mut parts = Vec::with_capacity(3);
        let mut wildcard = false;
        for component in components {
            match component {
                "x" | "X" | "*" => wildcard = true,
                number => {
                    let value = parse_component(number)?;
                    if !wildcard {
                        parts.push(value);
                    }
                },
            }
        }
        Some(Partial { parts })
    }

    fn is_complete(&self) -> bool {
        self.parts.len() == 3
    }

    fn part(&self, i: usize) -> u64 {
        self.parts.get(i).copied().unwrap_or(0)
    }

    /// Zero-filled version
    fn floor(&self) -> Version {
        Version::new(self.part(0), self.part(1), self.part(2))
    }

    /// Smallest version above everything the given components cover.
    /// None when there is no such version or no components were given.
    fn ceiling(&self) -> Option<Version> {
        match self.parts.len() {
            1 => bump_major(self.part(0)),
            2 => bump_minor(self.part(0), self.part(1)),
            3 => bump_patch(self.part(0), self.part(1), self.part(2)),
            _ => None,
        }
    }

    /// Bare/partial/wildcard rule: span the omitted precision
    fn into_query(self) -> Query {
        if self.is_complete() {
            Query::exact(self.floor())
        } else {
            span(self.floor(), self.ceiling())
        }
    }
}

// Each bump carries into the next component up; past u64::MAX there is
// nothing above, so the range stays open.
fn bump_major(major: u64) -> Option<Version> {
    major.checked_add(1).map(|major| Version::new(major, 0, 0))
}

fn bump_minor(major: u64, minor: u64) -> Option<Version> {
    match minor.checked_add(1) {
        Some(minor) => Some(Version::new(major, minor, 0)),
        None => bump_major(major),
    }
}

fn bump_patch(major: u64, minor: u64, patch: u64) -> Option<Version> {
    match patch.checked_add(1) {
        Some(patch) => Some(Version::new(major, minor, patch)),
        None => bump_minor(major, minor),
    }
}

/// `>= lower`, capped by `< upper` when there is one
fn span(lower: Version, upper: Option<Version>) -> Query {
    match upper {
        Some(upper) => Query::range(lower, upper),
        None => Query::at_least(lower),
    }
}

/// Strip the optional `=` and then `v` allowed before bare, tilde and caret
/// operands. A prefix with nothing after it is rejected.
fn strip_eq_v(text: &str) -> Option<&str> {
    let rest = text.strip_prefix('=').unwrap_or(text);
    let rest = rest.strip_prefix('v').unwrap_or(rest);
    (rest.len() == text.len() || !rest.is_empty()).then_some(rest)
}

fn parse_comparator(text: &str) -> Option<Bound> {
    let (op, rest) = [(">=", Op::Ge), ("<=", Op::Le), (">", Op::Gt), ("<", Op::Lt)]
        .into_iter()
        .find_map(|(prefix, op)| text.strip_prefix(prefix).map(|rest| (op, rest)))?;
    if rest.is_empty() {
        return None;
    }
    let partial = Partial::parse(rest)?;
    Some(Bound::new(op, partial.floor()))
}

fn parse_single(token: &str) -> Option<Query> {
    if let Some(bound) = parse_comparator(token) {
        return Some(Query::Single(bound));
    }

    if let Some(rest) = token.strip_prefix('~') {
        let rest = strip_eq_v(rest)?;
        if let Ok(v) = Version::parse(rest) {
            let upper = bump_minor(v.major, v.minor);
            return Some(span(v, upper));
        }
        return Partial::parse(rest).map(Partial::into_query);
    }

    if let Some(rest) = token.strip_prefix('^') {
        let partial = Partial::parse(strip_eq_v(rest)?)?;
        return Some(caret(partial));
    }

    Partial::parse(strip_eq_v(token)?).map(Partial::into_query)
}

// ^ allows changes that keep the left-most non-zero given component
fn caret(partial: Partial) -> Query {
    let (major, minor, patch) = (partial.part(0), partial.part(1), partial.part(2));
    let upper = match partial.parts.len() {
        0 => return partial.into_query(),
        1 => bump_major(major),
        2 if major == 0 => bump_minor(0, minor),
        3 if major == 0 && minor == 0 => bump_patch(0, 0, patch),
        3 if major == 0 => bump_minor(0, minor),
        _ => bump_major(major),
    };
    span(partial.floor(), upper)
}

fn parse_hyphen_range(from: &str, to: &str) -> Option<Query> {
    let lower = Bound::new(Op::Ge, Partial::parse(from)?.floor());
    let to = Partial::parse(to)?;

    let upper = if to.is_complete() {
        Bound::new(Op::Le, to.floor())
    } else {
        match to.ceiling() {
            Some(ceiling) => Bound::new(Op::Lt, ceiling),
            None => return Some(Query::Single(lower)),
        }
    };
    Some(Query::Dual { lower, upper })
}

fn parse_conjunction(a: &str, b: &str) -> Option<Query> {
    let (a, b) = (parse_comparator(a)?, parse_comparator(b)?);
    let (lower, upper) = if a.op.is_lower() && b.op.is_upper() {
        (a, b)
    } else if b.op.is_lower() && a.op.is_upper() {
        (b, a)
    } else {
        return None;
    };
    Some(Query::Dual { lower, upper })
}
