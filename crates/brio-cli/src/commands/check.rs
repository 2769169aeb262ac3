//! `brio check` command implementation.
//!
//! Evaluates a constraint against versions given on the command line, the
//! same way the resolver would against a registry's version list.

use brio_core::error::BrioResult;
use brio_core::types::{Query, Version, VersionList};

use super::CommandContext;

/// Outcome of checking one constraint
#[derive(Debug, PartialEq)]
pub struct CheckReport {
    pub query: Query,
    /// Given versions the query matches, in ascending order
    pub matching: Vec<Version>,
    /// What the resolver would pick from the given versions
    pub best: Option<Version>,
}

/// Parse `constraint` and every version, then match them
pub fn evaluate(constraint: &str, versions: &[String]) -> BrioResult<CheckReport> {
    let query = Query::parse(constraint)?;
    let list = versions
        .iter()
        .map(|text| Version::parse(text))
        .collect::<BrioResult<VersionList>>()?;

    let matching = list.iter().filter(|v| query.matches(v)).cloned().collect();
    let best = query.find_best(&list).cloned();
    Ok(CheckReport { query, matching, best })
}

/// Execute the `brio check` command
pub fn execute(constraint: &str, versions: &[String], ctx: &CommandContext) -> BrioResult<CheckReport> {
    let report = evaluate(constraint, versions)?;

    ctx.output.info(&format!("'{}' parsed as {}", constraint, report.query));
    for version in &report.matching {
        ctx.output.print(&format!("matches {}", version));
    }
    match &report.best {
        Some(best) => ctx.output.success(&format!("best: {}", best)),
        None => ctx.output.warn("no version would be selected"),
    }
    Ok(report)
}
