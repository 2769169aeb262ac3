//! `brio targets` command implementation.
//!
//! Resolves the project, computes its build targets and either prints them
//! or writes one `target.json` per target for a build file generator.

use std::time::Instant;

use camino::Utf8PathBuf;

use brio_core::error::BrioResult;
use brio_resolver::{create_build_targets, Resolver, TargetSet};

use super::CommandContext;
use crate::jobs;

/// Execute the `brio targets` command
pub async fn execute(
    target: Option<String>,
    emit: Option<Utf8PathBuf>,
    json: bool,
    ctx: &CommandContext,
) -> BrioResult<()> {
    let start_time = Instant::now();
    let (manifest, base_dir) = ctx.load_project().await?;
    let session = ctx.session(&base_dir)?;

    let root = Resolver::new(&session).resolve_root(&manifest).await?;
    let output = create_build_targets(&session, &manifest, &root, target.as_deref()).await?;

    for warning in &output.warnings {
        ctx.output.warn(&warning.to_string());
    }

    if json {
        ctx.output.print(&output.targets.to_json()?);
    } else {
        print_targets(&output.targets, ctx)?;
    }

    if let Some(dir) = emit {
        let dir = if dir.is_absolute() { dir } else { ctx.cwd.join(dir) };
        let written = jobs::emit_targets(&output.targets, &dir).await?;
        ctx.output.success(&format!("Wrote {} targets to {}", written.len(), dir));
    }

    ctx.output.success(&format!(
        "{} targets, {} links in {:.2}s",
        output.targets.len(),
        output.targets.links().len(),
        start_time.elapsed().as_secs_f64()
    ));
    Ok(())
}

/// Human readable listing, dependencies first
fn print_targets(targets: &TargetSet, ctx: &CommandContext) -> BrioResult<()> {
    for target in targets.build_order()? {
        let kind = if target.header_only { "header-only" } else { "compiled" };
        ctx.output.print(&format!("{} ({}@{}, {})", target.name, target.package, target.version, kind));
        if !target.flags.is_empty() {
            ctx.output.info(&format!(
                "    flags [{}]: {}",
                target.flags_visibility,
                target.flags.join(" ")
            ));
        }
        if !target.definitions.private.is_empty() || !target.definitions.public.is_empty() {
            ctx.output.info(&format!(
                "    definitions [{}]: private {:?} public {:?}",
                target.definitions_visibility, target.definitions.private, target.definitions.public
            ));
        }
    }

    for link in targets.links() {
        let flags = if link.flags.is_empty() {
            String::new()
        } else {
            format!(" ({})", link.flags.join(" "))
        };
        ctx.output.info(&format!("{} -> {} [{}]{}", link.from, link.to, link.visibility, flags));
    }
    Ok(())
}
