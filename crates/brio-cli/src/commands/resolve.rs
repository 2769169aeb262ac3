//! `brio resolve` command implementation.

use std::time::Instant;

use brio_core::error::BrioResult;
use brio_resolver::Resolver;

use super::CommandContext;

/// Resolve the project's dependencies and print the tree
pub async fn execute(ctx: &CommandContext) -> BrioResult<()> {
    let start_time = Instant::now();
    let (manifest, base_dir) = ctx.load_project().await?;
    let session = ctx.session(&base_dir)?;

    let root = Resolver::new(&session).resolve_root(&manifest).await?;
    ctx.output.print(&root.to_string());

    let stats = session.stats();
    ctx.output.success(&format!(
        "Resolved {} packages in {:.2}s ({} remote fetches, {} cache hits)",
        root.count() - 1,
        start_time.elapsed().as_secs_f64(),
        stats.remote_fetches,
        stats.hits
    ));
    Ok(())
}
