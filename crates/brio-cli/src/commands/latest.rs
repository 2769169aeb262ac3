//! `brio latest` command implementation.

use brio_core::error::BrioResult;
use brio_core::types::Version;

use super::CommandContext;

/// Print the latest published version of `name`
pub async fn execute(name: &str, ctx: &CommandContext) -> BrioResult<Version> {
    let session = ctx.session(&ctx.cwd)?;
    let version = session.latest(name).await?;
    ctx.output.print(&format!("{}@{}", name, version));
    Ok(version)
}
