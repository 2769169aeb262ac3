//! Command implementations and dispatch logic.
//!
//! Each command is an async function taking the shared [`CommandContext`].

use std::collections::HashMap;

use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use tracing::{debug, info};

use brio_config::{ConfigLayering, ConfigLoader, Manifest, Settings};
use brio_core::error::{BrioError, BrioResult};
use brio_registry::{HttpRegistry, RegistrySession};

pub mod check;
pub mod latest;
pub mod resolve;
pub mod targets;


use crate::{output::OutputHandler, Commands};

/// Shared context for all commands
pub struct CommandContext {
    pub cwd: Utf8PathBuf,
    pub settings: Settings,
    pub output: OutputHandler,
}

impl CommandContext {
    /// Create a context rooted at `dir` (or the current directory), with
    /// settings layered from the global file, `BRIO_*` and the command line.
    pub async fn new(dir: Option<Utf8PathBuf>, registry: Option<String>) -> anyhow::Result<Self> {
        let cwd = match dir {
            Some(dir) => dir,
            None => {
                let cwd = std::env::current_dir()
                    .map_err(|e| BrioError::io("Failed to get current directory".to_string(), e))?;
                Utf8PathBuf::from_path_buf(cwd).map_err(|path| {
                    anyhow::anyhow!("Current directory is not valid UTF-8: {}", path.display())
                })?
            }
        };

        let mut cli_overrides = HashMap::new();
        if let Some(registry) = registry {
            cli_overrides.insert("registry".to_string(), registry);
        }

        let (settings, sources) = ConfigLayering::new()
            .with_env(ConfigLayering::collect_env_overrides())
            .with_cli(cli_overrides)
            .load_global()
            .await?
            .merge()?;
        debug!("Settings {:?} (sources: {:?})", settings, sources);

        Ok(Self {
            cwd,
            settings,
            output: OutputHandler::new(),
        })
    }

    /// Load the nearest project manifest and the directory it lives in
    pub async fn load_project(&self) -> BrioResult<(Manifest, Utf8PathBuf)> {
        ConfigLoader::new(self.cwd.clone()).load_project().await
    }

    /// Open a resolution session against the configured registry
    pub fn session(&self, base_dir: &Utf8Path) -> BrioResult<RegistrySession<HttpRegistry>> {
        let source = HttpRegistry::with_config(&self.settings)?;
        Ok(RegistrySession::with_settings(source, base_dir, &self.settings))
    }
}

/// Dispatch a command to its handler
pub async fn dispatch_command(command: Commands, ctx: &CommandContext) -> anyhow::Result<()> {
    match command {
        Commands::Resolve => {
            info!("Resolving dependencies in {}", ctx.cwd);
            resolve::execute(ctx).await.context("Dependency resolution failed")
        }
        Commands::Targets { target, emit, json } => {
            info!("Computing build targets (target: {:?}, emit: {:?})", target, emit);
            targets::execute(target, emit, json, ctx)
                .await
                .context("Build target computation failed")
        }
        Commands::Latest { name } => {
            info!("Looking up latest version of {}", name);
            latest::execute(&name, ctx).await?;
            Ok(())
        }
        Commands::Check { constraint, versions } => {
            check::execute(&constraint, &versions, ctx)?;
            Ok(())
        }
    }
}
