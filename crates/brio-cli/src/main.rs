//! # brio
//!
//! Dependency resolver and build target generator for embedded C/C++
//! projects.
//!
//! This is the entry point of the `brio` binary. It parses the command line,
//! sets up logging and the panic hook, and dispatches to the command
//! handlers.

use std::process::ExitCode;

use anyhow::Context;
use camino::Utf8PathBuf;
use clap::{Parser, Subcommand, ValueEnum};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod commands;
mod jobs;
mod output;

use brio_core::error::BrioError;
use commands::CommandContext;
use output::errors::ErrorFormatter;

const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    "\nbuilt: ",
    env!("BRIO_BUILD_DATE"),
    "\nrustc: ",
    env!("BRIO_RUSTC_VERSION"),
);

/// Dependency resolver and build target generator for embedded C/C++ projects
#[derive(Parser)]
#[command(name = "brio", version, long_version = LONG_VERSION)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Project directory (defaults to the nearest directory holding brio.toml)
    #[arg(long, global = true, value_name = "DIR")]
    pub dir: Option<Utf8PathBuf>,

    /// Registry base URL
    #[arg(long, global = true, env = "BRIO_REGISTRY", value_name = "URL")]
    pub registry: Option<String>,

    /// Enable debug logging
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Only log warnings and errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Log output format
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Resolve dependencies and print the version tree
    Resolve,
    /// Compute the build targets of the project
    Targets {
        /// Target section to build (defaults to package.default-target)
        #[arg(long)]
        target: Option<String>,
        /// Write one target.json per target under DIR
        #[arg(long, value_name = "DIR")]
        emit: Option<Utf8PathBuf>,
        /// Print the target graph as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the latest published version of a package
    Latest { name: String },
    /// Evaluate a constraint against a list of versions
    Check {
        constraint: String,
        #[arg(required = true)]
        versions: Vec<String>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet, cli.log_format);
    setup_panic_handler();

    info!("Starting brio v{}", env!("CARGO_PKG_VERSION"));

    match run_cli(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            report(&err);
            ExitCode::FAILURE
        }
    }
}

fn run_cli(cli: Cli) -> anyhow::Result<()> {
    let rt = tokio::runtime::Runtime::new().context("Failed to create async runtime")?;

    rt.block_on(async {
        let ctx = CommandContext::new(cli.dir, cli.registry).await?;
        commands::dispatch_command(cli.command, &ctx).await
    })
}

fn report(err: &anyhow::Error) {
    let formatter = ErrorFormatter::new();
    match err.downcast_ref::<BrioError>() {
        Some(brio) => eprint!("{}", formatter.format_error(brio)),
        None => eprintln!("{}", formatter.format_simple(&format!("{:#}", err))),
    }
}

fn setup_logging(verbose: bool, quiet: bool, format: LogFormat) {
    let level = match (verbose, quiet) {
        (true, _) => "debug",
        (_, true) => "warn",
        _ => "info",
    };

    // RUST_LOG wins over the flags
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "brio={0},brio_core={0},brio_config={0},brio_registry={0},brio_resolver={0}",
            level
        ))
    });

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);

    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

fn setup_panic_handler() {
    std::panic::set_hook(Box::new(|panic_info| {
        error!("brio encountered an unexpected error: {}", panic_info);
        eprintln!("brio crashed! This is a bug.");
        eprintln!("Please report this at: https://github.com/brio-build/brio/issues");
        eprintln!("Error: {}", panic_info);
    }));
}
