//! # OpenSchema CLI
//!
//! Command-line client for the OpenSchema registry.
//!
//! ## Quick Start
//!
//! ```bash
//! # Scaffold a new schema project
//! openschema init
//!
//! # Derive schema.json from TypeScript declarations
//! openschema compile schema.ts -t Person
//!
//! # Bump the version and publish
//! openschema version patch
//! openschema push
//!
//! # Search and download
//! openschema find person --category people
//! openschema pull person:1.0.0 ./person
//! ```
//!
//! ## Configuration
//!
//! Each project holds an `openschema.json` (metadata) and a `schema.json` (the schema).
//! The registry location is read from `~/.config/openschema/config.yaml`,
//! `OPENSCHEMA_REGISTRY_URL` or `--registry`.

use anyhow::{Context as _, Result};
use clap::Parser;
use openschema_cli::commands::{self, Commands, Context};
use openschema_cli::error::{report_failure, CliError};
use openschema_cli::prompt::TerminalPrompter;
use openschema_cli::{config, Cli};
use tracing_subscriber::EnvFilter;

/// Main entry point for the OpenSchema CLI
///
/// Parses command-line arguments, installs logging and delegates to the command
/// handler. Exits with status 1 when the command fails.
#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let Some(cmd) = cli.cmd else {
        eprintln!("No command provided. Use --help to see available commands.");
        std::process::exit(1);
    };

    let code = match execute(cmd, cli.registry.as_deref()).await {
        Ok(()) => 0,
        Err(err) => report_failure(&err),
    };
    std::process::exit(code);
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "openschema_cli=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn execute(cmd: Commands, registry: Option<&str>) -> Result<()> {
    let settings = config::load_settings(registry).map_err(CliError::from)?;
    let cwd = std::env::current_dir().context("could not determine the current directory")?;
    let mut prompter = TerminalPrompter;
    let mut ctx = Context::new(cwd, settings, &mut prompter);
    commands::run(cmd, &mut ctx).await
}
