//! # OpenSchema CLI Library
//!
//! Core library functionality for the `openschema` command-line client.

use clap::Parser;

pub mod archive;
pub mod commands;
pub mod compile;
pub mod config;
pub mod constants;
pub mod error;
pub mod identifier;
pub mod integrity;
pub mod license;
pub mod prompt;
pub mod registry;
pub mod report;
pub mod validator;
pub mod version;

/// CLI for the OpenSchema registry
///
/// Scaffold, validate, compile, publish and download JSON Schema projects.
#[derive(Parser)]
#[command(
    name = "openschema",
    version,
    about = "The CLI for the OpenSchema registry",
    long_about = "Command-line client for the OpenSchema registry.\n\nScaffold schema projects, derive JSON Schema from TypeScript declarations,\nvalidate and publish schemas, and pull published ones back down."
)]
pub struct Cli {
    /// Registry API base URL, overrides the settings file and environment
    #[arg(long, global = true, value_name = "URL")]
    pub registry: Option<String>,

    /// Print debug diagnostics to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub cmd: Option<commands::Commands>,
}
