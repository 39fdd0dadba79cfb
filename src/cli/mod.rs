//! Command-line interface.

pub mod commands;

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Admission-controlled process pool for AI agent workers.
#[derive(Parser)]
#[command(name = "bullpen", version, about)]
pub struct Cli {
    /// Path to a configuration file (defaults to .bullpen/config.yaml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run one or more prompts through the worker pool
    Run(RunArgs),
    /// Check worker CLI availability and print the effective configuration
    Doctor,
}

#[derive(Args)]
pub struct RunArgs {
    /// Prompts to execute; each becomes one task
    #[arg(required = true)]
    pub prompts: Vec<String>,

    /// Resource tier (low, medium, high); unknown values fall back to medium
    #[arg(long, default_value = "medium")]
    pub tier: String,

    /// Working directory for worker processes
    #[arg(long)]
    pub cwd: Option<PathBuf>,

    /// Per-task deadline in seconds (defaults to the configured timeout)
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    /// Stream worker output chunks to stdout as they arrive
    #[arg(long)]
    pub stream: bool,
}
