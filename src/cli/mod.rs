//! Command-line interface.

pub mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};

/// Jüngel sermon generator with iterative prompt optimization
#[derive(Debug, Parser)]
#[command(name = "predikant", version, about)]
pub struct Cli {
    /// Path to a config file (defaults to the .predikant/ hierarchy)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Generate a sermon for a scripture passage
    Generate(commands::generate::GenerateArgs),

    /// Show prompt-evolution statistics
    Stats,

    /// Show the current best prompt
    Best(BestArgs),

    /// List the prompt version history
    History,
}

#[derive(Debug, Args)]
pub struct BestArgs {
    /// Print the full prompt text instead of a preview
    #[arg(long)]
    pub full: bool,
}

/// Print an error chain to stderr and return a failure exit code.
pub fn handle_error(err: &anyhow::Error) -> ExitCode {
    eprintln!("Error: {err}");
    for cause in err.chain().skip(1) {
        eprintln!("  caused by: {cause}");
    }
    ExitCode::FAILURE
}
