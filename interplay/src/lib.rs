//! Interplay CLI library.

mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use interplay_core::observability::{init_tracing, TracingMode};

/// Parse args and dispatch to command handlers.
pub fn run_cli() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(if matches!(cli.command, Commands::Serve { .. }) {
        TracingMode::Daemon
    } else {
        TracingMode::Default
    });

    match cli.command {
        Commands::Synthesize { artifact, output } => {
            commands::synthesize::run(&artifact, output.as_deref())?;
        }
        Commands::Validate { artifact, json } => {
            commands::validate::run(&artifact, json)?;
        }
        Commands::Preview { artifact, out_dir } => {
            commands::preview::run(&artifact, out_dir)?;
        }
        Commands::Serve { stdio } => {
            if stdio {
                commands::serve::run_stdio()?;
            } else {
                anyhow::bail!("only --stdio serving is supported");
            }
        }
    }
    Ok(())
}
