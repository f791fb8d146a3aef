//! Development tasks for the combat workspace
//!
//! This binary provides development utilities using the cargo-xtask pattern.
//! Run with: `cargo xtask <command>`

mod commands;
mod utils;

use anyhow::Result;
use clap::Parser;
use commands::{ExportCsv, Report, Simulate};

/// Development tasks for the combat workspace
#[derive(Parser)]
#[command(name = "xtask")]
#[command(about = "Development tools for the turn resolution engine", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Parser)]
enum Command {
    /// Run a scenario end-to-end with AI stand-ins
    Simulate(Simulate),

    /// Export a stored combat log as CSV
    ExportCsv(ExportCsv),

    /// Print the analytics report for a stored combat log
    Report(Report),
}

fn main() -> Result<()> {
    // Load .env file if it exists (for RUST_LOG and COMBAT_LOG_DIR)
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Simulate(cmd) => cmd.execute(),
        Command::ExportCsv(cmd) => cmd.execute(),
        Command::Report(cmd) => cmd.execute(),
    }
}
