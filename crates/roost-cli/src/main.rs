//! Roost CLI - incremental pigeonhole encoding driver.

mod commands;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "roost")]
#[command(author, version, about = "Incremental pigeonhole CNF encoder", long_about = None)]
struct Cli {
    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run an incremental encoder, certifying every stage UNSAT
    Encode(commands::encode::EncodeArgs),
    /// Write the problem family as a four-section dimspec file
    Dimspec(commands::dimspec::DimspecArgs),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match cli.command {
        Commands::Encode(args) => commands::encode::run(args),
        Commands::Dimspec(args) => commands::dimspec::run(args),
    }
}
