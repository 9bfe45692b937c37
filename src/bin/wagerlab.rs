//! wagerlab CLI - Multi-stage dice wagering experiment
//!
//! This CLI provides a unified interface for:
//! - Simulating sessions with automated participants
//! - Querying the exact probability engine
//! - Taking part in the task from a terminal

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "wagerlab")]
#[command(version, about = "Dice wagering experiment with belief elicitation", long_about = None)]
struct Cli {
    /// Log at debug level (overridden by RUST_LOG)
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run whole sessions with an automated participant
    Simulate(Box<wagerlab::cli::commands::simulate::SimulateArgs>),

    /// Exact win/loss probabilities for a board position
    Probability(wagerlab::cli::commands::probability::ProbabilityArgs),

    /// Take part in the experiment from the terminal
    Play(Box<wagerlab::cli::commands::play::PlayArgs>),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Simulate(args) => wagerlab::cli::commands::simulate::execute(*args),
        Commands::Probability(args) => wagerlab::cli::commands::probability::execute(args),
        Commands::Play(args) => wagerlab::cli::commands::play::execute(*args),
    }
}
