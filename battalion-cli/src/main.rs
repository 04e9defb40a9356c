//! Battalion CLI - Command-line interface
//!
//! Commands:
//! - play: Play one AI-vs-AI match on a level
//! - suggest: Print the action a computer player would take

mod match_cmd;
mod suggest_cmd;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "battalion")]
#[command(about = "Battalion computer players")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Random seed for reproducible games
    #[arg(long, global = true)]
    seed: Option<u64>,
}

#[derive(Subcommand)]
enum Commands {
    /// Play a single match
    Play(match_cmd::PlayArgs),
    /// Suggest an action for the side to move
    Suggest(suggest_cmd::SuggestArgs),
}

fn main() -> anyhow::Result<()> {
    // Initialize logging, RUST_LOG overrides the default level
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Play(args) => match_cmd::run(args, cli.seed),
        Commands::Suggest(args) => suggest_cmd::run(args, cli.seed),
    }
}
