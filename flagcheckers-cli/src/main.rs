//! Flag Checkers CLI - Command-line interface
//!
//! Commands:
//! - play: Play against the scripted AI in the terminal
//! - match: Pit the scripted AI against a random player
//! - show: Print the resolved configuration and setup as JSON

mod match_cmd;
mod play_cmd;
mod render;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use flagcheckers_core::{GameConfig, Setup};

#[derive(Parser)]
#[command(name = "flagcheckers")]
#[command(about = "Checkers with capture-the-flag rules")]
struct Cli {
    /// Game configuration JSON file
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Random seed for reproducibility
    #[arg(long, global = true)]
    seed: Option<u64>,

    /// Verbose logging (debug level)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play one game against the scripted AI
    Play(play_cmd::PlayArgs),
    /// Scripted AI vs random player
    Match(match_cmd::MatchArgs),
    /// Print configuration and setup
    Show(ShowArgs),
}

#[derive(Args)]
struct ShowArgs {
    /// Setup JSON file (standard layout if omitted)
    #[arg(long, value_name = "FILE")]
    setup: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = load_config(cli.config.as_ref())?;

    match cli.command {
        Commands::Play(args) => play_cmd::run(args, config),
        Commands::Match(args) => match_cmd::run(args, config, cli.seed),
        Commands::Show(args) => show(&args, &config),
    }
}

/// RUST_LOG wins; otherwise info, or debug with --verbose
fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn load_config(path: Option<&PathBuf>) -> Result<GameConfig> {
    match path {
        Some(path) => GameConfig::load(path)
            .with_context(|| format!("Failed to load config: {}", path.display())),
        None => Ok(GameConfig::default()),
    }
}

fn show(args: &ShowArgs, config: &GameConfig) -> Result<()> {
    let setup = match &args.setup {
        Some(path) => Setup::load(path)
            .with_context(|| format!("Failed to load setup: {}", path.display()))?,
        None => Setup::standard(),
    };
    // Surface setup errors here rather than at game start
    setup.build()?;

    println!("{}", serde_json::to_string_pretty(config)?);
    println!("{}", serde_json::to_string_pretty(&setup)?);
    Ok(())
}
