//! Dubtrack CLI
//!
//! Command-line interface for rendering dubbed audio tracks.

use clap::Parser;
use env_logger::Env;
use log::info;

use dubtrack::cli::{commands, Cli, Commands};
use dubtrack::Result;

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(level)).init();

    info!("Dubtrack v{}", env!("CARGO_PKG_VERSION"));

    match &cli.command {
        Commands::Render(args) => commands::render(args).map(|_| ()),
        Commands::Inspect(args) => commands::inspect(args),
    }
}
