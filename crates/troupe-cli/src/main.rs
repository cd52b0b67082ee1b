//! troupe CLI
//!
//! Command-line access to the collaboration plans an embedding service
//! stores through troupe-core.

mod args;
mod cli;
mod renderer;

use anyhow::{Context, Result};
use args::{Args, Commands};
use clap::Parser;
use cli::Cli;
use log::info;
use renderer::TerminalRenderer;
use troupe_core::{models::PlanFilter, PlanStore};

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let Args {
        database_file,
        no_color,
        command,
    } = Args::parse();

    let store = PlanStore::open(database_file)
        .await
        .context("Failed to open plan database")?;
    info!("Using plan database at {}", store.path().display());

    let cli = Cli::new(store, TerminalRenderer::new(!no_color));

    match command {
        Some(Commands::Plan { command }) => cli.handle_plan_command(command).await,
        Some(Commands::Stats(args)) => cli.show_stats(args).await,
        None => cli.list_plans(&PlanFilter::default()).await,
    }
}
