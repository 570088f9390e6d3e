//! ArcBox CLI - container naming and legacy links.

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod config;

use commands::{Cli, Commands};
use config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    }
    .context("failed to load configuration")?;
    if let Some(data_dir) = cli.data_dir.clone() {
        config.data_dir = data_dir;
    }

    // Initialize logging based on debug flag
    let filter = if cli.debug {
        "arcbox=debug,arcbox_container=debug,arcbox_cli=debug".to_string()
    } else {
        format!(
            "arcbox={level},arcbox_container={level},arcbox_cli={level}",
            level = config.logging.level
        )
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let manager = commands::open_manager(&config)?;

    match cli.command {
        Commands::Create(args) => commands::create::execute(args, &manager),
        Commands::Rename(args) => commands::rename::execute(args, &manager).await,
        Commands::Rm(args) => commands::rm::execute(args, &manager).await,
        Commands::Inspect(args) => commands::inspect::execute(args, &manager),
        Commands::Ps(args) => commands::ps::execute(args, &manager),
        Commands::Start(args) => commands::start::execute(args, &manager).await,
        Commands::Stop(args) => commands::stop::execute(args, &manager).await,
    }
}
