//! Prediction League
//!
//! Entry point of the `prediction-league` command. Every command runs the full load
//! sequence first; a load failure is reported once and the process exits non-zero.

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use prediction_league_service::{
    initialize_logging_with_config, load_configuration, Cli, CliHandler, LeagueService,
};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    let cli = Cli::parse();

    // Load configuration
    let config = load_configuration(cli.config.as_deref())?;

    // Initialize logging once the level and format are known
    initialize_logging_with_config(&config.logging.level, &config.logging.format)?;

    info!("Starting Prediction League v{}", env!("CARGO_PKG_VERSION"));

    let service = LeagueService::start(config).await.context("Failed to load the league")?;

    let handler = CliHandler::new(service);
    let result = handler.handle_command(cli.command).await;
    handler.service().shutdown();

    result
}
