//! Prediction League Service Library
//!
//! Loads the season schedule, builds the calendar and driver roster, follows the
//! predictions and results documents, and exposes the league views and prediction
//! submission to the command-line front end.

use anyhow::{Context, Result};
use std::path::Path;

pub mod cli;
pub mod config;
pub mod logging;
pub mod service;
pub mod signals;

pub use cli::{Cli, CliHandler, Commands};
pub use config::{LeagueSettings, LoggingConfig, ServiceConfig};
pub use logging::initialize_logging_with_config;
pub use service::{LeagueService, RoundView};
pub use signals::setup_signal_handlers;

/// Load configuration from files and environment variables
pub fn load_configuration(path: Option<&Path>) -> Result<ServiceConfig> {
    config::load_config(path).context("Failed to load service configuration")
}
