//! Service configuration management

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use league_store::StoreConfig;
use schedule_fetcher::FetcherConfig;
use scoring_engine::ScoringConfig;

/// Prefix for layered environment overrides, e.g. `LEAGUE__FETCHER__SEASON=2025`
const ENV_PREFIX: &str = "LEAGUE";

/// Main service configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Schedule source configuration
    pub fetcher: FetcherConfig,

    /// Record store configuration
    pub store: StoreConfig,

    /// Points per podium slot
    pub scoring: ScoringConfig,

    /// League membership
    pub league: LeagueSettings,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// The fixed group of players
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeagueSettings {
    /// Display name of the league
    pub name: String,

    /// Users allowed to submit predictions
    pub members: Vec<String>,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (json, pretty, compact)
    pub format: String,
}

impl Default for LeagueSettings {
    fn default() -> Self {
        Self {
            name: "F1 Podium League".to_string(),
            members: ["Robert", "Johan", "Fredrik", "Klas"].iter().map(|m| m.to_string()).collect(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_string(), format: "pretty".to_string() }
    }
}

/// Load configuration from files and environment variables.
///
/// Layers, lowest first: built-in defaults, the TOML file (`path`, else
/// `LEAGUE_CONFIG`), `LEAGUE__*` variables, then the short-form variables.
pub fn load_config(path: Option<&Path>) -> Result<ServiceConfig> {
    let path = path
        .map(Path::to_path_buf)
        .or_else(|| std::env::var("LEAGUE_CONFIG").ok().map(PathBuf::from));

    let mut config = load_layers(path.as_deref())?;

    // Override with environment variables
    load_from_env(&mut config, |key| std::env::var(key).ok())?;

    // Validate configuration
    validate_config(&config)?;

    Ok(config)
}

/// Defaults, then the optional file, then `LEAGUE__` prefixed variables
pub fn load_layers(path: Option<&Path>) -> Result<ServiceConfig> {
    let defaults = config::Config::try_from(&ServiceConfig::default())
        .context("Failed to serialize default configuration")?;

    let mut builder = config::Config::builder().add_source(defaults);

    if let Some(path) = path {
        tracing::debug!("Loading configuration from file: {:?}", path);
        builder = builder.add_source(config::File::from(path.to_path_buf()).required(true));
    }

    builder
        .add_source(config::Environment::with_prefix(ENV_PREFIX).separator("__").try_parsing(true))
        .build()
        .context("Failed to read configuration sources")?
        .try_deserialize()
        .context("Failed to parse configuration")
}

/// Apply the short-form environment overrides
pub fn load_from_env<F>(config: &mut ServiceConfig, lookup: F) -> Result<()>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(base_url) = lookup("OPENF1_BASE_URL") {
        config.fetcher.base_url = base_url.trim_end_matches('/').to_string();
    }

    if let Some(season) = lookup("LEAGUE_SEASON") {
        config.fetcher.season =
            season.parse().with_context(|| format!("Invalid LEAGUE_SEASON: {season:?}"))?;
    }

    if let Some(data_dir) = lookup("LEAGUE_DATA_DIR") {
        config.store.data_dir = PathBuf::from(data_dir);
    }

    if let Some(level) = lookup("LEAGUE_LOG_LEVEL") {
        config.logging.level = level;
    }

    if let Some(format) = lookup("LEAGUE_LOG_FORMAT") {
        config.logging.format = format;
    }

    Ok(())
}

/// Validate configuration
pub fn validate_config(config: &ServiceConfig) -> Result<()> {
    // Validate log level
    match config.logging.level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => {}
        _ => return Err(anyhow::anyhow!("Invalid log level: {}", config.logging.level)),
    }

    // Validate log format
    match config.logging.format.as_str() {
        "json" | "pretty" | "compact" => {}
        _ => return Err(anyhow::anyhow!("Invalid log format: {}", config.logging.format)),
    }

    if config.fetcher.season <= 0 {
        return Err(anyhow::anyhow!("Invalid season: {}", config.fetcher.season));
    }

    if config.fetcher.base_url.is_empty() {
        return Err(anyhow::anyhow!("Schedule base URL must not be empty"));
    }

    if config.league.members.is_empty() {
        return Err(anyhow::anyhow!("League must have at least one member"));
    }

    if let Some(blank) = config.league.members.iter().find(|m| m.trim().is_empty()) {
        return Err(anyhow::anyhow!("Invalid member name: {:?}", blank));
    }

    config.store.validate().map_err(|e| anyhow::anyhow!("Invalid store configuration: {}", e))?;

    Ok(())
}

/// Save configuration to a TOML file
pub fn save_config(config: &ServiceConfig, path: &Path) -> Result<()> {
    let contents = to_toml(config)?;
    std::fs::write(path, contents)
        .with_context(|| format!("Failed to write configuration to {:?}", path))
}

/// Render configuration as TOML
pub fn to_toml(config: &ServiceConfig) -> Result<String> {
    toml::to_string_pretty(config).context("Failed to serialize configuration")
}
