//! # Command Line Interface
//!
//! Commands for browsing the league and submitting predictions.

use crate::config::{save_config, to_toml, ServiceConfig};
use crate::service::LeagueService;
use crate::signals::setup_signal_handlers;
use anyhow::Result;
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use league_store::PodiumPick;
use race_calendar::RoundKey;
use std::path::{Path, PathBuf};
use tracing::info;

/// Podium prediction league
#[derive(Parser)]
#[command(name = "prediction-league")]
#[command(about = "Predict the podium of every race and compete with your league")]
pub struct Cli {
    /// Path to a TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show the season calendar
    Calendar,
    /// Show the driver roster
    Drivers {
        /// Only drivers whose name contains this text
        #[arg(long)]
        search: Option<String>,
    },
    /// Show the season standings
    Standings,
    /// Show cumulative points per completed round
    Chart,
    /// Show the race open for predictions
    NextRace,
    /// Show predictions, result and scores of one round
    Round {
        /// Round number
        round: RoundKey,
    },
    /// Submit a podium prediction for the next race
    Submit {
        /// League member submitting the prediction
        #[arg(short, long)]
        user: String,
        /// Driver id predicted to win
        first: String,
        /// Driver id predicted second
        second: String,
        /// Driver id predicted third
        third: String,
    },
    /// Record the official podium of a round
    Result {
        /// Round number
        round: RoundKey,
        first: String,
        second: String,
        third: String,
    },
    /// Follow the standings until interrupted
    Watch,
    /// Print the effective configuration, or save it as a TOML file
    Config {
        /// Write the configuration to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

/// CLI handler
pub struct CliHandler {
    service: LeagueService,
}

impl CliHandler {
    pub fn new(service: LeagueService) -> Self {
        Self { service }
    }

    pub fn service(&self) -> &LeagueService {
        &self.service
    }

    /// Handle CLI commands
    pub async fn handle_command(&self, command: Commands) -> Result<()> {
        match command {
            Commands::Calendar => self.show_calendar(),
            Commands::Drivers { search } => self.show_drivers(search.as_deref()),
            Commands::Standings => self.show_standings().await,
            Commands::Chart => self.show_chart().await,
            Commands::NextRace => self.show_next_race(Utc::now()).await,
            Commands::Round { round } => self.show_round(round).await?,
            Commands::Submit { user, first, second, third } => {
                self.submit(&user, PodiumPick::new(first, second, third), Utc::now()).await?;
            }
            Commands::Result { round, first, second, third } => {
                self.publish_result(round, PodiumPick::new(first, second, third)).await?;
            }
            Commands::Watch => self.watch().await?,
            Commands::Config { output } => export_config(self.service.config(), output.as_deref())?,
        }
        Ok(())
    }

    fn show_calendar(&self) {
        println!("🏁 {} Season Calendar", self.service.config().fetcher.season);
        println!("{}", "=".repeat(50));

        let calendar = self.service.calendar();
        if calendar.is_empty() {
            println!("No races found");
            return;
        }

        for entry in calendar.iter() {
            println!(
                "{:<4} {} ({}, {})  race {}  qualifying {}",
                entry.round.chart_label(),
                entry.name,
                entry.circuit,
                entry.country,
                format_time(entry.race_start),
                entry.qualifying_start.map(format_time).unwrap_or_else(|| "TBA".to_string())
            );
        }
    }

    fn show_drivers(&self, search: Option<&str>) {
        println!("🏎️  Drivers");
        println!("{}", "=".repeat(50));

        let registry = self.service.registry();
        let drivers = match search {
            Some(query) => registry.search(query),
            None => registry.drivers().iter().collect(),
        };

        if drivers.is_empty() {
            println!("No drivers found");
            return;
        }

        for driver in drivers {
            println!("{:<16} #{:<3} {:<4} {} ({})", driver.id, driver.number, driver.code, driver.full_name, driver.team);
        }
    }

    async fn show_standings(&self) {
        println!("🏆 Standings");
        println!("{}", "=".repeat(50));

        let snapshot = self.service.snapshot().await;
        if snapshot.leaderboard.is_empty() {
            println!("No completed rounds yet");
            return;
        }

        for (position, entry) in snapshot.leaderboard.iter().enumerate() {
            println!("{:>2}. {:<12} {:>4} pts", position + 1, entry.user, entry.score);
        }
    }

    async fn show_chart(&self) {
        println!("📈 Points Progression");
        println!("{}", "=".repeat(50));

        let snapshot = self.service.snapshot().await;
        if snapshot.chart.is_empty() {
            println!("No completed rounds yet");
            return;
        }

        for point in &snapshot.chart {
            let totals: Vec<String> =
                point.scores.iter().map(|(user, total)| format!("{user} {total}")).collect();
            println!("{:<4} {}", point.label, totals.join(", "));
        }
    }

    async fn show_next_race(&self, now: DateTime<Utc>) {
        println!("⏱️  Next Race");
        println!("{}", "=".repeat(50));

        let Some((race, locked)) = self.service.next_race(now).await else {
            println!("No races found");
            return;
        };

        println!("Round {}: {} ({}, {})", race.round, race.name, race.circuit, race.country);
        println!("Race:       {}", format_time(race.race_start));
        match race.qualifying_start {
            Some(start) => println!("Qualifying: {}", format_time(start)),
            None => println!("Qualifying: TBA"),
        }
        if locked {
            println!("🔒 Voting is closed");
        } else {
            println!("✅ Voting is open");
        }
    }

    async fn show_round(&self, round: RoundKey) -> Result<()> {
        let view = self.service.round_view(round).await?;
        let registry = self.service.registry();

        println!("🏁 Round {}: {}", round, view.entry.name);
        println!("{}", "=".repeat(50));

        match &view.result {
            Some(result) => {
                let podium: Vec<String> = result.podium.iter().map(|id| registry.display_name(id)).collect();
                println!("Result: {}", podium.join(" / "));
            }
            None => println!("Result: pending"),
        }

        if view.predictions.is_empty() {
            println!("No predictions");
        }

        for (user, prediction) in &view.predictions {
            let picks: Vec<String> = prediction.slots().iter().map(|id| registry.display_code(id)).collect();
            let score = view
                .scores
                .as_ref()
                .and_then(|scores| scores.get(user))
                .map(|score| format!("{score} pts"))
                .unwrap_or_default();
            println!("{:<12} {:<16} {}", user, picks.join(" "), score);
        }

        if let Some(best) = &view.best {
            println!("⭐ Best: {} ({} pts)", best.users.join(", "), best.score);
        }

        Ok(())
    }

    async fn submit(&self, user: &str, pick: PodiumPick, now: DateTime<Utc>) -> Result<()> {
        if let Some(previous) = self.service.current_pick(user).await {
            info!("Replacing earlier pick of {}: {:?}", user, previous);
        }

        let receipt = self.service.submit(user, pick, now).await?;
        println!(
            "✅ Prediction saved for round {}: {}",
            receipt.round,
            receipt.prediction.slots().join(" / ")
        );
        Ok(())
    }

    async fn publish_result(&self, round: RoundKey, pick: PodiumPick) -> Result<()> {
        let result = self.service.publish_result(round, pick).await?;
        println!("✅ Result saved for round {}: {}", round, result.podium.join(" / "));
        Ok(())
    }

    async fn watch(&self) -> Result<()> {
        let mut shutdown = setup_signal_handlers()?;
        let mut revisions = self.service.revisions();

        self.show_standings().await;
        loop {
            tokio::select! {
                changed = revisions.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    println!();
                    self.show_standings().await;
                }
                _ = &mut shutdown => {
                    info!("Stopping watch");
                    break;
                }
            }
        }

        Ok(())
    }
}

fn export_config(config: &ServiceConfig, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            save_config(config, path)?;
            println!("✅ Configuration written to {}", path.display());
        }
        None => println!("{}", to_toml(config)?),
    }
    Ok(())
}

fn format_time(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%d %H:%M UTC").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::load_layers;
    use tempfile::TempDir;

    #[test]
    fn test_config_command_arguments() {
        let cli = Cli::try_parse_from(["prediction-league", "config", "--output", "league.toml"]).unwrap();
        assert!(matches!(cli.command, Commands::Config { output: Some(ref path) } if path == Path::new("league.toml")));

        let cli = Cli::try_parse_from(["prediction-league", "config"]).unwrap();
        assert!(matches!(cli.command, Commands::Config { output: None }));
    }

    #[test]
    fn test_exported_config_loads_back() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("league.toml");

        let mut config = ServiceConfig::default();
        config.league.name = "Office League".to_string();
        config.store.poll_interval_ms = 250;
        export_config(&config, Some(&path)).unwrap();

        let loaded = load_layers(Some(&path)).unwrap();
        assert_eq!(loaded.league.name, "Office League");
        assert_eq!(loaded.store.poll_interval_ms, 250);
    }
}
