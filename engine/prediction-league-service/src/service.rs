//! League service: loads the season and wires the components together

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::{watch, RwLock};
use tracing::{info, warn};

use crate::config::ServiceConfig;
use driver_registry::DriverRegistry;
use league_store::{
    create_record_store, LeagueSnapshot, LeagueState, LeagueSync, PodiumPick, PredictionDesk,
    RecordStore, SharedLeagueState, SubmissionError, SubmitReceipt,
};
use race_calendar::{build_calendar, CalendarEntry, RaceCalendar, RoundKey};
use schedule_fetcher::{HttpSource, ScheduleLoader};
use scoring_engine::{Prediction, RaceResult, RoundBest, ScoringEngine};

/// Everything known about one round
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoundView {
    pub entry: CalendarEntry,
    pub result: Option<RaceResult>,
    pub predictions: BTreeMap<String, Prediction>,

    /// Per-user scores, present once the round has a result
    pub scores: Option<BTreeMap<String, u32>>,
    pub best: Option<RoundBest>,
}

/// Loaded league with live state
pub struct LeagueService {
    config: ServiceConfig,
    calendar: Arc<RaceCalendar>,
    registry: DriverRegistry,
    state: SharedLeagueState,
    desk: PredictionDesk,
    sync: LeagueSync,
}

impl LeagueService {
    /// Run the full load sequence against the configured schedule source and store
    pub async fn start(config: ServiceConfig) -> Result<Self> {
        let loader = ScheduleLoader::new(config.fetcher.clone())
            .context("Failed to create schedule loader")?;
        let store = create_record_store(&config.store).context("Failed to open record store")?;

        Self::start_with(config, &loader, store).await
    }

    /// Run the full load sequence with explicit collaborators
    pub async fn start_with<S: HttpSource>(
        config: ServiceConfig,
        loader: &ScheduleLoader<S>,
        store: Arc<dyn RecordStore>,
    ) -> Result<Self> {
        info!("Initializing {}...", config.league.name);

        let bundle = loader.load().await.context("Failed to load season schedule")?;

        let calendar = Arc::new(build_calendar(
            &bundle.meetings,
            &bundle.race_sessions,
            &bundle.qualifying_sessions,
        ));
        let registry = DriverRegistry::from_raw(&bundle.drivers);
        if calendar.is_empty() {
            warn!("Season {} has no races on the calendar", config.fetcher.season);
        }

        let engine = ScoringEngine::new(config.scoring.clone());
        let state = Arc::new(RwLock::new(LeagueState::new(calendar.clone(), engine)));

        let sync = LeagueSync::start(store.clone(), &config.store, state.clone())
            .await
            .context("Failed to subscribe to league records")?;

        let desk = PredictionDesk::new(store, config.store.clone(), config.league.members.clone());

        info!(
            "League ready: {} rounds, {} drivers, {} members",
            calendar.len(),
            registry.len(),
            config.league.members.len()
        );

        Ok(Self { config, calendar, registry, state, desk, sync })
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    pub fn calendar(&self) -> &RaceCalendar {
        &self.calendar
    }

    pub fn registry(&self) -> &DriverRegistry {
        &self.registry
    }

    pub fn state(&self) -> SharedLeagueState {
        self.state.clone()
    }

    /// Changes every time the league state is recomputed
    pub fn revisions(&self) -> watch::Receiver<u64> {
        self.sync.revisions()
    }

    pub async fn snapshot(&self) -> LeagueSnapshot {
        self.state.read().await.snapshot().clone()
    }

    /// Focal race and whether it is locked at `now`
    pub async fn next_race(&self, now: DateTime<Utc>) -> Option<(CalendarEntry, bool)> {
        let state = self.state.read().await;
        state.next_race().map(|race| (race.clone(), state.is_locked(now)))
    }

    pub async fn round_view(&self, round: RoundKey) -> Result<RoundView> {
        let entry = self
            .calendar
            .get(round)
            .cloned()
            .with_context(|| format!("Round {} is not on the calendar", round))?;

        let state = self.state.read().await;
        let label = round.label();

        Ok(RoundView {
            entry,
            result: state.results().get(&label).cloned(),
            predictions: state.predictions().round(&label).cloned().unwrap_or_default(),
            scores: state.round_scores(round),
            best: state.round_best(round),
        })
    }

    /// Existing pick of `user` for the focal race
    pub async fn current_pick(&self, user: &str) -> Option<PodiumPick> {
        let state = self.state.read().await;
        let race = state.next_race()?;
        state.prediction_for(race.round, user).map(PodiumPick::from_prediction)
    }

    /// Submit a prediction for the focal race
    pub async fn submit(
        &self,
        user: &str,
        pick: PodiumPick,
        now: DateTime<Utc>,
    ) -> Result<SubmitReceipt, SubmissionError> {
        self.warn_unknown_drivers(&pick);
        let race = self.state.read().await.next_race().cloned();
        self.desk.submit(race.as_ref(), user, &pick, now).await
    }

    /// Record the official podium for a round
    pub async fn publish_result(
        &self,
        round: RoundKey,
        pick: PodiumPick,
    ) -> Result<RaceResult, SubmissionError> {
        self.warn_unknown_drivers(&pick);
        self.desk.publish_result(&self.calendar, round, &pick).await
    }

    fn warn_unknown_drivers(&self, pick: &PodiumPick) {
        if self.registry.is_empty() {
            return;
        }

        for id in [&pick.first, &pick.second, &pick.third].into_iter().flatten() {
            if !id.is_empty() && !self.registry.contains(id) {
                warn!("Driver {:?} is not on the current roster", id);
            }
        }
    }

    pub fn shutdown(&self) {
        self.sync.stop();
        info!("League service stopped");
    }
}
