//! Live league state: the two record slots and the views derived from them

use chrono::{DateTime, Utc};
use race_calendar::{CalendarEntry, RaceCalendar, RoundKey};
use scoring_engine::{
    ChartPoint, LeaderboardEntry, Prediction, PredictionsRecord, ResultsRecord, RoundBest,
    ScoringEngine,
};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

/// Views recomputed after every slot replacement
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LeagueSnapshot {
    pub leaderboard: Vec<LeaderboardEntry>,
    pub chart: Vec<ChartPoint>,
    pub next_race: Option<CalendarEntry>,
}

/// Owns the predictions and results slots.
///
/// A slot is only ever replaced as a whole, and every replacement recomputes the
/// snapshot from scratch.
#[derive(Debug)]
pub struct LeagueState {
    engine: ScoringEngine,
    calendar: Arc<RaceCalendar>,
    predictions: PredictionsRecord,
    results: ResultsRecord,
    snapshot: LeagueSnapshot,
    revision: u64,
}

impl LeagueState {
    /// Empty state over a loaded calendar
    pub fn new(calendar: Arc<RaceCalendar>, engine: ScoringEngine) -> Self {
        let mut state = Self {
            engine,
            calendar,
            predictions: PredictionsRecord::default(),
            results: ResultsRecord::default(),
            snapshot: LeagueSnapshot::default(),
            revision: 0,
        };
        state.snapshot = state.compute_snapshot();
        state
    }

    pub fn replace_predictions(&mut self, predictions: PredictionsRecord) {
        self.predictions = predictions;
        self.refresh();
    }

    pub fn replace_results(&mut self, results: ResultsRecord) {
        self.results = results;
        self.refresh();
    }

    fn refresh(&mut self) {
        self.snapshot = self.compute_snapshot();
        self.revision += 1;
        debug!(
            "League state revision {}: {} users ranked, {} completed rounds",
            self.revision,
            self.snapshot.leaderboard.len(),
            self.snapshot.chart.len()
        );
    }

    fn compute_snapshot(&self) -> LeagueSnapshot {
        LeagueSnapshot {
            leaderboard: self.engine.leaderboard(&self.predictions, &self.results),
            chart: self.engine.cumulative_series(&self.predictions, &self.results),
            next_race: self.engine.next_race(&self.calendar, &self.results).cloned(),
        }
    }

    pub fn snapshot(&self) -> &LeagueSnapshot {
        &self.snapshot
    }

    pub fn leaderboard(&self) -> &[LeaderboardEntry] {
        &self.snapshot.leaderboard
    }

    pub fn chart(&self) -> &[ChartPoint] {
        &self.snapshot.chart
    }

    /// Race currently open for predictions (or the final race once the season is over)
    pub fn next_race(&self) -> Option<&CalendarEntry> {
        self.snapshot.next_race.as_ref()
    }

    /// Whether the focal race is closed for predictions at `now`
    pub fn is_locked(&self, now: DateTime<Utc>) -> bool {
        self.next_race().is_some_and(|race| self.engine.is_locked(race, now))
    }

    pub fn calendar(&self) -> &RaceCalendar {
        &self.calendar
    }

    pub fn predictions(&self) -> &PredictionsRecord {
        &self.predictions
    }

    pub fn results(&self) -> &ResultsRecord {
        &self.results
    }

    /// A user's current pick for a round, used to prefill a new submission
    pub fn prediction_for(&self, round: RoundKey, user: &str) -> Option<&Prediction> {
        self.predictions.get(&round.label(), user)
    }

    pub fn round_scores(&self, round: RoundKey) -> Option<BTreeMap<String, u32>> {
        self.engine.round_scores(&self.predictions, &self.results, &round.label())
    }

    pub fn round_best(&self, round: RoundKey) -> Option<RoundBest> {
        self.engine.round_best(&self.predictions, &self.results, round)
    }

    /// Number of slot replacements applied so far
    pub fn revision(&self) -> u64 {
        self.revision
    }
}
