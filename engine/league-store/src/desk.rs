//! Prediction submission and result publishing

use crate::backend::{load_document, save_document, RecordStore};
use crate::config::StoreConfig;
use crate::error::SubmissionError;
use chrono::{DateTime, Utc};
use race_calendar::{CalendarEntry, RaceCalendar, RoundKey};
use scoring_engine::{Prediction, PredictionsRecord, RaceResult, ResultsRecord};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info};

/// Candidate podium as entered by a user; empty slots are `None` or empty strings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PodiumPick {
    pub first: Option<String>,
    pub second: Option<String>,
    pub third: Option<String>,
}

impl PodiumPick {
    pub fn new(first: impl Into<String>, second: impl Into<String>, third: impl Into<String>) -> Self {
        Self { first: Some(first.into()), second: Some(second.into()), third: Some(third.into()) }
    }

    /// Prefill from an existing prediction
    pub fn from_prediction(prediction: &Prediction) -> Self {
        Self::new(&prediction.first, &prediction.second, &prediction.third)
    }

    /// The three driver ids, once every slot is filled with a different driver
    pub fn validate(&self) -> Result<[&str; 3], SubmissionError> {
        let slots = [&self.first, &self.second, &self.third]
            .map(|slot| slot.as_deref().filter(|id| !id.is_empty()));

        let [Some(first), Some(second), Some(third)] = slots else {
            return Err(SubmissionError::IncompletePodium);
        };

        if first == second || first == third || second == third {
            return Err(SubmissionError::DuplicateDriver);
        }

        Ok([first, second, third])
    }
}

/// Outcome of an accepted submission
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubmitReceipt {
    pub round: RoundKey,
    pub user: String,
    pub prediction: Prediction,

    /// Whether an earlier prediction for the same round was overwritten
    pub replaced: bool,
}

/// Writes predictions and results back to the record store.
///
/// Every write reads the whole document, changes one entry and writes the whole
/// document back. Concurrent writers are last-write-wins. Local league state is
/// never touched here; it follows the store subscription.
pub struct PredictionDesk {
    store: Arc<dyn RecordStore>,
    config: StoreConfig,
    members: Vec<String>,
}

impl PredictionDesk {
    pub fn new(store: Arc<dyn RecordStore>, config: StoreConfig, members: Vec<String>) -> Self {
        Self { store, config, members }
    }

    pub fn members(&self) -> &[String] {
        &self.members
    }

    pub fn is_member(&self, user: &str) -> bool {
        self.members.iter().any(|member| member == user)
    }

    /// Submit `user`'s pick for the focal race.
    ///
    /// Checks run in order: membership, focal race, lock, complete podium, distinct
    /// drivers. Nothing is written unless all of them pass.
    pub async fn submit(
        &self,
        race: Option<&CalendarEntry>,
        user: &str,
        pick: &PodiumPick,
        now: DateTime<Utc>,
    ) -> Result<SubmitReceipt, SubmissionError> {
        if !self.is_member(user) {
            return Err(SubmissionError::UnknownMember(user.to_string()));
        }

        let race = race.ok_or(SubmissionError::NoFocalRace)?;
        if race.is_locked_at(now) {
            return Err(SubmissionError::Locked(race.round));
        }

        let [first, second, third] = pick.validate()?;
        let prediction = Prediction::new(first, second, third, now);

        let document = &self.config.predictions_document;
        let mut predictions: PredictionsRecord =
            load_document(&*self.store, document).await.map_err(|e| {
                error!("Error submitting vote: {}", e);
                SubmissionError::from(e)
            })?;

        let previous = predictions.insert(&race.round.label(), user, prediction.clone());

        save_document(&*self.store, document, &predictions).await.map_err(|e| {
            error!("Error submitting vote: {}", e);
            SubmissionError::from(e)
        })?;

        info!("Saved prediction of {} for round {} ({})", user, race.round, race.name);

        Ok(SubmitReceipt {
            round: race.round,
            user: user.to_string(),
            prediction,
            replaced: previous.is_some(),
        })
    }

    /// Record the official podium of a round, replacing any earlier result
    pub async fn publish_result(
        &self,
        calendar: &RaceCalendar,
        round: RoundKey,
        pick: &PodiumPick,
    ) -> Result<RaceResult, SubmissionError> {
        if calendar.get(round).is_none() {
            return Err(SubmissionError::UnknownRound(round));
        }

        let result = RaceResult::new(pick.validate()?);

        let document = &self.config.results_document;
        let mut results: ResultsRecord = load_document(&*self.store, document).await.map_err(|e| {
            error!("Error saving result: {}", e);
            SubmissionError::from(e)
        })?;

        results.insert(&round.label(), result.clone());

        save_document(&*self.store, document, &results).await.map_err(|e| {
            error!("Error saving result: {}", e);
            SubmissionError::from(e)
        })?;

        info!("Saved result for round {}: {}", round, result.podium.join(", "));
        Ok(result)
    }
}
