//! Keeps a shared `LeagueState` in step with the record store subscriptions

use crate::backend::{decode_document, RecordStore};
use crate::config::StoreConfig;
use crate::error::Result;
use crate::state::LeagueState;
use scoring_engine::{PredictionsRecord, ResultsRecord};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::{watch, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

/// League state shared between the sync task and readers
pub type SharedLeagueState = Arc<RwLock<LeagueState>>;

/// Background task applying every predictions/results update to the shared state.
///
/// The two documents update independently; whichever changes is replaced in its
/// slot and the views are recomputed. The task stops when dropped.
#[derive(Debug)]
pub struct LeagueSync {
    revisions: watch::Receiver<u64>,
    handle: JoinHandle<()>,
}

impl LeagueSync {
    /// Subscribe to both documents, apply their current values, then follow updates
    pub async fn start(
        store: Arc<dyn RecordStore>,
        config: &StoreConfig,
        state: SharedLeagueState,
    ) -> Result<Self> {
        let mut predictions_rx = store.subscribe(&config.predictions_document).await?;
        let mut results_rx = store.subscribe(&config.results_document).await?;

        let initial_revision = {
            let mut guard = state.write().await;
            let predictions = predictions_rx.borrow_and_update().clone();
            apply_predictions(&mut guard, predictions);
            let results = results_rx.borrow_and_update().clone();
            apply_results(&mut guard, results);
            guard.revision()
        };
        let (revision_tx, revisions) = watch::channel(initial_revision);

        info!(
            "League sync started on documents {} and {}",
            config.predictions_document, config.results_document
        );

        let handle = tokio::spawn(async move {
            loop {
                tokio::select! {
                    changed = predictions_rx.changed() => {
                        if changed.is_err() {
                            break;
                        }
                        let value = predictions_rx.borrow_and_update().clone();
                        let mut guard = state.write().await;
                        apply_predictions(&mut guard, value);
                        revision_tx.send_replace(guard.revision());
                    }
                    changed = results_rx.changed() => {
                        if changed.is_err() {
                            break;
                        }
                        let value = results_rx.borrow_and_update().clone();
                        let mut guard = state.write().await;
                        apply_results(&mut guard, value);
                        revision_tx.send_replace(guard.revision());
                    }
                }
            }
            debug!("League sync stopped: record store closed");
        });

        Ok(Self { revisions, handle })
    }

    /// Receiver that changes whenever the state has been recomputed
    pub fn revisions(&self) -> watch::Receiver<u64> {
        self.revisions.clone()
    }

    pub fn stop(&self) {
        self.handle.abort();
    }
}

impl Drop for LeagueSync {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

// A document that fails to decode leaves the previous slot in place.
fn apply_predictions(state: &mut LeagueState, value: Option<Value>) {
    match decode_document::<PredictionsRecord>(value) {
        Ok(predictions) => state.replace_predictions(predictions),
        Err(e) => error!("Ignoring predictions update: {}", e),
    }
}

fn apply_results(state: &mut LeagueState, value: Option<Value>) {
    match decode_document::<ResultsRecord>(value) {
        Ok(results) => state.replace_results(results),
        Err(e) => error!("Ignoring results update: {}", e),
    }
}
