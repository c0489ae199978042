//! # League Store
//!
//! Persistence side of the prediction league: the predictions and results documents,
//! the live league state derived from them, and prediction submission.
//!
//! ## Architecture
//!
//! - **RecordStore**: Abstract trait for whole-document stores with change subscriptions
//! - **InMemoryRecordStore** / **FileRecordStore**: Process-local and JSON-file backends
//! - **LeagueState**: Two record slots plus the standings, chart and focal race
//! - **LeagueSync**: Background task applying store updates to a shared `LeagueState`
//! - **PredictionDesk**: Validated read-modify-write submission of predictions and results
//!
//! ## Usage
//!
//! ```rust
//! use league_store::{load_document, InMemoryRecordStore, RecordStore};
//! use scoring_engine::ResultsRecord;
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = InMemoryRecordStore::new();
//!     store.set("results", json!({"1": {"podium": ["norris", "piastri", "russell"]}})).await?;
//!
//!     let results: ResultsRecord = load_document(&store, "results").await?;
//!     assert_eq!(results.len(), 1);
//!     Ok(())
//! }
//! ```

pub mod backend;
pub mod config;
pub mod desk;
pub mod error;
pub mod local;
pub mod state;
pub mod sync;

#[cfg(test)]
mod test_support;

pub use backend::{decode_document, load_document, save_document, InMemoryRecordStore, RecordStore};
pub use config::{StoreBackendKind, StoreConfig};
pub use desk::{PodiumPick, PredictionDesk, SubmitReceipt};
pub use error::{Result, StoreError, SubmissionError};
pub use local::{create_record_store, FileRecordStore};
pub use state::{LeagueSnapshot, LeagueState};
pub use sync::{LeagueSync, SharedLeagueState};
