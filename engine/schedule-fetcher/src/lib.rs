//! Schedule Fetcher
//!
//! Pulls the raw meeting, session and driver collections for one season from the
//! OpenF1 API. Rate-limited requests are retried with exponential backoff; any other
//! failure aborts the whole load.

pub mod config;
pub mod error;
pub mod fetcher;
pub mod loader;
pub mod models;

pub use config::{FetcherConfig, RetryConfig};
pub use error::{FetchError, Result};
pub use fetcher::{endpoint_label, fetch_json, HttpReply, HttpSource, ReqwestSource};
pub use loader::{RosterStrategy, ScheduleBundle, ScheduleLoader};
pub use models::*;
