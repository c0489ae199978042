use crate::models::SessionKind;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the schedule fetcher
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetcherConfig {
    /// API base URL, including the version segment
    pub base_url: String,

    /// Version prefix used to derive endpoint names for error messages
    pub api_version_prefix: String,

    /// Season to load (e.g., 2026)
    pub season: i32,

    /// Per-request timeout in seconds
    pub request_timeout_secs: u64,

    /// Retry configuration for rate-limited requests
    pub retry: RetryConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Additional attempts after the first request
    pub max_retries: u32,

    /// Delay before the first retry in milliseconds
    pub initial_delay_ms: u64,

    /// Backoff multiplier
    pub backoff_multiplier: f64,

    /// Upper bound for a single delay in milliseconds
    pub max_delay_ms: u64,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openf1.org/v1".to_string(),
            api_version_prefix: "/v1/".to_string(),
            season: 2026,
            request_timeout_secs: 30,
            retry: RetryConfig::default(),
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self { max_retries: 4, initial_delay_ms: 1000, backoff_multiplier: 2.0, max_delay_ms: 8000 }
    }
}

impl RetryConfig {
    /// Delay to wait before retry number `retry` (0-based)
    pub fn delay_for(&self, retry: u32) -> Duration {
        let scaled = self.initial_delay_ms as f64 * self.backoff_multiplier.powi(retry as i32);
        Duration::from_millis(scaled.min(self.max_delay_ms as f64) as u64)
    }

    /// Total number of attempts including the first one
    pub fn max_attempts(&self) -> u32 {
        self.max_retries + 1
    }
}

impl FetcherConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn meetings_url(&self) -> String {
        format!("{}/meetings?year={}", self.base_url, self.season)
    }

    /// Sessions of one kind for the season
    pub fn sessions_url(&self, kind: SessionKind) -> String {
        format!("{}/sessions?year={}&session_name={}", self.base_url, self.season, kind.as_str())
    }

    /// Driver roster for one session, or `"latest"`
    pub fn drivers_url(&self, session_key: &str) -> String {
        format!("{}/drivers?session_key={}", self.base_url, session_key)
    }
}
