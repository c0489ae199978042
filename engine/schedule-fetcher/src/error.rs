//! Error types for schedule fetching

use thiserror::Error;

pub type Result<T> = std::result::Result<T, FetchError>;

/// Errors raised while loading schedule data
#[derive(Error, Debug)]
pub enum FetchError {
    /// HTTP 429 on every attempt
    #[error("{endpoint} API: 429 (rate limited after {attempts} attempts)")]
    RateLimited { endpoint: String, attempts: u32 },

    /// Any other non-success status
    #[error("{endpoint} API: {status}")]
    Status { endpoint: String, status: u16 },

    /// Connection, timeout or body read failure
    #[error("{endpoint} API: request failed: {message}")]
    Transport { endpoint: String, message: String },

    /// Body was not the JSON we expected
    #[error("{endpoint} API: invalid response body: {source}")]
    Decode {
        endpoint: String,
        #[source]
        source: serde_json::Error,
    },

    /// HTTP client could not be constructed
    #[error("HTTP client error: {0}")]
    Client(String),
}

impl FetchError {
    /// Endpoint name the error refers to, if any
    pub fn endpoint(&self) -> Option<&str> {
        match self {
            FetchError::RateLimited { endpoint, .. }
            | FetchError::Status { endpoint, .. }
            | FetchError::Transport { endpoint, .. }
            | FetchError::Decode { endpoint, .. } => Some(endpoint),
            FetchError::Client(_) => None,
        }
    }

    /// HTTP status code carried by the error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            FetchError::RateLimited { .. } => Some(429),
            FetchError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}
