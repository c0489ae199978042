//! Error types for the league store

use race_calendar::RoundKey;
use thiserror::Error;

/// Result type alias for store operations
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors raised by record store backends
#[derive(Error, Debug)]
pub enum StoreError {
    /// I/O errors (file operations)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Document name that cannot be stored
    #[error("Invalid document name: {0:?}")]
    InvalidDocument(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),
}

impl StoreError {
    /// Create a new configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}

/// Reasons a prediction or result write is refused or fails.
///
/// Validation failures are detected before anything is written.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SubmissionError {
    #[error("'{0}' is not a member of this league")]
    UnknownMember(String),

    #[error("No race is open for predictions")]
    NoFocalRace,

    #[error("Voting is closed! Qualifying has already started for round {0}.")]
    Locked(RoundKey),

    #[error("Please select all three podium positions")]
    IncompletePodium,

    #[error("Please select three different drivers")]
    DuplicateDriver,

    #[error("Round {0} is not on the calendar")]
    UnknownRound(RoundKey),

    /// The store rejected the write or could not be reached
    #[error("Error submitting vote: {0}")]
    Storage(String),
}

impl From<StoreError> for SubmissionError {
    fn from(err: StoreError) -> Self {
        SubmissionError::Storage(err.to_string())
    }
}
