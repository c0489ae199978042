use serde::{Deserialize, Serialize};
use std::fmt;

/// A driver as used by predictions and results
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Driver {
    /// Stable id (e.g., "verstappen", or "smith-44" on a surname collision)
    pub id: String,

    /// "First Last"
    pub full_name: String,

    /// Three-letter acronym (e.g., "VER")
    pub code: String,

    /// Car number
    pub number: u32,

    /// Team name, empty when the source did not report one
    pub team: String,
}

/// Errors that can occur during driver lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DriverLookupError {
    /// No driver with this id in the roster
    DriverNotFound(String),

    /// Roster has not been loaded
    RosterEmpty,
}

impl fmt::Display for DriverLookupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DriverLookupError::DriverNotFound(id) => {
                write!(f, "Driver '{id}' not found in roster")
            }
            DriverLookupError::RosterEmpty => write!(f, "Driver roster is empty"),
        }
    }
}

impl std::error::Error for DriverLookupError {}
