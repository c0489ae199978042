use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// OpenF1 meeting record (one Grand Prix weekend)
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct RaceMeeting {
    pub meeting_key: u64,

    pub meeting_name: String,

    #[serde(default)]
    pub circuit_short_name: Option<String>,

    #[serde(default)]
    pub location: Option<String>,

    pub country_name: String,
}

impl RaceMeeting {
    /// Circuit label, falling back to the meeting location
    pub fn circuit_label(&self) -> String {
        self.circuit_short_name
            .as_deref()
            .filter(|name| !name.is_empty())
            .or(self.location.as_deref())
            .unwrap_or_default()
            .to_string()
    }
}

/// Session types the league cares about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SessionKind {
    Race,
    Qualifying,
}

impl SessionKind {
    /// Value of the `session_name` query parameter
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionKind::Race => "Race",
            SessionKind::Qualifying => "Qualifying",
        }
    }

    pub fn from_session_name(name: &str) -> Option<Self> {
        match name {
            "Race" => Some(SessionKind::Race),
            "Qualifying" => Some(SessionKind::Qualifying),
            _ => None,
        }
    }
}

impl fmt::Display for SessionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// OpenF1 session record
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct SessionRecord {
    pub session_key: u64,

    pub meeting_key: u64,

    #[serde(default)]
    pub session_name: Option<String>,

    pub date_start: DateTime<Utc>,

    /// Kind of the query that returned this record
    #[serde(skip)]
    pub queried_as: Option<SessionKind>,
}

impl SessionRecord {
    /// Kind named by `session_name`; records without a name take the kind of the
    /// query that produced them
    pub fn kind(&self) -> Option<SessionKind> {
        match self.session_name.as_deref() {
            Some(name) => SessionKind::from_session_name(name),
            None => self.queried_as,
        }
    }
}

/// OpenF1 driver record, as returned for a single session
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct RawDriver {
    pub first_name: String,

    pub last_name: String,

    #[serde(default)]
    pub name_acronym: Option<String>,

    pub driver_number: u32,

    #[serde(default)]
    pub team_name: Option<String>,
}

impl RawDriver {
    /// "First Last"
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}
