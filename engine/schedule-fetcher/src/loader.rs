use crate::config::FetcherConfig;
use crate::error::{FetchError, Result};
use crate::fetcher::{endpoint_label, fetch_json, HttpSource, ReqwestSource};
use crate::models::{RaceMeeting, RawDriver, SessionKind, SessionRecord};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt;
use tracing::{debug, error, info};

/// One step of the driver roster lookup.
///
/// The roster is first requested for the season's first race session; when that
/// yields nothing usable (an empty or non-list body) the latest session is tried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RosterStrategy {
    FirstRaceSession(u64),
    LatestSession,
}

impl RosterStrategy {
    /// Ordered steps to try for a given set of race sessions
    pub fn plan(race_sessions: &[SessionRecord]) -> Vec<RosterStrategy> {
        let mut steps = Vec::with_capacity(2);
        if let Some(first) = race_sessions.first() {
            steps.push(RosterStrategy::FirstRaceSession(first.session_key));
        }
        steps.push(RosterStrategy::LatestSession);
        steps
    }

    /// Value of the `session_key` query parameter
    pub fn session_param(&self) -> String {
        match self {
            RosterStrategy::FirstRaceSession(key) => key.to_string(),
            RosterStrategy::LatestSession => "latest".to_string(),
        }
    }
}

impl fmt::Display for RosterStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RosterStrategy::FirstRaceSession(key) => write!(f, "first race session ({key})"),
            RosterStrategy::LatestSession => f.write_str("latest session"),
        }
    }
}

/// Raw collections for one season
#[derive(Debug, Clone, Default)]
pub struct ScheduleBundle {
    pub meetings: Vec<RaceMeeting>,
    pub race_sessions: Vec<SessionRecord>,
    pub qualifying_sessions: Vec<SessionRecord>,
    pub drivers: Vec<RawDriver>,

    /// Step that produced the roster, `None` when every step came back empty
    pub roster_source: Option<RosterStrategy>,
}

/// Loads every collection the league needs in one go
pub struct ScheduleLoader<S: HttpSource = ReqwestSource> {
    config: FetcherConfig,
    source: S,
}

impl ScheduleLoader<ReqwestSource> {
    /// Create a loader backed by a real HTTP client
    pub fn new(config: FetcherConfig) -> Result<Self> {
        let source = ReqwestSource::new(&config)?;
        Ok(Self { config, source })
    }
}

impl<S: HttpSource> ScheduleLoader<S> {
    pub fn with_source(config: FetcherConfig, source: S) -> Self {
        Self { config, source }
    }

    pub fn config(&self) -> &FetcherConfig {
        &self.config
    }

    /// Fetch meetings, race sessions and qualifying sessions in parallel, then the
    /// driver roster. Any failure aborts the whole load; there is no partial result.
    pub async fn load(&self) -> Result<ScheduleBundle> {
        info!("Loading {} season schedule from {}", self.config.season, self.config.base_url);

        let meetings_url = self.config.meetings_url();
        let result = tokio::try_join!(
            self.fetch_collection::<RaceMeeting>(&meetings_url),
            self.fetch_sessions(SessionKind::Race),
            self.fetch_sessions(SessionKind::Qualifying),
        );

        let (meetings, race_sessions, qualifying_sessions) = match result {
            Ok(collections) => collections,
            Err(e) => {
                error!("Schedule load failed: {}", e);
                return Err(e);
            }
        };

        let (drivers, roster_source) = self.fetch_roster(&race_sessions).await.inspect_err(|e| {
            error!("Driver roster load failed: {}", e);
        })?;

        info!(
            "Loaded {} meetings, {} race sessions, {} qualifying sessions, {} drivers",
            meetings.len(),
            race_sessions.len(),
            qualifying_sessions.len(),
            drivers.len()
        );

        Ok(ScheduleBundle { meetings, race_sessions, qualifying_sessions, drivers, roster_source })
    }

    /// Walk the roster strategy until one step returns a non-empty list
    pub async fn fetch_roster(
        &self,
        race_sessions: &[SessionRecord],
    ) -> Result<(Vec<RawDriver>, Option<RosterStrategy>)> {
        for step in RosterStrategy::plan(race_sessions) {
            let url = self.config.drivers_url(&step.session_param());
            let body = fetch_json(&self.source, &url, &self.config).await?;

            match body {
                Value::Array(items) if !items.is_empty() => {
                    let drivers = self.decode::<RawDriver>(&url, Value::Array(items))?;
                    info!("Driver roster taken from {}", step);
                    return Ok((drivers, Some(step)));
                }
                _ => info!("No drivers returned for {}, trying next source", step),
            }
        }

        Ok((Vec::new(), None))
    }

    /// Sessions of one kind. Records are tagged with the query kind, and records
    /// whose own name says otherwise are dropped.
    async fn fetch_sessions(&self, kind: SessionKind) -> Result<Vec<SessionRecord>> {
        let url = self.config.sessions_url(kind);
        let mut sessions: Vec<SessionRecord> = self.fetch_collection(&url).await?;

        let fetched = sessions.len();
        for session in &mut sessions {
            session.queried_as = Some(kind);
        }
        sessions.retain(|session| session.kind() == Some(kind));

        if sessions.len() < fetched {
            debug!("Dropped {} sessions that are not {}", fetched - sessions.len(), kind);
        }
        Ok(sessions)
    }

    async fn fetch_collection<T: DeserializeOwned>(&self, url: &str) -> Result<Vec<T>> {
        let body = fetch_json(&self.source, url, &self.config).await?;
        self.decode(url, body)
    }

    fn decode<T: DeserializeOwned>(&self, url: &str, body: Value) -> Result<Vec<T>> {
        serde_json::from_value(body).map_err(|source| FetchError::Decode {
            endpoint: endpoint_label(url, &self.config.api_version_prefix),
            source,
        })
    }
}
