use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use league_store::{
    FileRecordStore, InMemoryRecordStore, LeagueState, PodiumPick, RecordStore, StoreConfig,
    SubmissionError,
};
use prediction_league_service::{LeagueService, ServiceConfig};
use race_calendar::RoundKey;
use schedule_fetcher::{FetcherConfig, HttpReply, HttpSource, ScheduleLoader};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

const BASE: &str = "https://api.openf1.org/v1";

/// Serves fixed replies per URL; anything else is a 404
#[derive(Default)]
struct FixedSource {
    replies: HashMap<String, HttpReply>,
}

impl FixedSource {
    fn season() -> Self {
        Self::default()
            .reply("meetings?year=2026", 200, MEETINGS)
            .reply("sessions?year=2026&session_name=Race", 200, RACES)
            .reply("sessions?year=2026&session_name=Qualifying", 200, QUALIFYING)
            // first race session in the list has no roster yet
            .reply("drivers?session_key=2002", 200, "[]")
            .reply("drivers?session_key=latest", 200, DRIVERS)
    }

    fn reply(mut self, path: &str, status: u16, body: &str) -> Self {
        self.replies.insert(format!("{BASE}/{path}"), HttpReply::new(status, body));
        self
    }
}

#[async_trait]
impl HttpSource for FixedSource {
    async fn get(&self, url: &str) -> anyhow::Result<HttpReply> {
        Ok(self.replies.get(url).cloned().unwrap_or_else(|| HttpReply::new(404, "")))
    }
}

const MEETINGS: &str = r#"[
    {"meeting_key": 10, "meeting_name": "Bahrain Grand Prix", "circuit_short_name": "Sakhir", "country_name": "Bahrain"},
    {"meeting_key": 20, "meeting_name": "Saudi Arabian Grand Prix", "circuit_short_name": "Jeddah", "country_name": "Saudi Arabia"},
    {"meeting_key": 30, "meeting_name": "Australian Grand Prix", "location": "Melbourne", "country_name": "Australia"}
]"#;

const RACES: &str = r#"[
    {"session_key": 2002, "meeting_key": 20, "session_name": "Race", "date_start": "2026-03-15T17:00:00+00:00"},
    {"session_key": 1002, "meeting_key": 10, "session_name": "Race", "date_start": "2026-03-08T15:00:00+00:00"},
    {"session_key": 3002, "meeting_key": 30, "session_name": "Race", "date_start": "2026-03-22T04:00:00+00:00"},
    {"session_key": 4002, "meeting_key": 40, "session_name": "Race", "date_start": "2026-03-29T04:00:00+00:00"}
]"#;

const QUALIFYING: &str = r#"[
    {"session_key": 1001, "meeting_key": 10, "session_name": "Qualifying", "date_start": "2026-03-07T16:00:00+00:00"},
    {"session_key": 2001, "meeting_key": 20, "session_name": "Qualifying", "date_start": "2026-03-14T17:00:00+00:00"}
]"#;

const DRIVERS: &str = r#"[
    {"first_name": "Max", "last_name": "Verstappen", "name_acronym": "VER", "driver_number": 1, "team_name": "Red Bull Racing"},
    {"first_name": "Lando", "last_name": "Norris", "name_acronym": "NOR", "driver_number": 4, "team_name": "McLaren"},
    {"first_name": "Oscar", "last_name": "Piastri", "name_acronym": "PIA", "driver_number": 81, "team_name": "McLaren"},
    {"first_name": "Mick", "last_name": "Schumacher", "name_acronym": "MSC", "driver_number": 47, "team_name": "Haas"},
    {"first_name": "Ralf", "last_name": "Schumacher", "name_acronym": "RSC", "driver_number": 6, "team_name": "Toyota"}
]"#;

fn at(day: u32, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, day, hour, 0, 0).unwrap()
}

fn round(n: u32) -> RoundKey {
    RoundKey::new(n).unwrap()
}

fn memory_config() -> ServiceConfig {
    ServiceConfig { store: StoreConfig::in_memory(), ..Default::default() }
}

async fn start(config: ServiceConfig, store: Arc<dyn RecordStore>) -> anyhow::Result<LeagueService> {
    let loader = ScheduleLoader::with_source(FetcherConfig::default(), FixedSource::season());
    LeagueService::start_with(config, &loader, store).await
}

async fn wait_for<F>(service: &LeagueService, mut done: F)
where
    F: FnMut(&LeagueState) -> bool,
{
    let mut revisions = service.revisions();
    let state = service.state();
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            if done(&*state.read().await) {
                return;
            }
            revisions.changed().await.unwrap();
        }
    })
    .await
    .expect("league state did not update");
}

#[tokio::test]
async fn test_load_builds_calendar_and_roster() {
    let service = start(memory_config(), Arc::new(InMemoryRecordStore::new())).await.unwrap();

    let calendar = service.calendar();
    let meetings: Vec<u64> = calendar.iter().map(|entry| entry.meeting_key).collect();
    assert_eq!(meetings, vec![10, 20, 30]);
    assert_eq!(calendar.get(round(3)).map(|e| e.circuit.as_str()), Some("Melbourne"));
    assert_eq!(calendar.get(round(3)).and_then(|e| e.qualifying_start), None);

    let registry = service.registry();
    assert_eq!(registry.len(), 5);
    assert!(registry.contains("schumacher"));
    assert!(registry.contains("schumacher-6"));
    assert_eq!(registry.display_name("norris"), "Lando Norris");

    let (next, locked) = service.next_race(at(1, 12)).await.unwrap();
    assert_eq!(next.round, round(1));
    assert!(!locked);
}

#[tokio::test]
async fn test_season_flow() {
    let service = start(memory_config(), Arc::new(InMemoryRecordStore::new())).await.unwrap();

    service
        .submit("Robert", PodiumPick::new("verstappen", "norris", "piastri"), at(1, 12))
        .await
        .unwrap();
    service
        .submit("Klas", PodiumPick::new("norris", "verstappen", "piastri"), at(2, 12))
        .await
        .unwrap();
    wait_for(&service, |state| state.predictions().round("1").map(|r| r.len()) == Some(2)).await;

    // nothing is scored until the result is in
    assert!(service.snapshot().await.leaderboard.is_empty());

    service
        .publish_result(round(1), PodiumPick::new("verstappen", "norris", "piastri"))
        .await
        .unwrap();
    wait_for(&service, |state| state.results().has_result(round(1))).await;

    let snapshot = service.snapshot().await;
    let standings: Vec<(&str, u32)> =
        snapshot.leaderboard.iter().map(|e| (e.user.as_str(), e.score)).collect();
    assert_eq!(standings, vec![("Robert", 30), ("Klas", 20)]);
    assert_eq!(snapshot.chart.len(), 1);
    assert_eq!(snapshot.chart[0].label, "R1");
    assert_eq!(snapshot.next_race.as_ref().map(|r| r.round), Some(round(2)));

    let view = service.round_view(round(1)).await.unwrap();
    assert_eq!(view.best.map(|b| b.users), Some(vec!["Robert".to_string()]));
    assert_eq!(view.scores.and_then(|s| s.get("Klas").copied()), Some(20));

    // round 2 qualifying started at 17:00 on the 14th
    let err = service
        .submit("Johan", PodiumPick::new("norris", "piastri", "verstappen"), at(14, 18))
        .await
        .unwrap_err();
    assert_eq!(err, SubmissionError::Locked(round(2)));
    assert_eq!(err.to_string(), "Voting is closed! Qualifying has already started for round 2.");
}

#[tokio::test]
async fn test_validation_messages() {
    let service = start(memory_config(), Arc::new(InMemoryRecordStore::new())).await.unwrap();

    let incomplete = PodiumPick { first: Some("norris".to_string()), ..Default::default() };
    let err = service.submit("Fredrik", incomplete, at(1, 12)).await.unwrap_err();
    assert_eq!(err.to_string(), "Please select all three podium positions");

    let err = service
        .submit("Fredrik", PodiumPick::new("norris", "norris", "piastri"), at(1, 12))
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Please select three different drivers");

    let err = service
        .submit("Mallory", PodiumPick::new("norris", "verstappen", "piastri"), at(1, 12))
        .await
        .unwrap_err();
    assert!(matches!(err, SubmissionError::UnknownMember(_)));
}

#[tokio::test]
async fn test_load_failure_names_endpoint() {
    let source = FixedSource::season().reply("sessions?year=2026&session_name=Qualifying", 500, "");
    let loader = ScheduleLoader::with_source(FetcherConfig::default(), source);

    let result =
        LeagueService::start_with(memory_config(), &loader, Arc::new(InMemoryRecordStore::new())).await;
    let err = result.err().expect("load should fail");
    assert!(format!("{err:#}").contains("sessions API: 500"));
}

#[tokio::test]
async fn test_predictions_survive_restart() {
    let temp_dir = TempDir::new().unwrap();
    let config = ServiceConfig { store: StoreConfig::new(temp_dir.path()), ..Default::default() };

    let store: Arc<dyn RecordStore> = Arc::new(FileRecordStore::new(temp_dir.path()).unwrap());
    let service = start(config.clone(), store).await.unwrap();
    service
        .submit("Johan", PodiumPick::new("piastri", "norris", "verstappen"), at(3, 9))
        .await
        .unwrap();
    service.shutdown();
    drop(service);

    let store: Arc<dyn RecordStore> = Arc::new(FileRecordStore::new(temp_dir.path()).unwrap());
    let service = start(config, store).await.unwrap();
    let pick = service.current_pick("Johan").await;
    assert_eq!(pick, Some(PodiumPick::new("piastri", "norris", "verstappen")));
}
