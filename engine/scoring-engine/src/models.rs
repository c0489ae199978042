use chrono::{DateTime, Utc};
use race_calendar::RoundKey;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::warn;

/// One user's podium prediction for one round
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prediction {
    pub first: String,
    pub second: String,
    pub third: String,

    /// When the prediction was last submitted; older entries may not carry one
    #[serde(rename = "timestamp", default, skip_serializing_if = "Option::is_none")]
    pub submitted_at: Option<DateTime<Utc>>,
}

impl Prediction {
    pub fn new(
        first: impl Into<String>,
        second: impl Into<String>,
        third: impl Into<String>,
        submitted_at: DateTime<Utc>,
    ) -> Self {
        Self {
            first: first.into(),
            second: second.into(),
            third: third.into(),
            submitted_at: Some(submitted_at),
        }
    }

    /// Predicted drivers in finishing order
    pub fn slots(&self) -> [&str; 3] {
        [&self.first, &self.second, &self.third]
    }
}

/// Official result of one round
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RaceResult {
    /// Driver ids in finishing order, winner first
    pub podium: Vec<String>,
}

impl RaceResult {
    pub fn new(podium: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self { podium: podium.into_iter().map(Into::into).collect() }
    }
}

/// Predictions document: round label -> user -> prediction.
///
/// Entries that do not decode are skipped one at a time with a warning, so a
/// single bad entry never hides the rest of the document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct PredictionsRecord(BTreeMap<String, BTreeMap<String, Prediction>>);

impl<'de> Deserialize<'de> for PredictionsRecord {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = BTreeMap::<String, BTreeMap<String, Value>>::deserialize(deserializer)?;

        let mut rounds = BTreeMap::new();
        for (round, by_user) in raw {
            let predictions: &mut BTreeMap<String, Prediction> = rounds.entry(round.clone()).or_default();
            for (user, value) in by_user {
                match serde_json::from_value(value) {
                    Ok(prediction) => {
                        predictions.insert(user, prediction);
                    }
                    Err(e) => warn!("Skipping prediction of {} for round {}: {}", user, round, e),
                }
            }
        }

        Ok(Self(rounds))
    }
}

impl PredictionsRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Predictions for one round, keyed by user
    pub fn round(&self, round: &str) -> Option<&BTreeMap<String, Prediction>> {
        self.0.get(round)
    }

    pub fn get(&self, round: &str, user: &str) -> Option<&Prediction> {
        self.0.get(round).and_then(|users| users.get(user))
    }

    /// Insert or replace a user's prediction for a round
    pub fn insert(&mut self, round: &str, user: &str, prediction: Prediction) -> Option<Prediction> {
        self.0.entry(round.to_string()).or_default().insert(user.to_string(), prediction)
    }

    pub fn rounds(&self) -> impl Iterator<Item = (&String, &BTreeMap<String, Prediction>)> {
        self.0.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Results document: round label -> result. Undecodable rounds are skipped with a
/// warning.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ResultsRecord(BTreeMap<String, RaceResult>);

impl<'de> Deserialize<'de> for ResultsRecord {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = BTreeMap::<String, Value>::deserialize(deserializer)?;

        let mut results = BTreeMap::new();
        for (round, value) in raw {
            match serde_json::from_value(value) {
                Ok(result) => {
                    results.insert(round, result);
                }
                Err(e) => warn!("Skipping result for round {}: {}", round, e),
            }
        }

        Ok(Self(results))
    }
}

impl ResultsRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, round: &str) -> Option<&RaceResult> {
        self.0.get(round)
    }

    pub fn has_result(&self, round: RoundKey) -> bool {
        self.0.contains_key(&round.label())
    }

    /// Record or replace the result for a round
    pub fn insert(&mut self, round: &str, result: RaceResult) -> Option<RaceResult> {
        self.0.insert(round.to_string(), result)
    }

    pub fn rounds(&self) -> impl Iterator<Item = (&String, &RaceResult)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Season total for one user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub user: String,
    pub score: u32,
}

/// Cumulative totals after one completed round.
///
/// Only users who predicted this round appear; a missing user means "no change
/// reported", not a reset to zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartPoint {
    pub round: RoundKey,
    pub label: String,
    pub scores: BTreeMap<String, u32>,
}

/// Best scorers of a single round; several users may share the top score
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundBest {
    pub users: Vec<String>,
    pub score: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_predictions_document_shape() {
        let record: PredictionsRecord = serde_json::from_value(serde_json::json!({
            "1": {
                "Robert": {
                    "first": "norris",
                    "second": "verstappen",
                    "third": "leclerc",
                    "timestamp": "2026-03-06T10:00:00.000Z"
                }
            }
        }))
        .unwrap();

        let prediction = record.get("1", "Robert").unwrap();
        assert_eq!(prediction.slots(), ["norris", "verstappen", "leclerc"]);
        assert!(record.get("1", "Klas").is_none());
        assert!(record.get("2", "Robert").is_none());
    }

    #[test]
    fn test_results_document_shape() {
        let record: ResultsRecord = serde_json::from_value(serde_json::json!({
            "1": { "podium": ["norris", "verstappen", "russell"] }
        }))
        .unwrap();

        assert!(record.has_result(RoundKey::new(1).unwrap()));
        assert!(!record.has_result(RoundKey::new(2).unwrap()));
        assert_eq!(record.get("1").unwrap().podium[0], "norris");
    }

    #[test]
    fn test_prediction_without_timestamp_is_kept() {
        let record: PredictionsRecord = serde_json::from_value(serde_json::json!({
            "1": {
                "Robert": {"first": "a", "second": "b", "third": "c", "timestamp": "2026-03-06T10:00:00Z"},
                "Klas": {"first": "c", "second": "b", "third": "a"}
            }
        }))
        .unwrap();

        let klas = record.get("1", "Klas").unwrap();
        assert_eq!(klas.slots(), ["c", "b", "a"]);
        assert_eq!(klas.submitted_at, None);
        assert!(record.get("1", "Robert").unwrap().submitted_at.is_some());

        // no timestamp key is written back for such entries
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["1"]["Klas"], serde_json::json!({"first": "c", "second": "b", "third": "a"}));
    }

    #[test]
    fn test_malformed_entries_are_skipped_individually() {
        let record: PredictionsRecord = serde_json::from_value(serde_json::json!({
            "1": {
                "Robert": {"first": "a", "second": "b", "third": "c"},
                "Johan": {"first": "a"},
                "Fredrik": "a,b,c"
            },
            "2": {
                "Fredrik": {"first": "a", "second": "b"}
            }
        }))
        .unwrap();

        assert!(record.get("1", "Robert").is_some());
        assert!(record.get("1", "Johan").is_none());
        assert!(record.get("1", "Fredrik").is_none());
        // the round stays known even when every entry was dropped
        assert_eq!(record.round("2").map(|r| r.len()), Some(0));

        let results: ResultsRecord = serde_json::from_value(serde_json::json!({
            "1": {"podium": ["a", "b", "c"]},
            "2": {"winner": "a"}
        }))
        .unwrap();
        assert_eq!(results.len(), 1);
        assert!(results.has_result(RoundKey::new(1).unwrap()));
    }
}
