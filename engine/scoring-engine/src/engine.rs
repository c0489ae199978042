use crate::calculator::ScoreCalculator;
use crate::config::ScoringConfig;
use crate::models::*;
use chrono::{DateTime, Utc};
use race_calendar::{CalendarEntry, RaceCalendar, RoundKey};
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Derives league views from the predictions and results records.
///
/// Nothing is cached: every call recomputes from its inputs, so results for
/// unchanged inputs are identical.
#[derive(Debug, Clone, Default)]
pub struct ScoringEngine {
    calculator: ScoreCalculator,
}

impl ScoringEngine {
    /// Create a new scoring engine
    pub fn new(config: ScoringConfig) -> Self {
        Self { calculator: ScoreCalculator::new(config) }
    }

    pub fn calculator(&self) -> &ScoreCalculator {
        &self.calculator
    }

    /// Season standings, highest score first; ties are ordered by user name.
    ///
    /// Only rounds that have a result contribute. Users appear once they have a
    /// prediction in at least one completed round.
    pub fn leaderboard(
        &self,
        predictions: &PredictionsRecord,
        results: &ResultsRecord,
    ) -> Vec<LeaderboardEntry> {
        let mut totals: BTreeMap<&str, u32> = BTreeMap::new();

        for (round, by_user) in predictions.rounds() {
            let Some(result) = results.get(round) else {
                continue;
            };
            if RoundKey::parse(round).is_none() {
                warn!("Ignoring round with invalid label {:?}", round);
                continue;
            }
            for (user, prediction) in by_user {
                *totals.entry(user.as_str()).or_insert(0) += self.calculator.score(prediction, result);
            }
        }

        let mut entries: Vec<LeaderboardEntry> = totals
            .into_iter()
            .map(|(user, score)| LeaderboardEntry { user: user.to_string(), score })
            .collect();

        // stable: equal scores keep the name order from the BTreeMap
        entries.sort_by(|a, b| b.score.cmp(&a.score));
        debug!("Computed leaderboard for {} users", entries.len());
        entries
    }

    /// Each user's score for one round, or `None` while the round is pending or
    /// has no predictions
    pub fn round_scores(
        &self,
        predictions: &PredictionsRecord,
        results: &ResultsRecord,
        round: &str,
    ) -> Option<BTreeMap<String, u32>> {
        let result = results.get(round)?;
        let by_user = predictions.round(round)?;

        Some(
            by_user
                .iter()
                .map(|(user, prediction)| (user.clone(), self.calculator.score(prediction, result)))
                .collect(),
        )
    }

    /// Top scorers of a completed round, including every user sharing the top score
    pub fn round_best(
        &self,
        predictions: &PredictionsRecord,
        results: &ResultsRecord,
        round: RoundKey,
    ) -> Option<RoundBest> {
        let scores = self.round_scores(predictions, results, &round.label())?;
        let best = scores.values().copied().max()?;
        let users = scores
            .into_iter()
            .filter(|(_, score)| *score == best)
            .map(|(user, _)| user)
            .collect();

        Some(RoundBest { users, score: best })
    }

    /// Running totals per user, one point per completed round in round order.
    ///
    /// Rounds with a result but no predictions are skipped. A point holds the totals
    /// of the users who predicted that round only.
    pub fn cumulative_series(
        &self,
        predictions: &PredictionsRecord,
        results: &ResultsRecord,
    ) -> Vec<ChartPoint> {
        let mut completed: Vec<(RoundKey, &String, &RaceResult)> = results
            .rounds()
            .filter_map(|(label, result)| match RoundKey::parse(label) {
                Some(round) => Some((round, label, result)),
                None => {
                    warn!("Ignoring result with invalid round label {:?}", label);
                    None
                }
            })
            .collect();
        completed.sort_by_key(|(round, _, _)| *round);

        let mut running: BTreeMap<String, u32> = BTreeMap::new();
        let mut series = Vec::with_capacity(completed.len());

        for (round, label, result) in completed {
            let Some(by_user) = predictions.round(label).filter(|users| !users.is_empty()) else {
                continue;
            };

            let mut scores = BTreeMap::new();
            for (user, prediction) in by_user {
                let total = running.entry(user.clone()).or_insert(0);
                *total += self.calculator.score(prediction, result);
                scores.insert(user.clone(), *total);
            }

            series.push(ChartPoint { round, label: round.chart_label(), scores });
        }

        series
    }

    /// Race currently open for predictions: the first one without a result, or the
    /// final race once the season is complete
    pub fn next_race<'a>(
        &self,
        calendar: &'a RaceCalendar,
        results: &ResultsRecord,
    ) -> Option<&'a CalendarEntry> {
        calendar.next_race(|round| results.has_result(round))
    }

    /// Whether predictions for `entry` are closed at `now`
    pub fn is_locked(&self, entry: &CalendarEntry, now: DateTime<Utc>) -> bool {
        entry.is_locked_at(now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 6, 12, 0, 0).unwrap()
    }

    fn predict(record: &mut PredictionsRecord, round: &str, user: &str, picks: [&str; 3]) {
        record.insert(round, user, Prediction::new(picks[0], picks[1], picks[2], at()));
    }

    fn result(record: &mut ResultsRecord, round: &str, podium: [&str; 3]) {
        record.insert(round, RaceResult::new(podium));
    }

    fn round(n: u32) -> RoundKey {
        RoundKey::new(n).unwrap()
    }

    #[test]
    fn test_leaderboard_ignores_pending_rounds() {
        let engine = ScoringEngine::default();
        let mut predictions = PredictionsRecord::new();
        let mut results = ResultsRecord::new();

        predict(&mut predictions, "1", "Alice", ["a", "b", "c"]);
        result(&mut results, "1", ["a", "b", "c"]);
        assert_eq!(
            engine.leaderboard(&predictions, &results),
            vec![LeaderboardEntry { user: "Alice".to_string(), score: 30 }]
        );

        predict(&mut predictions, "2", "Alice", ["x", "y", "z"]);
        assert_eq!(engine.leaderboard(&predictions, &results)[0].score, 30);
        assert_eq!(engine.cumulative_series(&predictions, &results).len(), 1);
    }

    #[test]
    fn test_leaderboard_order_and_ties() {
        let engine = ScoringEngine::default();
        let mut predictions = PredictionsRecord::new();
        let mut results = ResultsRecord::new();

        result(&mut results, "1", ["a", "b", "c"]);
        predict(&mut predictions, "1", "Robert", ["b", "a", "c"]); // 20
        predict(&mut predictions, "1", "Johan", ["a", "b", "c"]); // 30
        predict(&mut predictions, "1", "Fredrik", ["a", "c", "b"]); // 20
        predict(&mut predictions, "1", "Klas", ["x", "y", "z"]); // 0

        let board = engine.leaderboard(&predictions, &results);
        let order: Vec<(&str, u32)> = board.iter().map(|e| (e.user.as_str(), e.score)).collect();
        assert_eq!(order, vec![("Johan", 30), ("Fredrik", 20), ("Robert", 20), ("Klas", 0)]);

        // recomputing yields the same output
        assert_eq!(board, engine.leaderboard(&predictions, &results));
    }

    #[test]
    fn test_user_with_only_pending_predictions_is_absent() {
        let engine = ScoringEngine::default();
        let mut predictions = PredictionsRecord::new();
        let results = ResultsRecord::new();

        predict(&mut predictions, "1", "Alice", ["a", "b", "c"]);
        assert!(engine.leaderboard(&predictions, &results).is_empty());
    }

    #[test]
    fn test_round_best_lists_all_co_leaders() {
        let engine = ScoringEngine::default();
        let mut predictions = PredictionsRecord::new();
        let mut results = ResultsRecord::new();

        result(&mut results, "1", ["a", "b", "c"]);
        predict(&mut predictions, "1", "Robert", ["a", "b", "x"]);
        predict(&mut predictions, "1", "Johan", ["a", "b", "y"]);
        predict(&mut predictions, "1", "Klas", ["c", "b", "a"]);

        let best = engine.round_best(&predictions, &results, round(1)).unwrap();
        assert_eq!(best, RoundBest { users: vec!["Johan".to_string(), "Robert".to_string()], score: 20 });

        assert!(engine.round_best(&predictions, &results, round(2)).is_none());
    }

    #[test]
    fn test_cumulative_series_uses_numeric_round_order() {
        let engine = ScoringEngine::default();
        let mut predictions = PredictionsRecord::new();
        let mut results = ResultsRecord::new();

        for n in [1, 2, 9, 10] {
            let label = n.to_string();
            result(&mut results, &label, ["a", "b", "c"]);
            predict(&mut predictions, &label, "Alice", ["a", "b", "c"]);
        }

        let labels: Vec<String> = engine
            .cumulative_series(&predictions, &results)
            .into_iter()
            .map(|point| point.label)
            .collect();
        assert_eq!(labels, vec!["R1", "R2", "R9", "R10"]);
    }

    #[test]
    fn test_cumulative_series_carries_totals_without_zero_fill() {
        let engine = ScoringEngine::default();
        let mut predictions = PredictionsRecord::new();
        let mut results = ResultsRecord::new();

        result(&mut results, "1", ["a", "b", "c"]);
        result(&mut results, "2", ["a", "b", "c"]);
        result(&mut results, "3", ["a", "b", "c"]);
        predict(&mut predictions, "1", "Alice", ["a", "b", "c"]); // 30
        predict(&mut predictions, "1", "Bob", ["b", "a", "c"]); // 20
        predict(&mut predictions, "2", "Alice", ["a", "x", "y"]); // 10
        predict(&mut predictions, "3", "Bob", ["a", "b", "c"]); // 30

        let series = engine.cumulative_series(&predictions, &results);
        assert_eq!(series.len(), 3);

        assert_eq!(series[0].scores.get("Alice"), Some(&30));
        assert_eq!(series[0].scores.get("Bob"), Some(&20));
        assert_eq!(series[1].scores.get("Alice"), Some(&40));
        assert_eq!(series[1].scores.get("Bob"), None);
        assert_eq!(series[2].scores.get("Alice"), None);
        assert_eq!(series[2].scores.get("Bob"), Some(&50));
    }

    #[test]
    fn test_cumulative_series_skips_rounds_without_predictions() {
        let engine = ScoringEngine::default();
        let mut predictions = PredictionsRecord::new();
        let mut results = ResultsRecord::new();

        result(&mut results, "1", ["a", "b", "c"]);
        result(&mut results, "2", ["a", "b", "c"]);
        result(&mut results, "final", ["a", "b", "c"]);
        predict(&mut predictions, "2", "Alice", ["a", "b", "c"]);

        let series = engine.cumulative_series(&predictions, &results);
        assert_eq!(series.len(), 1);
        assert_eq!(series[0].round, round(2));

        // a round whose entries were all dropped on decode counts as unpredicted
        let predictions: PredictionsRecord = serde_json::from_value(serde_json::json!({
            "1": {"Alice": {"first": "a"}},
            "2": {"Alice": {"first": "a", "second": "b", "third": "c"}}
        }))
        .unwrap();
        let series = engine.cumulative_series(&predictions, &results);
        assert_eq!(series.len(), 1);
        assert_eq!(series[0].round, round(2));
    }

    #[test]
    fn test_zero_padded_result_labels_are_ignored() {
        let engine = ScoringEngine::default();
        let mut predictions = PredictionsRecord::new();
        let mut results = ResultsRecord::new();

        result(&mut results, "7", ["a", "b", "c"]);
        result(&mut results, "07", ["a", "b", "c"]);
        predict(&mut predictions, "7", "Alice", ["a", "b", "c"]);
        predict(&mut predictions, "07", "Alice", ["a", "b", "c"]);

        let series = engine.cumulative_series(&predictions, &results);
        assert_eq!(series.len(), 1);
        assert_eq!(series[0].label, "R7");
        assert_eq!(series[0].scores.get("Alice"), Some(&30));
        assert_eq!(engine.leaderboard(&predictions, &results)[0].score, 30);
    }
}
