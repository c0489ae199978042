use crate::config::ScoringConfig;
use crate::models::{Prediction, RaceResult};

/// Number of podium places that count
const PODIUM_PLACES: usize = 3;

/// Scores a podium prediction against an actual podium
#[derive(Debug, Clone, Default)]
pub struct ScoreCalculator {
    config: ScoringConfig,
}

impl ScoreCalculator {
    /// Create a new score calculator
    pub fn new(config: ScoringConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    /// Score a prediction against a result
    pub fn score(&self, prediction: &Prediction, result: &RaceResult) -> u32 {
        self.score_slots(prediction.slots(), &result.podium)
    }

    /// Score three predicted drivers against the actual finishing order.
    ///
    /// Each slot earns points by how far the driver's actual podium place is from the
    /// predicted one: exact, one place off, or two places off. Drivers who missed
    /// the podium earn nothing. Only the first three entries of `podium` count.
    pub fn score_slots(&self, picks: [&str; 3], podium: &[String]) -> u32 {
        let top = &podium[..podium.len().min(PODIUM_PLACES)];

        picks
            .iter()
            .enumerate()
            .map(|(slot, driver)| {
                top.iter()
                    .position(|placed| placed == driver)
                    .map_or(0, |found| self.config.points_for_distance(found.abs_diff(slot)))
            })
            .sum()
    }
}
