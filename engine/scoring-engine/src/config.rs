use serde::{Deserialize, Serialize};

/// Points awarded per predicted podium slot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoringConfig {
    /// Driver finished exactly where predicted
    pub exact_points: u32,

    /// Driver on the podium, one place away
    pub off_by_one_points: u32,

    /// Driver on the podium, two places away
    pub off_by_two_points: u32,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self { exact_points: 10, off_by_one_points: 5, off_by_two_points: 2 }
    }
}

impl ScoringConfig {
    /// Points for a driver found `distance` places from the predicted slot
    pub fn points_for_distance(&self, distance: usize) -> u32 {
        match distance {
            0 => self.exact_points,
            1 => self.off_by_one_points,
            2 => self.off_by_two_points,
            _ => 0,
        }
    }

    /// Score of a perfect prediction
    pub fn max_score(&self) -> u32 {
        self.exact_points * 3
    }
}
