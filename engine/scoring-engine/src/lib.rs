//! Scoring Engine
//!
//! Scores podium predictions against official results and derives the league views
//! (standings, per-round winners, cumulative series, next race). Every view is a
//! pure function of the predictions record, the results record and the calendar,
//! so callers recompute from scratch whenever either record changes.

pub mod calculator;
pub mod config;
pub mod engine;
pub mod models;

pub use calculator::ScoreCalculator;
pub use config::ScoringConfig;
pub use engine::ScoringEngine;
pub use models::*;
