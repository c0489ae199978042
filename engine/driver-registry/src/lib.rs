//! Driver Registry - Maps OpenF1 drivers to stable league identifiers
//!
//! Predictions and results refer to drivers by an id derived from the surname.
//! The registry builds those ids and answers display lookups for them.

pub mod registry;
pub mod types;

pub use registry::{build_roster, DriverRegistry};
pub use types::{Driver, DriverLookupError};
