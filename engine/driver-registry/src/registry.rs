use crate::types::{Driver, DriverLookupError};
use schedule_fetcher::RawDriver;
use std::collections::{HashMap, HashSet};
use tracing::{debug, info};

/// Build the driver roster from raw OpenF1 records.
///
/// The id is the lowercased surname. When a surname was already taken by an
/// earlier record (in input order), the later driver's id gets `-{number}`
/// appended; the first driver always keeps the bare surname. The result is
/// sorted by full name.
pub fn build_roster(raw: &[RawDriver]) -> Vec<Driver> {
    let mut seen_surnames: HashSet<String> = HashSet::new();

    let mut drivers: Vec<Driver> = raw
        .iter()
        .map(|record| {
            let surname = record.last_name.to_lowercase();
            let id = if seen_surnames.contains(&surname) {
                let id = format!("{surname}-{}", record.driver_number);
                debug!("Surname collision for {}, using id {}", record.full_name(), id);
                id
            } else {
                surname.clone()
            };
            seen_surnames.insert(surname);

            Driver {
                id,
                full_name: record.full_name(),
                code: record.name_acronym.clone().unwrap_or_default(),
                number: record.driver_number,
                team: record.team_name.clone().unwrap_or_default(),
            }
        })
        .collect();

    drivers.sort_by(|a, b| a.full_name.cmp(&b.full_name));
    drivers
}

/// Driver Registry - the current roster plus id lookups
#[derive(Debug, Clone, Default)]
pub struct DriverRegistry {
    /// Drivers sorted by full name
    drivers: Vec<Driver>,

    /// Map from driver id to position in `drivers`
    by_id: HashMap<String, usize>,
}

impl DriverRegistry {
    /// Build a registry from raw driver records
    pub fn from_raw(raw: &[RawDriver]) -> Self {
        let registry = Self::from_drivers(build_roster(raw));
        info!("Registered {} drivers", registry.len());
        registry
    }

    pub fn from_drivers(drivers: Vec<Driver>) -> Self {
        let by_id = drivers.iter().enumerate().map(|(i, d)| (d.id.clone(), i)).collect();
        Self { drivers, by_id }
    }

    /// All drivers, sorted by full name
    pub fn drivers(&self) -> &[Driver] {
        &self.drivers
    }

    pub fn len(&self) -> usize {
        self.drivers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.drivers.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.by_id.contains_key(id)
    }

    /// Get a driver by id
    pub fn get_by_id(&self, id: &str) -> Result<&Driver, DriverLookupError> {
        if self.drivers.is_empty() {
            return Err(DriverLookupError::RosterEmpty);
        }
        self.by_id
            .get(id)
            .map(|&i| &self.drivers[i])
            .ok_or_else(|| DriverLookupError::DriverNotFound(id.to_string()))
    }

    /// Full name for an id, or the id itself for drivers no longer on the roster
    pub fn display_name(&self, id: &str) -> String {
        self.get_by_id(id).map(|d| d.full_name.clone()).unwrap_or_else(|_| id.to_string())
    }

    /// Acronym for an id, or the first three characters of the id in uppercase
    pub fn display_code(&self, id: &str) -> String {
        match self.get_by_id(id) {
            Ok(driver) if !driver.code.is_empty() => driver.code.clone(),
            _ => id.chars().take(3).collect::<String>().to_uppercase(),
        }
    }

    pub fn team(&self, id: &str) -> Option<&str> {
        self.get_by_id(id).ok().map(|d| d.team.as_str()).filter(|team| !team.is_empty())
    }

    /// Search for drivers by partial name match
    pub fn search(&self, query: &str) -> Vec<&Driver> {
        let query_lower = query.to_lowercase();
        self.drivers
            .iter()
            .filter(|driver| driver.full_name.to_lowercase().contains(&query_lower))
            .collect()
    }
}
