use crate::round::RoundKey;
use chrono::{DateTime, Utc};
use schedule_fetcher::{RaceMeeting, SessionRecord};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, info};

/// One race of the season
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarEntry {
    pub round: RoundKey,
    pub name: String,
    pub circuit: String,
    pub country: String,
    pub race_start: DateTime<Utc>,
    pub qualifying_start: Option<DateTime<Utc>>,
    pub meeting_key: u64,
}

impl CalendarEntry {
    /// Predictions close once qualifying has started. Without a known qualifying
    /// start the race never locks.
    pub fn is_locked_at(&self, now: DateTime<Utc>) -> bool {
        self.qualifying_start.is_some_and(|start| now >= start)
    }
}

/// Season calendar ordered by race start, rounds numbered 1..N
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RaceCalendar {
    entries: Vec<CalendarEntry>,
}

impl RaceCalendar {
    pub fn entries(&self) -> &[CalendarEntry] {
        &self.entries
    }

    pub fn iter(&self) -> impl Iterator<Item = &CalendarEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, round: RoundKey) -> Option<&CalendarEntry> {
        // rounds are dense, so the position is the round number minus one
        self.entries.get(round.number() as usize - 1)
    }

    pub fn first(&self) -> Option<&CalendarEntry> {
        self.entries.first()
    }

    pub fn last(&self) -> Option<&CalendarEntry> {
        self.entries.last()
    }

    /// First race without a result. Once every race has one, the last race stays
    /// in focus so there is still something to show.
    pub fn next_race<F>(&self, mut is_complete: F) -> Option<&CalendarEntry>
    where
        F: FnMut(RoundKey) -> bool,
    {
        self.entries.iter().find(|entry| !is_complete(entry.round)).or_else(|| self.last())
    }
}

impl IntoIterator for RaceCalendar {
    type Item = CalendarEntry;
    type IntoIter = std::vec::IntoIter<CalendarEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

/// Join meetings with race and qualifying sessions.
///
/// Only race sessions whose meeting is known produce an entry. Entries are sorted
/// by race start (stable on ties) and numbered in that order. Duplicate meeting
/// keys resolve to the last record seen.
pub fn build_calendar(
    meetings: &[RaceMeeting],
    race_sessions: &[SessionRecord],
    qualifying_sessions: &[SessionRecord],
) -> RaceCalendar {
    let meetings_by_key: HashMap<u64, &RaceMeeting> =
        meetings.iter().map(|m| (m.meeting_key, m)).collect();
    let qualifying_by_key: HashMap<u64, &SessionRecord> =
        qualifying_sessions.iter().map(|q| (q.meeting_key, q)).collect();

    let mut races: Vec<(DateTime<Utc>, &RaceMeeting, &SessionRecord)> = race_sessions
        .iter()
        .filter_map(|session| {
            let meeting = meetings_by_key.get(&session.meeting_key)?;
            Some((session.date_start, *meeting, session))
        })
        .collect();

    let skipped = race_sessions.len() - races.len();
    if skipped > 0 {
        debug!("Skipped {} race sessions without a matching meeting", skipped);
    }

    races.sort_by_key(|(start, _, _)| *start);

    let entries: Vec<CalendarEntry> = races
        .into_iter()
        .zip(1u32..)
        .filter_map(|((race_start, meeting, session), number)| {
            Some(CalendarEntry {
                round: RoundKey::new(number)?,
                name: meeting.meeting_name.clone(),
                circuit: meeting.circuit_label(),
                country: meeting.country_name.clone(),
                race_start,
                qualifying_start: qualifying_by_key
                    .get(&session.meeting_key)
                    .map(|q| q.date_start),
                meeting_key: session.meeting_key,
            })
        })
        .collect();

    info!("Built race calendar with {} rounds", entries.len());
    RaceCalendar { entries }
}
