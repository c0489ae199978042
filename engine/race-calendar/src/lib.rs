//! Race Calendar
//!
//! Joins meetings with their race and qualifying sessions into an ordered,
//! numbered calendar. The calendar is rebuilt wholesale from every fetch.

pub mod calendar;
pub mod round;

pub use calendar::{build_calendar, CalendarEntry, RaceCalendar};
pub use round::RoundKey;
