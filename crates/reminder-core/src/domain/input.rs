//! Registration input parsing.
//!
//! Callers validate before they register; the queue itself accepts any
//! due time, including ones in the past.

use chrono::{DateTime, NaiveDateTime, Utc};

use super::errors::InputError;

/// Layout of the joined `date` + `time` form fields.
const DUE_TIME_FORMAT: &str = "%Y-%m-%d-%H:%M";

/// Parse a `YYYY-MM-DD` date and an `HH:MM` time into a UTC due time.
pub fn parse_due_time(date: &str, time: &str) -> Result<DateTime<Utc>, InputError> {
    let joined = format!("{}-{}", date.trim(), time.trim());
    NaiveDateTime::parse_from_str(&joined, DUE_TIME_FORMAT)
        .map(|naive| naive.and_utc())
        .map_err(|source| InputError::InvalidDueTime {
            input: joined,
            source,
        })
}
