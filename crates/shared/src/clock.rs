//! Wall-clock helpers for time-of-day schedules.
//!
//! Medication times are stored as hour and minute only. These helpers turn
//! them into concrete local date-times for a given "now".

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use thiserror::Error;

/// Error type for time-of-day parsing.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TimeOfDayError {
    #[error("Invalid time of day format, expected HH:MM")]
    InvalidFormat,
    #[error("Time of day out of range")]
    OutOfRange,
}

/// Parses `HH:MM` (or `HH:MM:SS`, seconds dropped) into a minute-precision time.
pub fn parse_time_of_day(value: &str) -> Result<NaiveTime, TimeOfDayError> {
    let mut parts = value.trim().split(':');
    let hour = parts.next().ok_or(TimeOfDayError::InvalidFormat)?;
    let minute = parts.next().ok_or(TimeOfDayError::InvalidFormat)?;
    if let Some(second) = parts.next() {
        second
            .parse::<u32>()
            .map_err(|_| TimeOfDayError::InvalidFormat)?;
    }
    if parts.next().is_some() {
        return Err(TimeOfDayError::InvalidFormat);
    }

    let hour: u32 = hour.parse().map_err(|_| TimeOfDayError::InvalidFormat)?;
    let minute: u32 = minute.parse().map_err(|_| TimeOfDayError::InvalidFormat)?;

    NaiveTime::from_hms_opt(hour, minute, 0).ok_or(TimeOfDayError::OutOfRange)
}

/// Drops seconds and sub-second precision.
pub fn truncate_to_minute(time: NaiveTime) -> NaiveTime {
    NaiveTime::from_hms_opt(time.hour(), time.minute(), 0).unwrap_or(time)
}

/// Formats a time as `HH:MM`.
pub fn format_time_of_day(time: NaiveTime) -> String {
    time.format("%H:%M").to_string()
}

/// The date-time at which `time` falls on `date`.
pub fn scheduled_on(date: NaiveDate, time: NaiveTime) -> NaiveDateTime {
    date.and_time(truncate_to_minute(time))
}

/// Next wall-clock occurrence of `time` strictly after `now`.
///
/// If today's occurrence has already passed (or is exactly now), the
/// occurrence tomorrow is returned.
pub fn next_occurrence(time: NaiveTime, now: NaiveDateTime) -> NaiveDateTime {
    let today = scheduled_on(now.date(), time);
    if today > now {
        today
    } else {
        today + Duration::days(1)
    }
}

/// Serde adapter storing a `NaiveTime` as `HH:MM`.
pub mod hh_mm {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&super::format_time_of_day(*time))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        super::parse_time_of_day(&raw).map_err(serde::de::Error::custom)
    }
}
