//! Parsing of user-supplied points in time
//!
//! Every instant handled by the library is an epoch value in milliseconds.
//! [`parse_timestamp`] turns what a user types on the command line into one.

use crate::error::{HistlineError, Result};
use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, TimeZone};

/// 2100-01-01T00:00:00Z in seconds. Integers below this are taken as seconds.
pub const SECONDS_THRESHOLD: i64 = 4_102_444_800;

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
];

/// Parse a timestamp string into Unix epoch milliseconds
///
/// Accepted forms:
/// - Unix timestamp in seconds: `1751055000`
/// - Unix timestamp in milliseconds: `1751055000000`
/// - ISO date-time, optionally with fractional seconds: `2025-06-27T14:30:00`
/// - Date and time separated by a space: `2025-06-27 14:30:00`
/// - Date only, meaning local midnight: `2025-06-27`
/// - RFC 3339 with an explicit offset: `2025-06-27T14:30:00+02:00`
///
/// Date-times without an offset are interpreted in the local time zone.
///
/// # Examples
///
/// ```rust
/// use histline::parse_timestamp;
///
/// assert_eq!(parse_timestamp("1751055000").unwrap(), 1_751_055_000_000);
/// assert_eq!(parse_timestamp("1751055000000").unwrap(), 1_751_055_000_000);
/// assert!(parse_timestamp("yesterday").is_err());
/// ```
///
/// # Errors
///
/// [`HistlineError::InvalidTimestamp`] when no form matches, or when a local
/// date-time does not exist (skipped by a daylight-saving transition).
pub fn parse_timestamp(input: &str) -> Result<i64> {
    let trimmed = input.trim();

    if let Ok(value) = trimmed.parse::<i64>() {
        if value < SECONDS_THRESHOLD {
            return value
                .checked_mul(1000)
                .ok_or_else(|| HistlineError::InvalidTimestamp(input.to_string()));
        }
        return Ok(value);
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(dt.timestamp_millis());
    }

    for format in DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, format) {
            return local_millis(naive, input);
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        if let Some(midnight) = date.and_hms_opt(0, 0, 0) {
            return local_millis(midnight, input);
        }
    }

    Err(HistlineError::InvalidTimestamp(input.to_string()))
}

fn local_millis(naive: NaiveDateTime, input: &str) -> Result<i64> {
    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.timestamp_millis())
        .ok_or_else(|| HistlineError::InvalidTimestamp(input.to_string()))
}
