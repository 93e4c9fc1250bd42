//! Civil time of the greenhouse
//!
//! Sensor keys, camera captures and dashboard queries are all expressed as JST
//! wall-clock time, independent of the AWS region the data lives in.

use chrono::{DateTime, FixedOffset, NaiveDateTime, Utc};

pub use sensor_storage::INSERT_DATE_FORMAT;

/// Japan Standard Time, UTC+09:00
pub const JST: FixedOffset = match FixedOffset::east_opt(9 * 3600) {
    Some(offset) => offset,
    None => panic!("UTC+09:00 is a valid offset"),
};

/// Current JST wall-clock time
#[must_use]
pub fn now_jst() -> NaiveDateTime {
    Utc::now().with_timezone(&JST).naive_local()
}

/// Formats a civil time the way sensor sort keys are written
#[must_use]
pub fn format_key(civil: NaiveDateTime) -> String {
    civil.format(INSERT_DATE_FORMAT).to_string()
}

/// Parses an ISO-8601 timestamp into JST civil time.
///
/// Values carrying `Z` or an explicit offset are converted to JST; naive values
/// (`YYYY-MM-DDTHH:MM:SS[.fff]` or `YYYY-MM-DD HH:MM:SS`) are kept as they are.
///
/// # Errors
///
/// Returns a description of the problem when `input` is not ISO-8601.
pub fn parse_iso_to_civil(input: &str) -> Result<NaiveDateTime, String> {
    let input = input.trim();

    if let Ok(zoned) = DateTime::parse_from_rfc3339(input) {
        return Ok(zoned.with_timezone(&JST).naive_local());
    }

    ["%Y-%m-%dT%H:%M:%S%.f", INSERT_DATE_FORMAT]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(input, format).ok())
        .ok_or_else(|| format!("'{input}' is not an ISO-8601 timestamp"))
}

/// Renders JST civil time as RFC 3339 with an explicit `+09:00`
#[must_use]
pub fn to_rfc3339(civil: NaiveDateTime) -> String {
    DateTime::<FixedOffset>::from_naive_utc_and_offset(civil - JST, JST).to_rfc3339()
}
