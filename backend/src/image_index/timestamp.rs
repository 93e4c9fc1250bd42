//! Timestamp extraction for snapshot keys and lookup queries

use std::path::Path;
use std::sync::LazyLock;

use chrono::{DateTime, FixedOffset, NaiveDateTime};
use regex::Regex;

use super::ResolveError;
use crate::civil_time::JST;

/// Format accepted for lookup queries
pub const QUERY_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Extensions (lowercase) treated as images under the `last_modified` policy
pub const IMAGE_EXTENSIONS: [&str; 6] = ["jpg", "jpeg", "png", "gif", "bmp", "webp"];

/// `YYYY[-]MM[-]DD_HH[-]MM[-]SS` anywhere in a key
static KEY_TIMESTAMP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\d{4}-?\d{2}-?\d{2}_\d{2}-?\d{2}-?\d{2}").expect("Invalid regex")
});

static QUERY_SHAPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\d{4}-\d{2}-\d{2} \d{2}:\d{2}:\d{2}$").expect("Invalid regex")
});

/// Extracts the capture time embedded in a snapshot key.
///
/// Only the first timestamp-shaped substring is considered. Hyphens are stripped and
/// the rest is read as `YYYYMMDD_HHMMSS`; a match that is not a real calendar
/// date-time yields `None`.
#[must_use]
pub fn extract_key_timestamp(key: &str) -> Option<NaiveDateTime> {
    let matched = KEY_TIMESTAMP.find(key)?;
    let normalized = matched.as_str().replace('-', "");
    NaiveDateTime::parse_from_str(&normalized, "%Y%m%d_%H%M%S").ok()
}

/// Whether the key ends in one of [`IMAGE_EXTENSIONS`], ignoring case
#[must_use]
pub fn has_image_extension(key: &str) -> bool {
    Path::new(key)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            IMAGE_EXTENSIONS
                .iter()
                .any(|allowed| ext.eq_ignore_ascii_case(allowed))
        })
}

/// Parses a lookup query as JST civil time.
///
/// # Errors
///
/// Returns `ResolveError::MalformedQuery` when the input is not exactly
/// `YYYY-MM-DD HH:MM:SS` or does not name a real date-time.
pub fn parse_query(input: &str) -> Result<DateTime<FixedOffset>, ResolveError> {
    if !QUERY_SHAPE.is_match(input) {
        return Err(ResolveError::MalformedQuery(format!(
            "Invalid timestamp format '{input}': expected YYYY-MM-DD HH:MM:SS"
        )));
    }

    let civil = NaiveDateTime::parse_from_str(input, QUERY_FORMAT).map_err(|e| {
        ResolveError::MalformedQuery(format!("Invalid timestamp '{input}': {e}"))
    })?;

    Ok(DateTime::from_naive_utc_and_offset(civil - JST, JST))
}
