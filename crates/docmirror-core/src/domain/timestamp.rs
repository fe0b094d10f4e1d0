//! Timestamp comparator
//!
//! Decides whether a remote record is newer than its cached counterpart.
//! Only whole seconds are significant: a forward delta of at least one
//! second is an update, anything else (equal, backwards, or a sub-second
//! difference) is not.

use chrono::{DateTime, NaiveDateTime, Utc};

use super::errors::DomainError;
use super::record::Record;

/// Naive layouts accepted in addition to RFC 3339; interpreted as UTC.
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
];

/// Parse a calendar timestamp
///
/// Accepts RFC 3339 (`2024-01-02T03:04:05.000Z`, `+08:00` offsets) and
/// offset-less `YYYY-MM-DD[T ]HH:MM:SS[.fff]`, which is taken as UTC.
#[must_use]
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}

/// Returns true iff `current` is at least one whole second newer than `cached`
///
/// # Errors
/// Returns [`DomainError::MalformedTimestamp`] if either record lacks a
/// parseable `field`. Callers must not guess "changed" or "unchanged".
pub fn is_newer(cached: &Record, current: &Record, field: &str) -> Result<bool, DomainError> {
    let before = cached.timestamp(field)?;
    let after = current.timestamp(field)?;
    // num_seconds truncates toward zero, dropping the sub-second part
    Ok((after - before).num_seconds() > 0)
}
