//! Timestamp parsing for query filters and localized display formatting.
//!
//! Filter values arrive from HTML `datetime-local` style inputs as well as
//! full RFC 3339 strings, so parsing accepts both. Values without an offset
//! are taken as UTC.

use chrono::{FixedOffset, NaiveDate, NaiveDateTime, TimeZone, Utc};

use crate::error::CoreError;
use crate::types::Timestamp;

/// Day-first date and time, as the dashboard shows timestamps (`19/10/2026 14:03:05`).
pub const LOCAL_DATETIME_FORMAT: &str = "%d/%m/%Y %H:%M:%S";

/// Day-first date used for period ranges.
pub const LOCAL_DATE_FORMAT: &str = "%d/%m/%Y";

/// Naive layouts accepted after RFC 3339 fails, tried in order.
const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Parse a `start_date` / `end_date` filter value.
///
/// Accepts RFC 3339 (`2026-10-19T14:00:00Z`), naive date-times with or
/// without seconds (`2026-10-19T14:00`), and plain dates (`2026-10-19`,
/// interpreted as midnight UTC).
pub fn parse_filter_timestamp(input: &str) -> Result<Timestamp, CoreError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(CoreError::Validation("Date filter must not be empty".into()));
    }

    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(trimmed) {
        return Ok(dt.with_timezone(&Utc));
    }

    for format in NAIVE_DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Ok(Utc.from_utc_datetime(&naive));
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        if let Some(midnight) = date.and_hms_opt(0, 0, 0) {
            return Ok(Utc.from_utc_datetime(&midnight));
        }
    }

    Err(CoreError::Validation(format!(
        "Invalid date '{trimmed}'. Expected ISO 8601, e.g. 2026-10-19T14:00"
    )))
}

/// Build a display offset from a number of minutes east of UTC.
pub fn offset_from_minutes(minutes: i32) -> Result<FixedOffset, CoreError> {
    minutes
        .checked_mul(60)
        .and_then(FixedOffset::east_opt)
        .ok_or_else(|| {
            CoreError::Validation(format!("UTC offset of {minutes} minutes is out of range"))
        })
}

/// Format a timestamp as local date and time in the given offset.
pub fn format_local(ts: &Timestamp, offset: &FixedOffset) -> String {
    ts.with_timezone(offset)
        .format(LOCAL_DATETIME_FORMAT)
        .to_string()
}

/// Format only the local calendar date of a timestamp.
pub fn format_local_date(ts: &Timestamp, offset: &FixedOffset) -> String {
    ts.with_timezone(offset).format(LOCAL_DATE_FORMAT).to_string()
}
