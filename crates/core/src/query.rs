//! Feed query parameters shared by the backend and the dashboard.

use crate::error::CoreError;
use crate::time::parse_filter_timestamp;
use crate::types::Timestamp;

/// Rows returned when no limit is given.
pub const DEFAULT_FEED_LIMIT: i64 = 100;

/// Upper bound on rows per query.
pub const MAX_FEED_LIMIT: i64 = 1000;

/// Clamp a user-provided limit to valid bounds.
pub fn clamp_limit(limit: Option<i64>, default: i64, max: i64) -> i64 {
    limit.unwrap_or(default).max(1).min(max)
}

/// A validated `{limit, start_date?, end_date?}` filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeedQuery {
    pub limit: i64,
    pub start: Option<Timestamp>,
    pub end: Option<Timestamp>,
}

impl Default for FeedQuery {
    fn default() -> Self {
        Self {
            limit: DEFAULT_FEED_LIMIT,
            start: None,
            end: None,
        }
    }
}

impl FeedQuery {
    /// Build from raw request values. Empty date strings count as absent.
    pub fn from_raw(
        limit: Option<i64>,
        start: Option<&str>,
        end: Option<&str>,
    ) -> Result<Self, CoreError> {
        let parse = |raw: Option<&str>| -> Result<Option<Timestamp>, CoreError> {
            match raw.map(str::trim).filter(|s| !s.is_empty()) {
                Some(s) => parse_filter_timestamp(s).map(Some),
                None => Ok(None),
            }
        };

        Self::new(limit, parse(start)?, parse(end)?)
    }

    /// Clamp the limit and check the range is not inverted.
    pub fn new(
        limit: Option<i64>,
        start: Option<Timestamp>,
        end: Option<Timestamp>,
    ) -> Result<Self, CoreError> {
        if let (Some(s), Some(e)) = (start, end) {
            if s > e {
                return Err(CoreError::Validation(
                    "start_date must not be after end_date".into(),
                ));
            }
        }

        Ok(Self {
            limit: clamp_limit(limit, DEFAULT_FEED_LIMIT, MAX_FEED_LIMIT),
            start,
            end,
        })
    }
}
