//! Shared query parameter types for API handlers.

use serde::Deserialize;
use silo_core::error::CoreError;
use silo_core::query::FeedQuery;

/// `?limit=&start_date=&end_date=` on `GET /api/data`.
///
/// Dates are kept as raw strings so a malformed value produces a 400 with a
/// readable message rather than an extractor rejection.
#[derive(Debug, Default, Deserialize)]
pub struct DataQueryParams {
    pub limit: Option<i64>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

impl DataQueryParams {
    /// Parse and clamp into a [`FeedQuery`].
    pub fn to_feed_query(&self) -> Result<FeedQuery, CoreError> {
        FeedQuery::from_raw(
            self.limit,
            self.start_date.as_deref(),
            self.end_date.as_deref(),
        )
    }
}

#[cfg(test)]
mod tests {
    use silo_core::query::{DEFAULT_FEED_LIMIT, MAX_FEED_LIMIT};

    use super::*;

    #[test]
    fn empty_params_use_default_limit() {
        let q = DataQueryParams::default().to_feed_query().unwrap();
        assert_eq!(q.limit, DEFAULT_FEED_LIMIT);
        assert!(q.start.is_none() && q.end.is_none());
    }

    #[test]
    fn oversized_limit_is_capped() {
        let params = DataQueryParams {
            limit: Some(50_000),
            ..Default::default()
        };
        assert_eq!(params.to_feed_query().unwrap().limit, MAX_FEED_LIMIT);
    }

    #[test]
    fn malformed_date_is_a_validation_error() {
        let params = DataQueryParams {
            start_date: Some("yesterday".into()),
            ..Default::default()
        };
        assert!(matches!(
            params.to_feed_query(),
            Err(CoreError::Validation(_))
        ));
    }
}
