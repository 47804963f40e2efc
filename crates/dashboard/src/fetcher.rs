//! DataFetcher: one authenticated feed query per refresh.
//!
//! The fetcher never fails. Network errors, rejected tokens and `{error}`
//! payloads all come back as an empty [`FetchOutcome`] carrying a message.
//! Each fetch is stamped with a request id from a shared [`RequestTracker`]
//! so the caller can drop responses that were overtaken by a newer fetch.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::FixedOffset;
use silo_core::query::FeedQuery;
use silo_core::reading::{usable_readings, SensorReading};
use silo_core::series::ChartSeries;

use crate::client::ApiClient;

/// Hands out monotonically increasing request ids and remembers the latest.
#[derive(Debug, Default)]
pub struct RequestTracker {
    latest: AtomicU64,
}

impl RequestTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue the next id. Ids start at 1.
    pub fn begin(&self) -> u64 {
        self.latest.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Whether `id` is still the most recently issued one.
    pub fn is_current(&self, id: u64) -> bool {
        self.latest.load(Ordering::SeqCst) == id
    }
}

/// Result of one fetch. `error` is set exactly when the fetch failed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FetchOutcome {
    pub request_id: u64,
    /// Usable readings in the order the API returned them (newest first).
    pub readings: Vec<SensorReading>,
    pub series: ChartSeries,
    pub error: Option<String>,
}

impl FetchOutcome {
    fn failed(request_id: u64, message: String) -> Self {
        Self {
            request_id,
            error: Some(message),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }
}

/// Fetches readings for one session.
#[derive(Debug, Clone)]
pub struct DataFetcher {
    client: ApiClient,
    token: String,
    offset: FixedOffset,
    tracker: Arc<RequestTracker>,
}

impl DataFetcher {
    pub fn new(client: ApiClient, token: impl Into<String>, offset: FixedOffset) -> Self {
        Self {
            client,
            token: token.into(),
            offset,
            tracker: Arc::new(RequestTracker::new()),
        }
    }

    pub fn tracker(&self) -> &Arc<RequestTracker> {
        &self.tracker
    }

    /// Run one query. Never returns an error; see [`FetchOutcome::error`].
    pub async fn fetch(&self, query: &FeedQuery) -> FetchOutcome {
        let request_id = self.tracker.begin();
        tracing::debug!(request_id, limit = query.limit, "Fetching readings");

        let feeds = match self.client.fetch_feeds(&self.token, query).await {
            Ok(feeds) => feeds,
            Err(e) => {
                tracing::warn!(request_id, error = %e, "Fetch failed");
                return FetchOutcome::failed(request_id, e.to_string());
            }
        };

        let fetched = feeds.len();
        let readings = usable_readings(feeds.into_iter().map(SensorReading::from));
        let series = ChartSeries::from_readings(&readings, &self.offset);

        tracing::debug!(request_id, fetched, usable = readings.len(), "Readings fetched");

        FetchOutcome {
            request_id,
            readings,
            series,
            error: None,
        }
    }
}
