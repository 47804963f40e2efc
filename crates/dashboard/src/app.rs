//! The refresh cycle and the watch loop.
//!
//! One cycle: fetch, drop the response if a newer fetch was issued meanwhile,
//! evaluate alerts under the shared [`AlertState`] lock, aggregate stats.
//! A raised alert is handed to the notifier on a background task; the cycle
//! returns without waiting for delivery. Rendering is left to the caller so
//! the cycle stays testable.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{FixedOffset, Offset, Utc};
use silo_core::alert::{Alert, AlertDecision, AlertEvaluator, AlertState};
use silo_core::query::FeedQuery;
use silo_core::reading::SensorReading;
use silo_core::series::ChartSeries;
use silo_core::stats::{aggregate, ReadingStats};
use silo_core::types::Timestamp;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use crate::fetcher::DataFetcher;
use crate::notify::{lock_writer, Banner, Notifier, SharedWriter};
use crate::render::render_view;

/// Everything one accepted refresh produced.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardView {
    pub request_id: u64,
    pub readings: Vec<SensorReading>,
    pub series: ChartSeries,
    pub stats: ReadingStats,
    /// Set when the fetch failed; the other fields are then empty.
    pub error: Option<String>,
    /// The alert raised by this cycle, if any.
    pub alert: Option<Alert>,
    pub offset: FixedOffset,
}

impl Default for DashboardView {
    fn default() -> Self {
        Self {
            request_id: 0,
            readings: Vec::new(),
            series: ChartSeries::default(),
            stats: ReadingStats::empty(),
            error: None,
            alert: None,
            offset: Utc.fix(),
        }
    }
}

/// Consecutive stale responses before the watch loop warns that the backend
/// is slower than the refresh interval.
pub const STALE_WARN_AFTER: u32 = 3;

impl DashboardView {
    /// Banner text for this view: the alert it raised, else `fallback`.
    pub fn banner_text(&self, fallback: Option<String>) -> Option<String> {
        self.alert.as_ref().map(Alert::plain_text).or(fallback)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RefreshOutcome {
    /// A newer fetch was issued before this one answered. Nothing changed.
    Stale { request_id: u64 },
    Updated(DashboardView),
}

/// Dashboard session: fetcher, evaluator, cooldown state and sinks.
pub struct Dashboard {
    fetcher: DataFetcher,
    evaluator: AlertEvaluator,
    alert_state: Mutex<AlertState>,
    notifier: Arc<Notifier>,
    deliveries: TaskTracker,
    stale_streak: AtomicU32,
    offset: FixedOffset,
}

impl Dashboard {
    pub fn new(
        fetcher: DataFetcher,
        evaluator: AlertEvaluator,
        notifier: Notifier,
        offset: FixedOffset,
    ) -> Self {
        Self {
            fetcher,
            evaluator,
            alert_state: Mutex::new(AlertState::default()),
            notifier: Arc::new(notifier),
            deliveries: TaskTracker::new(),
            stale_streak: AtomicU32::new(0),
            offset,
        }
    }

    pub async fn alert_state(&self) -> AlertState {
        *self.alert_state.lock().await
    }

    /// Stale responses received since the last accepted one.
    pub fn stale_streak(&self) -> u32 {
        self.stale_streak.load(Ordering::Relaxed)
    }

    /// Wait for every alert delivery spawned so far to finish.
    pub async fn wait_for_deliveries(&self) {
        self.deliveries.close();
        self.deliveries.wait().await;
        self.deliveries.reopen();
    }

    /// Run one cycle at the current time.
    pub async fn refresh(&self, query: &FeedQuery) -> RefreshOutcome {
        self.refresh_at(query, Utc::now()).await
    }

    /// Run one cycle, treating `now` as the evaluation time.
    pub async fn refresh_at(&self, query: &FeedQuery, now: Timestamp) -> RefreshOutcome {
        let outcome = self.fetcher.fetch(query).await;

        let decision = {
            let mut state = self.alert_state.lock().await;
            if !self.fetcher.tracker().is_current(outcome.request_id) {
                self.record_stale(outcome.request_id);
                return RefreshOutcome::Stale {
                    request_id: outcome.request_id,
                };
            }
            self.stale_streak.store(0, Ordering::Relaxed);
            self.evaluator.evaluate(&outcome.readings, &mut state, now)
        };

        let alert = match decision {
            AlertDecision::Raised(alert) => {
                tracing::warn!(lines = alert.lines.len(), "Threshold alert raised");
                let notifier = Arc::clone(&self.notifier);
                let delivered = alert.clone();
                self.deliveries.spawn(async move {
                    notifier.notify(&delivered).await;
                });
                Some(alert)
            }
            AlertDecision::Suppressed {
                violations,
                remaining,
            } => {
                tracing::debug!(
                    violations = violations.len(),
                    remaining_secs = remaining.as_secs(),
                    "Alert suppressed by cooldown",
                );
                None
            }
            AlertDecision::Clear => None,
        };

        RefreshOutcome::Updated(DashboardView {
            request_id: outcome.request_id,
            stats: aggregate(&outcome.readings),
            readings: outcome.readings,
            series: outcome.series,
            error: outcome.error,
            alert,
            offset: self.offset,
        })
    }

    fn record_stale(&self, request_id: u64) {
        let streak = self.stale_streak.fetch_add(1, Ordering::Relaxed) + 1;
        if streak == STALE_WARN_AFTER {
            tracing::warn!(
                streak,
                "Backend answers slower than the refresh interval, responses are going stale",
            );
        } else {
            tracing::debug!(request_id, streak, "Discarding stale response");
        }
    }
}

/// Refresh every `interval` until `cancel` fires, printing each accepted
/// view to `out`.
///
/// Each cycle runs as its own task, so a slow response can be overtaken by
/// the next tick and is then discarded as stale. The query is rebuilt on
/// every tick so relative windows move with the clock.
pub async fn run_watch<Q>(
    dashboard: Arc<Dashboard>,
    make_query: Q,
    interval: Duration,
    banner: Arc<Banner>,
    out: SharedWriter,
    cancel: CancellationToken,
) where
    Q: Fn(Timestamp) -> Option<FeedQuery>,
{
    let tasks = TaskTracker::new();
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            () = cancel.cancelled() => {
                tracing::info!("Watch loop stopping");
                break;
            }
            _ = ticker.tick() => {
                let Some(query) = make_query(Utc::now()) else {
                    continue;
                };
                let dashboard = Arc::clone(&dashboard);
                let banner = Arc::clone(&banner);
                let out = Arc::clone(&out);
                tasks.spawn(async move {
                    if let RefreshOutcome::Updated(view) = dashboard.refresh(&query).await {
                        let mut out = lock_writer(&out);
                        let shown = view.banner_text(banner.current());
                        if let Err(e) = render_view(&mut *out, &view, shown.as_deref(), 1) {
                            tracing::warn!(error = %e, "Failed to render view");
                        }
                    }
                });
            }
        }
    }

    tasks.close();
    tasks.wait().await;
    dashboard.wait_for_deliveries().await;
}
