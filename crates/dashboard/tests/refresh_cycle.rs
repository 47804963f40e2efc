//! Fetch and refresh-cycle tests against an in-process stub of the API.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use assert_matches::assert_matches;
use async_trait::async_trait;
use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{FixedOffset, TimeZone, Utc};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::sync::Mutex as AsyncMutex;

use silo_core::alert::{Alert, AlertDecision, AlertEvaluator, AlertState, AlertThresholds};
use silo_core::query::FeedQuery;
use silo_core::reading::SensorReading;
use silo_dashboard::app::{Dashboard, RefreshOutcome};
use silo_dashboard::client::ApiClient;
use silo_dashboard::fetcher::DataFetcher;
use silo_dashboard::notify::{AlertSink, EmailForwardSink, Notifier};

const TOKEN: &str = "stub-token";

// ---------------------------------------------------------------------------
// Stub backend
// ---------------------------------------------------------------------------

/// Bind `router` on an ephemeral port and return the `/api` base URL.
async fn spawn_stub(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}/api")
}

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == format!("Bearer {TOKEN}"))
}

/// Serve a fixed `/api/data` body to authorized callers.
fn data_router(body: Value) -> Router {
    Router::new().route(
        "/api/data",
        get(move |headers: HeaderMap| {
            let body = body.clone();
            async move {
                if !authorized(&headers) {
                    return (
                        StatusCode::UNAUTHORIZED,
                        Json(json!({ "error": "Invalid or expired token" })),
                    )
                        .into_response();
                }
                Json(body).into_response()
            }
        }),
    )
}

fn utc() -> FixedOffset {
    FixedOffset::east_opt(0).unwrap()
}

fn fetcher(base_url: &str, token: &str) -> DataFetcher {
    DataFetcher::new(ApiClient::new(base_url).unwrap(), token, utc())
}

/// Newest-first feed with one humidity violation (80%) in the middle.
fn violating_feeds() -> Value {
    json!({ "feeds": [
        { "id": 3, "field1": 65.0, "field2": 22.0, "created_at": "2026-10-19T12:00:00Z" },
        { "id": 2, "field1": 80.0, "field2": 22.0, "created_at": "2026-10-19T11:00:00Z" },
        { "id": 1, "field1": 55.0, "field2": 22.0, "created_at": "2026-10-19T10:00:00Z" },
    ]})
}

/// Counts deliveries.
#[derive(Default, Clone)]
struct CountingSink {
    delivered: Arc<AtomicUsize>,
    last_text: Arc<Mutex<Option<String>>>,
}

#[async_trait]
impl AlertSink for CountingSink {
    fn name(&self) -> &'static str {
        "counting"
    }

    async fn deliver(&self, alert: &Alert) -> anyhow::Result<()> {
        self.delivered.fetch_add(1, Ordering::SeqCst);
        *self.last_text.lock().unwrap() = Some(alert.plain_text());
        Ok(())
    }
}

fn dashboard(base_url: &str, sink: CountingSink) -> Dashboard {
    Dashboard::new(
        fetcher(base_url, TOKEN),
        AlertEvaluator::new(AlertThresholds::default(), utc()),
        Notifier::new().with_sink(sink),
        utc(),
    )
}

// ---------------------------------------------------------------------------
// DataFetcher
// ---------------------------------------------------------------------------

#[tokio::test]
async fn fetch_keeps_only_usable_readings_in_order() {
    let base = spawn_stub(data_router(json!({ "feeds": [
        { "id": 3, "field1": "64.5", "field2": 21.0, "created_at": "2026-10-19T12:00:00Z" },
        { "id": 2, "field1": null, "field2": 21.0, "created_at": "2026-10-19T11:00:00Z" },
        { "id": 1, "field1": 63.0, "field2": 20.0, "created_at": "2026-10-19T10:00:00Z" },
    ]})))
    .await;

    let outcome = fetcher(&base, TOKEN).fetch(&FeedQuery::default()).await;

    assert_eq!(outcome.error, None);
    assert_eq!(outcome.readings.len(), 2);
    assert_eq!(outcome.readings[0].humidity, Some(64.5));
    assert_eq!(outcome.series.humidity, vec![64.5, 63.0]);
    assert_eq!(outcome.series.labels[0], "19/10/2026 12:00:00");
}

#[tokio::test]
async fn error_payload_becomes_empty_result_with_message() {
    let base = spawn_stub(data_router(json!({ "error": "x" }))).await;

    let outcome = fetcher(&base, TOKEN).fetch(&FeedQuery::default()).await;

    assert!(outcome.is_empty());
    assert!(outcome.series.is_empty());
    assert_eq!(outcome.error.as_deref(), Some("x"));
}

#[tokio::test]
async fn rejected_token_becomes_message() {
    let base = spawn_stub(data_router(violating_feeds())).await;

    let outcome = fetcher(&base, "wrong").fetch(&FeedQuery::default()).await;

    assert!(outcome.is_empty());
    assert_eq!(outcome.error.as_deref(), Some("Invalid or expired token"));
}

#[tokio::test]
async fn unreachable_backend_becomes_network_message() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let outcome = fetcher(&format!("http://{addr}/api"), TOKEN)
        .fetch(&FeedQuery::default())
        .await;

    assert!(outcome.is_empty());
    assert!(outcome.error.unwrap().starts_with("Network error"));
}

#[derive(Debug, Deserialize)]
struct SeenQuery {
    limit: i64,
    start_date: Option<String>,
}

#[tokio::test]
async fn filters_are_sent_as_query_parameters() {
    let seen: Arc<Mutex<Option<(i64, Option<String>)>>> = Arc::default();
    let router = Router::new()
        .route(
            "/api/data",
            get(
                |State(seen): State<Arc<Mutex<Option<(i64, Option<String>)>>>>,
                 Query(q): Query<SeenQuery>| async move {
                    *seen.lock().unwrap() = Some((q.limit, q.start_date));
                    Json(json!({ "feeds": [] }))
                },
            ),
        )
        .with_state(Arc::clone(&seen));
    let base = spawn_stub(router).await;

    let start = Utc.with_ymd_and_hms(2026, 10, 12, 0, 0, 0).unwrap();
    let query = FeedQuery::new(Some(50), Some(start), None).unwrap();
    let outcome = fetcher(&base, TOKEN).fetch(&query).await;

    assert_eq!(outcome.error, None);
    let (limit, start_date) = seen.lock().unwrap().clone().unwrap();
    assert_eq!(limit, 50);
    assert_eq!(start_date.as_deref(), Some("2026-10-12T00:00:00+00:00"));
}

// ---------------------------------------------------------------------------
// Refresh cycle
// ---------------------------------------------------------------------------

#[tokio::test]
async fn alert_reports_most_recent_humidity_violation_only() {
    let base = spawn_stub(data_router(violating_feeds())).await;
    let sink = CountingSink::default();
    let dashboard = dashboard(&base, sink.clone());

    let outcome = dashboard.refresh_at(&FeedQuery::default(), Utc::now()).await;

    assert_matches!(outcome, RefreshOutcome::Updated(view) => {
        let alert = view.alert.expect("alert should be raised");
        assert_eq!(alert.lines.len(), 1);
        assert!(alert.lines[0].contains("80.00%"));
        assert_eq!(view.stats.count, 3);
    });
    dashboard.wait_for_deliveries().await;
    assert_eq!(sink.delivered.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn cooldown_allows_one_alert_per_thirty_seconds() {
    let base = spawn_stub(data_router(violating_feeds())).await;
    let sink = CountingSink::default();
    let dashboard = dashboard(&base, sink.clone());
    let query = FeedQuery::default();
    let t0 = Utc.with_ymd_and_hms(2026, 10, 19, 12, 0, 0).unwrap();

    dashboard.refresh_at(&query, t0).await;
    dashboard.refresh_at(&query, t0 + chrono::Duration::seconds(10)).await;
    dashboard.wait_for_deliveries().await;
    assert_eq!(sink.delivered.load(Ordering::SeqCst), 1);
    assert_eq!(dashboard.alert_state().await.last_raised_at, Some(t0));

    dashboard.refresh_at(&query, t0 + chrono::Duration::seconds(31)).await;
    dashboard.wait_for_deliveries().await;
    assert_eq!(sink.delivered.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn cycles_at_the_same_instant_raise_once() {
    let base = spawn_stub(data_router(violating_feeds())).await;
    let sink = CountingSink::default();
    let dashboard = dashboard(&base, sink.clone());
    let query = FeedQuery::default();
    let now = Utc::now();

    let first = dashboard.refresh_at(&query, now).await;
    let second = dashboard.refresh_at(&query, now).await;

    assert_matches!(first, RefreshOutcome::Updated(view) => assert!(view.alert.is_some()));
    assert_matches!(second, RefreshOutcome::Updated(view) => assert!(view.alert.is_none()));
    dashboard.wait_for_deliveries().await;
    assert_eq!(sink.delivered.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn concurrent_evaluations_share_one_cooldown() {
    let readings = vec![SensorReading::new(
        Some(80.0),
        Some(22.0),
        Utc.with_ymd_and_hms(2026, 10, 19, 12, 0, 0).unwrap(),
    )];
    let evaluator = Arc::new(AlertEvaluator::new(AlertThresholds::default(), utc()));
    let state = Arc::new(AsyncMutex::new(AlertState::default()));
    let now = Utc::now();

    let tasks: Vec<_> = (0..8)
        .map(|_| {
            let evaluator = Arc::clone(&evaluator);
            let state = Arc::clone(&state);
            let readings = readings.clone();
            tokio::spawn(async move {
                let mut state = state.lock().await;
                evaluator.evaluate(&readings, &mut state, now)
            })
        })
        .collect();

    let mut raised = 0;
    for task in tasks {
        if matches!(task.await.unwrap(), AlertDecision::Raised(_)) {
            raised += 1;
        }
    }
    assert_eq!(raised, 1);
    assert_eq!(state.lock().await.last_raised_at, Some(now));
}

#[tokio::test]
async fn slow_mail_relay_does_not_hold_back_the_view() {
    let router = data_router(violating_feeds()).route(
        "/api/auth/send-alert",
        post(|| async {
            tokio::time::sleep(Duration::from_secs(3)).await;
            Json(json!({ "success": true, "message": "Alert sent" }))
        }),
    );
    let base = spawn_stub(router).await;
    let client = ApiClient::new(&base).unwrap();
    let dashboard = Dashboard::new(
        DataFetcher::new(client.clone(), TOKEN, utc()),
        AlertEvaluator::new(AlertThresholds::default(), utc()),
        Notifier::new().with_sink(EmailForwardSink::new(client, TOKEN)),
        utc(),
    );

    let started = Instant::now();
    let outcome = dashboard.refresh(&FeedQuery::default()).await;
    let took = started.elapsed();

    assert_matches!(outcome, RefreshOutcome::Updated(view) => assert!(view.alert.is_some()));
    assert!(took < Duration::from_secs(1), "refresh waited {took:?} for delivery");
}

#[tokio::test]
async fn stale_response_is_discarded_without_touching_alert_state() {
    // `limit=1` answers slowly with violating data; anything else answers
    // immediately with in-band data.
    let router = Router::new().route(
        "/api/data",
        get(|Query(q): Query<SeenQuery>| async move {
            if q.limit == 1 {
                tokio::time::sleep(Duration::from_millis(400)).await;
                return Json(violating_feeds());
            }
            Json(json!({ "feeds": [
                { "id": 9, "field1": 65.0, "field2": 22.0, "created_at": "2026-10-19T12:00:00Z" }
            ]}))
        }),
    );
    let base = spawn_stub(router).await;
    let sink = CountingSink::default();
    let dashboard = dashboard(&base, sink.clone());

    let slow = FeedQuery::new(Some(1), None, None).unwrap();
    let fast = FeedQuery::new(Some(10), None, None).unwrap();

    let slow_cycle = dashboard.refresh(&slow);
    let fast_cycle = async {
        // Let the slow fetch take its request id first.
        tokio::time::sleep(Duration::from_millis(50)).await;
        dashboard.refresh(&fast).await
    };
    let (slow_outcome, fast_outcome) = tokio::join!(slow_cycle, fast_cycle);

    assert_matches!(slow_outcome, RefreshOutcome::Stale { request_id: 1 });
    assert_matches!(fast_outcome, RefreshOutcome::Updated(view) => {
        assert_eq!(view.request_id, 2);
        assert!(view.alert.is_none());
    });
    dashboard.wait_for_deliveries().await;
    assert_eq!(sink.delivered.load(Ordering::SeqCst), 0);
    assert_eq!(dashboard.alert_state().await.last_raised_at, None);
    assert_eq!(dashboard.stale_streak(), 1);

    dashboard.refresh(&fast).await;
    assert_eq!(dashboard.stale_streak(), 0);
}

#[tokio::test]
async fn failed_fetch_yields_error_view_and_no_alert() {
    let base = spawn_stub(data_router(json!({ "error": "x" }))).await;
    let sink = CountingSink::default();
    let dashboard = dashboard(&base, sink.clone());

    let outcome = dashboard.refresh(&FeedQuery::default()).await;

    assert_matches!(outcome, RefreshOutcome::Updated(view) => {
        assert_eq!(view.error.as_deref(), Some("x"));
        assert!(view.readings.is_empty());
        assert_eq!(view.stats.count, 0);
        assert!(view.stats.period.is_none());
    });
    dashboard.wait_for_deliveries().await;
    assert_eq!(sink.delivered.load(Ordering::SeqCst), 0);
}

// ---------------------------------------------------------------------------
// Email forwarding
// ---------------------------------------------------------------------------

#[tokio::test]
async fn email_sink_posts_tag_stripped_text_with_token() {
    let received: Arc<Mutex<Option<String>>> = Arc::default();
    let router = Router::new()
        .route(
            "/api/auth/send-alert",
            post(
                |State(received): State<Arc<Mutex<Option<String>>>>,
                 headers: HeaderMap,
                 Json(body): Json<Value>| async move {
                    if !authorized(&headers) {
                        return StatusCode::UNAUTHORIZED.into_response();
                    }
                    *received.lock().unwrap() = body["message"].as_str().map(str::to_owned);
                    Json(json!({ "success": true, "message": "Alert sent" })).into_response()
                },
            ),
        )
        .with_state(Arc::clone(&received));
    let base = spawn_stub(router).await;

    let alert = Alert {
        raised_at: Utc::now(),
        violations: Vec::new(),
        lines: vec!["Temperature too high: 31.00°C at 19/10/2026 12:00:00".into()],
    };
    let sink = EmailForwardSink::new(ApiClient::new(&base).unwrap(), TOKEN);
    sink.deliver(&alert).await.unwrap();

    let text = received.lock().unwrap().clone().unwrap();
    assert_eq!(
        text,
        "Critical alert\nTemperature too high: 31.00°C at 19/10/2026 12:00:00"
    );
    assert!(!text.contains('<'));
}

#[tokio::test]
async fn email_sink_surfaces_relay_errors() {
    let router = Router::new().route(
        "/api/auth/send-alert",
        post(|| async {
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "error": "Email delivery is not configured" })),
            )
        }),
    );
    let base = spawn_stub(router).await;

    let alert = Alert {
        raised_at: Utc::now(),
        violations: Vec::new(),
        lines: vec!["x".into()],
    };
    let err = EmailForwardSink::new(ApiClient::new(&base).unwrap(), TOKEN)
        .deliver(&alert)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("not configured"));
}
