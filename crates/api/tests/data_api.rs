//! HTTP-level tests for `/api/data` and `/health`.

mod common;

use axum::http::StatusCode;
use common::{body_json, build_test_app, get, get_auth, post_json_auth, token_for, unreachable_pool};
use serde_json::json;
use sqlx::PgPool;

#[tokio::test]
async fn health_reports_degraded_without_database() {
    let response = get(build_test_app(unreachable_pool()), "/health").await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "degraded");
    assert_eq!(json["db_healthy"], false);
}

#[tokio::test]
async fn ingest_without_values_is_bad_request() {
    let response = post_json_auth(
        build_test_app(unreachable_pool()),
        "/api/data",
        json!({}),
        &token_for(1),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn response_carries_request_id() {
    let response = get(build_test_app(unreachable_pool()), "/health").await;
    assert!(response.headers().contains_key("x-request-id"));
}

#[sqlx::test(migrations = "../db/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn ingested_readings_come_back_newest_first(pool: PgPool) {
    let token = token_for(1);
    for (h, t, at) in [
        (65.0, 20.0, "2026-10-18T10:00:00Z"),
        (66.5, 21.5, "2026-10-18T11:00:00Z"),
    ] {
        let response = post_json_auth(
            build_test_app(pool.clone()),
            "/api/data",
            json!({ "field1": h, "field2": t, "created_at": at }),
            &token,
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    let response = get_auth(build_test_app(pool), "/api/data?limit=10", &token).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    let feeds = json["feeds"].as_array().unwrap();
    assert_eq!(feeds.len(), 2);
    assert_eq!(feeds[0]["field1"], 66.5);
    assert_eq!(feeds[1]["field2"], 20.0);
}

#[sqlx::test(migrations = "../db/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn date_range_excludes_outside_readings(pool: PgPool) {
    let token = token_for(1);
    for at in ["2026-10-01T00:00:00Z", "2026-10-15T00:00:00Z"] {
        post_json_auth(
            build_test_app(pool.clone()),
            "/api/data",
            json!({ "field1": 65.0, "field2": 20.0, "created_at": at }),
            &token,
        )
        .await;
    }

    let response = get_auth(
        build_test_app(pool),
        "/api/data?start_date=2026-10-10&end_date=2026-10-19",
        &token,
    )
    .await;
    let json = body_json(response).await;
    assert_eq!(json["feeds"].as_array().unwrap().len(), 1);
}
