//! Database-backed repository tests.
//!
//! These need a reachable PostgreSQL instance via `DATABASE_URL`; run them
//! with `cargo test -p silo-db -- --ignored`.

use chrono::{TimeZone, Utc};
use silo_core::query::FeedQuery;
use silo_db::models::sensor_reading::CreateSensorReading;
use silo_db::models::user::CreateUser;
use silo_db::repositories::{SensorReadingRepo, UserRepo};
use sqlx::PgPool;

async fn insert_reading(pool: &PgPool, field1: Option<f64>, field2: Option<f64>, minute: u32) {
    let input = CreateSensorReading {
        field1,
        field2,
        created_at: Some(Utc.with_ymd_and_hms(2026, 10, 19, 12, minute, 0).unwrap()),
    };
    SensorReadingRepo::create(pool, &input)
        .await
        .expect("insert should succeed");
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn list_returns_newest_first_within_range(pool: PgPool) {
    insert_reading(&pool, Some(60.0), Some(20.0), 0).await;
    insert_reading(&pool, Some(61.0), Some(21.0), 10).await;
    insert_reading(&pool, None, Some(22.0), 20).await;
    insert_reading(&pool, Some(63.0), Some(23.0), 30).await;

    let query = FeedQuery::new(
        Some(10),
        Some(Utc.with_ymd_and_hms(2026, 10, 19, 12, 5, 0).unwrap()),
        Some(Utc.with_ymd_and_hms(2026, 10, 19, 12, 25, 0).unwrap()),
    )
    .unwrap();
    let rows = SensorReadingRepo::list(&pool, &query).await.unwrap();

    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].field1, None);
    assert_eq!(rows[0].field2, Some(22.0));
    assert_eq!(rows[1].field1, Some(61.0));
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn list_honours_limit(pool: PgPool) {
    for minute in 0..5 {
        insert_reading(&pool, Some(60.0), Some(20.0), minute).await;
    }
    let rows = SensorReadingRepo::list(&pool, &FeedQuery::new(Some(3), None, None).unwrap())
        .await
        .unwrap();
    assert_eq!(rows.len(), 3);
    assert!(rows[0].created_at > rows[2].created_at);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn duplicate_username_or_email_is_detected(pool: PgPool) {
    let input = CreateUser {
        username: "operator".into(),
        email: "operator@example.com".into(),
        password_hash: "$argon2id$placeholder".into(),
    };
    let user = UserRepo::create(&pool, &input).await.unwrap();

    assert!(UserRepo::exists_by_username_or_email(&pool, "operator", "x@example.com")
        .await
        .unwrap());
    assert!(UserRepo::exists_by_username_or_email(&pool, "x", "operator@example.com")
        .await
        .unwrap());
    assert!(!UserRepo::exists_by_username_or_email(&pool, "x", "y@example.com")
        .await
        .unwrap());

    let found = UserRepo::find_by_username(&pool, "operator").await.unwrap().unwrap();
    assert_eq!(found.id, user.id);
    assert!(UserRepo::find_by_id(&pool, user.id).await.unwrap().is_some());
}
