//! Repository for the `sensor_readings` table.

use silo_core::query::FeedQuery;
use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::models::sensor_reading::{CreateSensorReading, SensorReadingRow};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, field1, field2, created_at";

/// Provides insert and range queries for sensor readings.
pub struct SensorReadingRepo;

impl SensorReadingRepo {
    /// Insert one reading, returning the stored row.
    pub async fn create(
        pool: &PgPool,
        input: &CreateSensorReading,
    ) -> Result<SensorReadingRow, sqlx::Error> {
        let query = format!(
            "INSERT INTO sensor_readings (field1, field2, created_at)
             VALUES ($1, $2, COALESCE($3, now()))
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, SensorReadingRow>(&query)
            .bind(input.field1)
            .bind(input.field2)
            .bind(input.created_at)
            .fetch_one(pool)
            .await
    }

    /// Newest-first readings within the query's inclusive date range.
    pub async fn list(
        pool: &PgPool,
        query: &FeedQuery,
    ) -> Result<Vec<SensorReadingRow>, sqlx::Error> {
        let mut builder = build_list_query(query);
        builder
            .build_query_as::<SensorReadingRow>()
            .fetch_all(pool)
            .await
    }
}

fn build_list_query(query: &FeedQuery) -> QueryBuilder<'static, Postgres> {
    let mut builder = QueryBuilder::new(format!("SELECT {COLUMNS} FROM sensor_readings"));
    let mut separator = " WHERE ";

    if let Some(start) = query.start {
        builder.push(separator).push("created_at >= ").push_bind(start);
        separator = " AND ";
    }
    if let Some(end) = query.end {
        builder.push(separator).push("created_at <= ").push_bind(end);
    }

    builder
        .push(" ORDER BY created_at DESC LIMIT ")
        .push_bind(query.limit);
    builder
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;

    #[test]
    fn unfiltered_query_only_limits() {
        let builder = build_list_query(&FeedQuery::default());
        assert_eq!(
            builder.sql(),
            "SELECT id, field1, field2, created_at FROM sensor_readings \
             ORDER BY created_at DESC LIMIT $1"
        );
    }

    #[test]
    fn date_range_adds_both_bounds() {
        let query = FeedQuery::new(
            Some(10),
            Some(Utc.with_ymd_and_hms(2026, 10, 12, 0, 0, 0).unwrap()),
            Some(Utc.with_ymd_and_hms(2026, 10, 19, 0, 0, 0).unwrap()),
        )
        .unwrap();
        let builder = build_list_query(&query);
        assert_eq!(
            builder.sql(),
            "SELECT id, field1, field2, created_at FROM sensor_readings \
             WHERE created_at >= $1 AND created_at <= $2 \
             ORDER BY created_at DESC LIMIT $3"
        );
    }

    #[test]
    fn end_only_uses_where() {
        let query = FeedQuery::new(
            None,
            None,
            Some(Utc.with_ymd_and_hms(2026, 10, 19, 0, 0, 0).unwrap()),
        )
        .unwrap();
        let sql = build_list_query(&query).sql().to_string();
        assert!(sql.contains(" WHERE created_at <= $1 "));
    }
}
