//! Handlers for the `/data` resource (feed query and ingest).

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;
use silo_db::models::sensor_reading::{CreateSensorReading, SensorReadingRow};
use silo_db::repositories::SensorReadingRepo;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::query::DataQueryParams;
use crate::state::AppState;

/// `{feeds: [...]}` envelope the dashboard reads.
#[derive(Debug, Serialize)]
pub struct FeedsResponse {
    pub feeds: Vec<SensorReadingRow>,
}

/// GET /api/data
///
/// Newest-first readings filtered by `limit`, `start_date`, `end_date`.
pub async fn list_readings(
    user: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<DataQueryParams>,
) -> AppResult<Json<FeedsResponse>> {
    let query = params.to_feed_query()?;
    let feeds = SensorReadingRepo::list(&state.pool, &query).await?;

    tracing::debug!(
        user_id = user.user_id,
        limit = query.limit,
        count = feeds.len(),
        "Listed sensor readings",
    );
    Ok(Json(FeedsResponse { feeds }))
}

/// POST /api/data
///
/// Store one reading. At least one of `field1`/`field2` must be present.
pub async fn create_reading(
    user: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CreateSensorReading>,
) -> AppResult<(StatusCode, Json<SensorReadingRow>)> {
    if input.field1.is_none() && input.field2.is_none() {
        return Err(AppError::BadRequest(
            "At least one of field1 or field2 is required".into(),
        ));
    }
    if [input.field1, input.field2]
        .into_iter()
        .flatten()
        .any(|v| !v.is_finite())
    {
        return Err(AppError::BadRequest("Values must be finite numbers".into()));
    }

    let row = SensorReadingRepo::create(&state.pool, &input).await?;
    tracing::info!(user_id = user.user_id, reading_id = row.id, "Sensor reading stored");
    Ok((StatusCode::CREATED, Json(row)))
}
