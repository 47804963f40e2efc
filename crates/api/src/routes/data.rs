//! Route definitions for the `/data` resource.

use axum::routing::get;
use axum::Router;

use crate::handlers::data;
use crate::state::AppState;

/// Routes mounted at `/data`.
///
/// ```text
/// GET  /   -> list_readings (requires auth)
/// POST /   -> create_reading (requires auth)
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/", get(data::list_readings).post(data::create_reading))
}
