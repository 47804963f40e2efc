pub mod auth;
pub mod data;
pub mod health;

use axum::Router;

use crate::state::AppState;

/// Build the `/api` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /auth/register               register (public)
/// /auth/login                  login (public)
/// /auth/send-alert             relay alert email (bearer)
///
/// /data                        list readings, ingest reading (bearer)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/data", data::router())
}
