use std::sync::Arc;

use crate::config::ServerConfig;
use crate::mail::AlertMailer;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: silo_db::DbPool,
    /// Server configuration (JWT settings, password policy).
    pub config: Arc<ServerConfig>,
    /// Alert mail relay. `None` when SMTP is not configured.
    pub mailer: Option<Arc<AlertMailer>>,
}
