//! Handler for `POST /auth/send-alert`.

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::state::AppState;

/// Request body: the plain-text alert to relay.
#[derive(Debug, Deserialize)]
pub struct SendAlertRequest {
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct SendAlertResponse {
    pub success: bool,
    pub message: String,
}

/// POST /api/auth/send-alert
///
/// Relay an alert text to the configured recipient by email.
pub async fn send_alert(
    user: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<SendAlertRequest>,
) -> AppResult<Json<SendAlertResponse>> {
    let text = input.message.trim();
    if text.is_empty() {
        return Err(AppError::BadRequest("Alert message is required".into()));
    }

    let mailer = state
        .mailer
        .as_ref()
        .ok_or_else(|| AppError::ServiceUnavailable("Email delivery is not configured".into()))?;

    mailer
        .send_alert(text)
        .await
        .map_err(|e| AppError::InternalError(format!("Failed to send alert email: {e}")))?;

    tracing::info!(user_id = user.user_id, "Alert relayed by email");
    Ok(Json(SendAlertResponse {
        success: true,
        message: "Alert sent".into(),
    }))
}
