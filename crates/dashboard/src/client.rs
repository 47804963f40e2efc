//! REST client for the silo API.
//!
//! Wraps the auth and data endpoints using [`reqwest`]. Every failure is
//! mapped into [`ClientError`] so callers can show a message without caring
//! about transport details.

use std::time::Duration;

use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use silo_core::query::FeedQuery;
use silo_core::reading::{Feed, FeedEnvelope};

/// Timeout applied to every request.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Shown when the API rejects the token without saying why.
const SESSION_EXPIRED: &str = "Session expired, please log in again";

/// Errors from the API client layer.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Transport failure, or a non-2xx status without a readable body.
    #[error("Network error: {0}")]
    Network(String),

    /// Missing, invalid or expired credentials.
    #[error("{0}")]
    Auth(String),

    /// The API answered with an explicit error message.
    #[error("{0}")]
    Data(String),

    /// Input rejected before any request was made.
    #[error("{0}")]
    Validation(String),
}

impl From<reqwest::Error> for ClientError {
    fn from(e: reqwest::Error) -> Self {
        ClientError::Network(e.to_string())
    }
}

/// Error body shape shared by all API endpoints.
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    error: Option<String>,
    message: Option<String>,
}

impl ErrorBody {
    fn text(self) -> Option<String> {
        self.error.or(self.message).filter(|m| !m.trim().is_empty())
    }
}

#[derive(Debug, Serialize)]
struct Credentials<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Debug, Serialize)]
struct Registration<'a> {
    username: &'a str,
    email: &'a str,
    password: &'a str,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    token: String,
}

#[derive(Debug, Deserialize)]
struct MessageResponse {
    message: String,
}

#[derive(Debug, Serialize)]
struct AlertRequest<'a> {
    message: &'a str,
}

/// HTTP client for one API base URL (e.g. `http://host:5000/api`).
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    /// Create a client with the default request timeout.
    pub fn new(base_url: impl Into<String>) -> Result<Self, ClientError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self::with_client(client, base_url))
    }

    /// Reuse an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `POST /auth/login`. Returns the bearer token.
    pub async fn login(&self, username: &str, password: &str) -> Result<String, ClientError> {
        if username.trim().is_empty() || password.is_empty() {
            return Err(ClientError::Validation(
                "Username and password are required".into(),
            ));
        }

        let response = self
            .client
            .post(format!("{}/auth/login", self.base_url))
            .json(&Credentials { username, password })
            .send()
            .await?;

        let body: TokenResponse = Self::parse_response(response).await?;
        Ok(body.token)
    }

    /// `POST /auth/register`. Returns the server's confirmation message.
    pub async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<String, ClientError> {
        if [username, email, password].iter().any(|f| f.trim().is_empty()) {
            return Err(ClientError::Validation(
                "Username, email and password are required".into(),
            ));
        }

        let response = self
            .client
            .post(format!("{}/auth/register", self.base_url))
            .json(&Registration {
                username,
                email,
                password,
            })
            .send()
            .await?;

        let body: MessageResponse = Self::parse_response(response).await?;
        Ok(body.message)
    }

    /// `GET /data` with the query's filters. An `{error}` payload is a
    /// [`ClientError::Data`] even when the status is 2xx.
    pub async fn fetch_feeds(
        &self,
        token: &str,
        query: &FeedQuery,
    ) -> Result<Vec<Feed>, ClientError> {
        let mut params = vec![("limit", query.limit.to_string())];
        if let Some(start) = query.start {
            params.push(("start_date", start.to_rfc3339()));
        }
        if let Some(end) = query.end {
            params.push(("end_date", end.to_rfc3339()));
        }

        let response = self
            .client
            .get(format!("{}/data", self.base_url))
            .bearer_auth(token)
            .query(&params)
            .send()
            .await?;

        let envelope: FeedEnvelope = Self::parse_response(response).await?;
        match envelope.error {
            Some(error) => Err(ClientError::Data(error)),
            None => Ok(envelope.feeds),
        }
    }

    /// `POST /auth/send-alert` with a plain-text alert body.
    pub async fn send_alert(&self, token: &str, text: &str) -> Result<(), ClientError> {
        let response = self
            .client
            .post(format!("{}/auth/send-alert", self.base_url))
            .bearer_auth(token)
            .json(&AlertRequest { message: text })
            .send()
            .await?;

        Self::ensure_success(response).await.map(|_| ())
    }

    // ---- private helpers ----

    /// Map non-2xx statuses into [`ClientError`], preferring the API's own
    /// message when the body carries one.
    async fn ensure_success(
        response: reqwest::Response,
    ) -> Result<reqwest::Response, ClientError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&body)
            .ok()
            .and_then(ErrorBody::text);

        Err(match (status, message) {
            (StatusCode::UNAUTHORIZED, Some(m)) => ClientError::Auth(m),
            (StatusCode::UNAUTHORIZED, None) => ClientError::Auth(SESSION_EXPIRED.into()),
            (_, Some(m)) => ClientError::Data(m),
            (status, None) => ClientError::Network(format!("HTTP {}", status.as_u16())),
        })
    }

    async fn parse_response<T: DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, ClientError> {
        let response = Self::ensure_success(response).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| ClientError::Network(format!("Invalid response body: {e}")))
    }
}
