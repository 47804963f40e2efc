//! Domain errors shared by the server and the dashboard.

/// Failures the domain layer can report. HTTP mapping lives in the API crate.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// Bad filter, threshold band or user input.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// The record already exists (duplicate username or email).
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Missing, malformed or rejected credentials.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
}
