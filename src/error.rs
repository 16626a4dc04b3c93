//! Error types for Gatehouse
//!
//! All errors in the application are converted to `AppError`,
//! which implements `IntoResponse` for proper HTTP error responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::auth::github::GitHubErrorCode;
use crate::auth::session::SessionProblem;

/// Application-wide error type
///
/// This enum represents all possible errors that can occur
/// in the application. It implements `IntoResponse` to
/// automatically convert errors to appropriate HTTP responses.
#[derive(Debug, Error)]
pub enum AppError {
    /// Required query parameter absent (400)
    #[error("Missing parameter: {parameter}")]
    Missing { parameter: &'static str },

    /// Parameter present but malformed or unverifiable (400)
    #[error("Invalid parameter: {parameter} ({detail})")]
    Invalid {
        parameter: &'static str,
        detail: &'static str,
    },

    /// GitHub reported a protocol-level error (400 known / 500 unknown)
    #[error("GitHub error: {0}")]
    GitHub(GitHubErrorCode),

    /// Session validation failed (400/401)
    #[error("Session rejected: {0}")]
    Session(SessionProblem),

    /// Database error (500)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// HTTP client error (502)
    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    /// Configuration error (500)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Encryption/decryption error (500)
    #[error("Encryption error: {0}")]
    Encryption(String),

    /// Internal server error (500)
    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Config(err.to_string())
    }
}

impl IntoResponse for AppError {
    /// Convert error to HTTP response
    ///
    /// Maps each error variant to appropriate HTTP status code
    /// and machine-readable JSON error body.
    fn into_response(self) -> Response {
        use axum::Json;

        let (status, body, error_type) = match &self {
            AppError::Missing { parameter } => (
                StatusCode::BAD_REQUEST,
                serde_json::json!({
                    "error": "missing_parameter",
                    "parameter": parameter,
                }),
                "missing_parameter",
            ),
            AppError::Invalid { parameter, detail } => (
                StatusCode::BAD_REQUEST,
                serde_json::json!({
                    "error": "invalid_parameter",
                    "parameter": parameter,
                    "detail": detail,
                }),
                "invalid_parameter",
            ),
            AppError::GitHub(code) => (
                code.status_code(),
                serde_json::json!({ "error": code.as_str() }),
                "github",
            ),
            AppError::Session(problem) => (
                problem.status_code(),
                serde_json::json!({ "error": problem.as_str() }),
                "session",
            ),
            AppError::Database(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                serde_json::json!({ "error": "database" }),
                "database",
            ),
            AppError::HttpClient(_) => (
                StatusCode::BAD_GATEWAY,
                serde_json::json!({ "error": "upstream_request_failed" }),
                "http_client",
            ),
            AppError::Config(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                serde_json::json!({ "error": msg }),
                "config",
            ),
            AppError::Encryption(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                serde_json::json!({ "error": msg }),
                "encryption",
            ),
            AppError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                serde_json::json!({ "error": "internal" }),
                "internal",
            ),
        };

        // Record error metric
        use crate::metrics::ERRORS_TOTAL;
        ERRORS_TOTAL.with_label_values(&[error_type]).inc();

        (status, Json(body)).into_response()
    }
}

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;
