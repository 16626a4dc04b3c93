//! GitHub OAuth protocol client
//!
//! Two sequential network calls per login: exchange the authorization
//! code for an access token, then fetch the authenticated user's profile.
//! No retries and no caching; failures are fatal for the current request.

use axum::http::StatusCode;
use serde::Deserialize;

use crate::config::GitHubConfig;
use crate::error::AppError;

/// Protocol-level error codes GitHub reports in the token response body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GitHubErrorCode {
    BadVerificationCode,
    UnknownError,
}

impl GitHubErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BadVerificationCode => "bad_verification_code",
            Self::UnknownError => "unknown_error",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::BadVerificationCode => StatusCode::BAD_REQUEST,
            Self::UnknownError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl std::fmt::Display for GitHubErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Check a token-endpoint response body for an error report.
///
/// GitHub answers 200 with `{"error": ...}` in the body for protocol
/// failures, so this has to be sniffed before deserializing a token.
fn error_from_json(body: &serde_json::Value) -> Option<GitHubErrorCode> {
    let error = body.get("error")?.as_str()?;

    if error == "bad_verification_code" {
        return Some(GitHubErrorCode::BadVerificationCode);
    }

    tracing::error!(error = %error, "Unknown GitHub error");
    Some(GitHubErrorCode::UnknownError)
}

/// Access token from the code exchange.
///
/// Used once to fetch the profile, then discarded. Never persisted.
#[derive(Debug, Clone, Deserialize)]
pub struct GitHubToken {
    pub access_token: String,
    pub expires_in: i64,
    pub refresh_token: Option<String>,
    pub refresh_token_expires_in: Option<i64>,
}

/// The authenticated user's GitHub profile.
#[derive(Debug, Clone, Deserialize)]
pub struct GitHubUser {
    pub id: i64,
    pub login: String,
    pub avatar_url: String,
}

/// Exchange an authorization code for an access token.
///
/// # Errors
/// - `AppError::GitHub` if the response body reports a protocol error
/// - `AppError::HttpClient` on transport failure or non-2xx status
pub async fn exchange_code(
    client: &reqwest::Client,
    github: &GitHubConfig,
    code: &str,
) -> Result<GitHubToken, AppError> {
    tracing::info!("Requesting GitHub oauth token");

    let response = client
        .post(github.access_token_endpoint())
        .query(&[
            ("client_id", github.client_id.as_str()),
            ("client_secret", github.client_secret.as_str()),
            ("code", code),
        ])
        .header(reqwest::header::ACCEPT, "application/json")
        .send()
        .await?
        .error_for_status()?;

    let body: serde_json::Value = response.json().await?;
    if let Some(code) = error_from_json(&body) {
        return Err(AppError::GitHub(code));
    }

    let token: GitHubToken =
        serde_json::from_value(body).map_err(|e| AppError::Internal(e.into()))?;
    tracing::debug!("Received GitHub access token");
    Ok(token)
}

/// Fetch the authenticated user's profile using a bearer token.
///
/// # Errors
/// Returns `AppError::HttpClient` on transport failure or non-2xx status.
pub async fn fetch_user(
    client: &reqwest::Client,
    github: &GitHubConfig,
    token: &GitHubToken,
) -> Result<GitHubUser, AppError> {
    let user: GitHubUser = client
        .get(format!("{}/user", github.api_url()))
        .header(
            reqwest::header::AUTHORIZATION,
            format!("token {}", token.access_token),
        )
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;

    tracing::debug!(login = %user.login, "Fetched GitHub user");
    Ok(user)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bad_verification_code_is_recognized() {
        let body = serde_json::json!({
            "error": "bad_verification_code",
            "error_description": "The code passed is incorrect or expired.",
        });
        assert_eq!(
            error_from_json(&body),
            Some(GitHubErrorCode::BadVerificationCode)
        );
    }

    #[test]
    fn unrecognized_errors_collapse_to_unknown() {
        let body = serde_json::json!({ "error": "incorrect_client_credentials" });
        assert_eq!(error_from_json(&body), Some(GitHubErrorCode::UnknownError));
    }

    #[test]
    fn token_bodies_are_not_errors() {
        let body = serde_json::json!({
            "access_token": "gho_abc",
            "expires_in": 28800,
        });
        assert_eq!(error_from_json(&body), None);

        let token: GitHubToken = serde_json::from_value(body).expect("token deserializes");
        assert_eq!(token.access_token, "gho_abc");
        assert!(token.refresh_token.is_none());
    }

    #[test]
    fn non_string_error_fields_are_ignored() {
        let body = serde_json::json!({ "error": 42 });
        assert_eq!(error_from_json(&body), None);
    }
}
