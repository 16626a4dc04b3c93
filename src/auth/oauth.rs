//! GitHub OAuth flow
//!
//! Implements the OAuth 2.0 authorization code flow with GitHub:
//! login redirect out, callback in, user upsert, session mint.

use axum::{
    Json, Router,
    extract::{Query, State},
    http::{StatusCode, header::SET_COOKIE},
    response::{AppendHeaders, IntoResponse, Redirect, Response},
    routing::{get, post},
};
use serde::Deserialize;

use super::github;
use super::middleware::CurrentSession;
use super::session::{NewSession, Session};
use super::state::OAuthState;
use crate::AppState;
use crate::data::User;
use crate::error::AppError;
use crate::metrics::{OAUTH_CALLBACKS_TOTAL, OAUTH_LOGINS_TOTAL};

/// Create authentication router
///
/// Routes:
/// - GET /login - Redirect to GitHub
/// - GET /api/complete/github - OAuth callback
/// - POST /logout - Revoke the current session
pub fn auth_router() -> Router<AppState> {
    Router::new()
        .route("/login", get(github_login))
        .route("/api/complete/github", get(github_callback))
        .route("/logout", post(logout))
}

// =============================================================================
// Login redirect
// =============================================================================

#[derive(Debug, Deserialize)]
struct LoginQuery {
    /// Path to land on after login (defaults to "/")
    next: Option<String>,
}

/// GET /login
///
/// Encrypts the post-login redirect target into the OAuth `state`
/// parameter and sends the browser to GitHub's authorization page.
async fn github_login(
    State(state): State<AppState>,
    Query(query): Query<LoginQuery>,
) -> Result<impl IntoResponse, AppError> {
    // Only same-site paths; anything else falls back to the root.
    let redirect = query
        .next
        .filter(|path| path.starts_with('/'))
        .unwrap_or_else(|| "/".to_string());

    let token = state.state_crypto.encrypt(&OAuthState { redirect })?;

    let mut authorize_url = url::Url::parse(&state.config.github.authorize_endpoint())
        .map_err(|e| AppError::Config(format!("invalid authorize endpoint: {e}")))?;
    authorize_url
        .query_pairs_mut()
        .append_pair("client_id", &state.config.github.client_id)
        .append_pair("redirect_uri", &state.config.server.oauth_callback_url())
        .append_pair("state", &token);

    OAUTH_LOGINS_TOTAL.inc();
    Ok(Redirect::to(authorize_url.as_str()))
}

// =============================================================================
// OAuth callback
// =============================================================================

/// Errors GitHub reports via the callback query string instead of the
/// token exchange.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "snake_case")]
enum GitHubOAuthError {
    AccessDenied,
    RedirectUriMismatch,
}

impl GitHubOAuthError {
    fn as_str(&self) -> &'static str {
        match self {
            Self::AccessDenied => "access_denied",
            Self::RedirectUriMismatch => "redirect_uri_mismatch",
        }
    }
}

#[derive(Debug, Deserialize)]
struct CallbackQuery {
    code: Option<String>,
    state: Option<String>,
    error: Option<GitHubOAuthError>,
}

/// GET /api/complete/github
///
/// Handles the OAuth callback from GitHub.
///
/// # Steps
/// 1. Fail fast on a provider-reported error (no decryption, no exchange)
/// 2. Require `state` and `code`
/// 3. Decrypt the state token
/// 4. Exchange the code, fetch the user's profile
/// 5. Upsert the user and mint a session on one pooled connection
/// 6. Redirect to the decrypted target with the session cookie
async fn github_callback(
    State(state): State<AppState>,
    Query(query): Query<CallbackQuery>,
) -> Result<Response, AppError> {
    if let Some(error) = query.error {
        tracing::error!(error = error.as_str(), "Error from GitHub");
        OAUTH_CALLBACKS_TOTAL.with_label_values(&["provider_error"]).inc();
        return Ok((
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({ "error": error.as_str() })),
        )
            .into_response());
    }

    let Some(state_token) = query.state else {
        return Err(AppError::Missing { parameter: "state" });
    };
    let Some(code) = query.code else {
        return Err(AppError::Missing { parameter: "code" });
    };

    let oauth_state = state.state_crypto.decrypt(&state_token)?;

    let token = github::exchange_code(&state.http_client, &state.config.github, &code).await?;
    let user = github::fetch_user(&state.http_client, &state.config.github, &token).await?;

    // One connection for the whole unit of work; returned to the pool on
    // every exit path when the guard drops.
    let mut conn = state.db.acquire().await?;
    let user_id = User::upsert(&mut conn, &user.login, &user.avatar_url).await?;
    let session = NewSession { user_id }.create(&mut conn).await?;

    OAUTH_CALLBACKS_TOTAL.with_label_values(&["success"]).inc();
    Ok((
        AppendHeaders([(SET_COOKIE, session.as_cookie())]),
        Redirect::to(&oauth_state.redirect),
    )
        .into_response())
}

// =============================================================================
// Logout
// =============================================================================

/// POST /logout
///
/// Revokes the current session and clears the cookie.
async fn logout(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
) -> Result<impl IntoResponse, AppError> {
    let mut conn = state.db.acquire().await?;
    session.revoke(&mut conn).await?;

    Ok((
        AppendHeaders([(SET_COOKIE, Session::removal_cookie())]),
        Redirect::to("/"),
    ))
}
