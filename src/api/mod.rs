//! HTTP handlers outside the OAuth flow

mod metrics;

pub use metrics::metrics_router;

use axum::{
    Json, Router,
    extract::State,
    response::{Html, IntoResponse, Redirect, Response},
    routing::get,
};

use crate::AppState;
use crate::auth::{CurrentSession, MaybeSession};
use crate::data::User;
use crate::error::AppError;

/// Create the site router
///
/// Routes:
/// - GET / - Landing page (lenient session check)
/// - GET /app - Authenticated user listing
pub fn site_router() -> Router<AppState> {
    Router::new()
        .route("/", get(home))
        .route("/app", get(app))
}

/// GET /
///
/// Already-authenticated visitors go straight to the app; everyone else
/// gets a login link. An unusable session is not an error here.
async fn home(MaybeSession(session): MaybeSession) -> Response {
    if session.is_some() {
        return Redirect::to("/app").into_response();
    }

    Html(r#"Want to <a href="/login">log in</a>?"#).into_response()
}

/// GET /app
///
/// Requires an authenticated session; lists all registered users.
async fn app(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
) -> Result<impl IntoResponse, AppError> {
    tracing::info!(session_id = %session.session_id, "Serving app");

    let mut conn = state.db.acquire().await?;
    let users = User::list(&mut conn).await?;

    Ok(Json(serde_json::json!({ "users": users })))
}
