//! Session extractors
//!
//! Handlers pick how strict session validation is: `CurrentSession`
//! turns any rejection into an error response, `MaybeSession` hands the
//! handler an `Option` and lets it branch.

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use axum_extra::extract::CookieJar;

use super::session::{SESSION_COOKIE, Session, SessionLookup};
use crate::AppState;
use crate::error::AppError;

fn session_cookie_value(parts: &Parts) -> Option<String> {
    let jar = CookieJar::from_headers(&parts.headers);
    jar.get(SESSION_COOKIE)
        .map(|cookie| cookie.value().to_owned())
}

/// Extractor for handlers that require an authenticated session.
///
/// Rejects the request with the session problem's status code if the
/// cookie is absent, malformed, unknown, revoked, or expired.
///
/// # Usage
/// ```ignore
/// async fn handler(CurrentSession(session): CurrentSession) -> impl IntoResponse {
///     format!("user {}", session.user_id)
/// }
/// ```
#[derive(Debug, Clone)]
pub struct CurrentSession(pub Session);

#[async_trait]
impl<S> FromRequestParts<S> for CurrentSession
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);
        let cookie_value = session_cookie_value(parts);

        let mut conn = app_state.db.acquire().await?;
        let session = Session::require(&mut conn, cookie_value.as_deref()).await?;

        Ok(CurrentSession(session))
    }
}

/// Optional session extractor
///
/// Yields `None` instead of an error response when validation fails.
/// Database failures still abort the request.
#[derive(Debug, Clone)]
pub struct MaybeSession(pub Option<Session>);

#[async_trait]
impl<S> FromRequestParts<S> for MaybeSession
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);
        let cookie_value = session_cookie_value(parts);

        let mut conn = app_state.db.acquire().await?;
        let session = match Session::lookup(&mut conn, cookie_value.as_deref()).await? {
            SessionLookup::Active(session) => Some(session),
            SessionLookup::Rejected(_) => None,
        };

        Ok(MaybeSession(session))
    }
}
