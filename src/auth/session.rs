//! Session lifecycle
//!
//! Sessions are server-side rows keyed by a random UUID, referenced by
//! clients through the `session_id` cookie. A session is immutable except
//! for `status`, which only ever moves valid -> revoked. Expiry is
//! evaluated lazily at lookup time; expired rows are never rewritten.

use axum::http::StatusCode;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::SqliteConnection;
use uuid::Uuid;

use crate::error::AppError;

/// Name of the session cookie.
pub const SESSION_COOKIE: &str = "session_id";

/// Fixed session lifetime (7 days). Store policy, never caller-supplied.
const SESSION_MAX_AGE_SECONDS: i64 = 604_800;

/// Persisted session status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Valid,
    Revoked,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Valid => "valid",
            Self::Revoked => "revoked",
        }
    }
}

/// Why a session lookup was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionProblem {
    /// No session cookie on the request (401)
    Missing,
    /// Malformed cookie value, or no matching valid session (400)
    Invalid,
    /// Session exists but its expiry has passed (401)
    Expired,
}

impl SessionProblem {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Missing => "session_missing",
            Self::Invalid => "session_invalid",
            Self::Expired => "session_expired",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Missing => StatusCode::UNAUTHORIZED,
            Self::Invalid => StatusCode::BAD_REQUEST,
            Self::Expired => StatusCode::UNAUTHORIZED,
        }
    }
}

impl std::fmt::Display for SessionProblem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of a lenient session lookup; the caller decides whether a
/// rejection is fatal.
#[derive(Debug)]
pub enum SessionLookup {
    Active(Session),
    Rejected(SessionProblem),
}

/// A session about to be minted
#[derive(Debug, Clone)]
pub struct NewSession {
    pub user_id: i64,
}

impl NewSession {
    /// Insert a fresh session row and return the populated session.
    ///
    /// The session id is server-assigned (UUID v4) and the expiry is
    /// computed here from the store's fixed TTL.
    pub async fn create(&self, conn: &mut SqliteConnection) -> Result<Session, AppError> {
        tracing::info!(user_id = self.user_id, "Minting new session");

        let session = Session {
            session_id: Uuid::new_v4(),
            user_id: self.user_id,
            created_at: Utc::now(),
            expires_at: Utc::now() + Duration::seconds(SESSION_MAX_AGE_SECONDS),
            status: SessionStatus::Valid,
        };

        sqlx::query(
            "INSERT INTO sessions (session_id, user_id, status, created_at, expires_at)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(session.session_id.to_string())
        .bind(session.user_id)
        .bind(session.status.as_str())
        .bind(session.created_at)
        .bind(session.expires_at)
        .execute(&mut *conn)
        .await?;

        crate::metrics::SESSIONS_MINTED_TOTAL.inc();
        Ok(session)
    }
}

/// A live session row
#[derive(Debug, Clone)]
pub struct Session {
    pub session_id: Uuid,
    pub user_id: i64,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub status: SessionStatus,
}

impl Session {
    /// Validate a raw cookie value against the store.
    ///
    /// Rejection order: missing cookie, unparseable id, no matching row
    /// with `status = 'valid'` (deliberately indistinguishable from a
    /// malformed id, so callers cannot probe whether a session ever
    /// existed), then lazy expiry.
    pub async fn lookup(
        conn: &mut SqliteConnection,
        cookie_value: Option<&str>,
    ) -> Result<SessionLookup, AppError> {
        let Some(raw) = cookie_value else {
            return Ok(SessionLookup::Rejected(SessionProblem::Missing));
        };

        let Ok(session_id) = Uuid::parse_str(raw) else {
            return Ok(SessionLookup::Rejected(SessionProblem::Invalid));
        };

        let row = sqlx::query_as::<_, (i64, DateTime<Utc>, DateTime<Utc>)>(
            "SELECT user_id, created_at, expires_at FROM sessions
             WHERE session_id = ? AND status = 'valid'",
        )
        .bind(session_id.to_string())
        .fetch_optional(&mut *conn)
        .await?;

        let Some((user_id, created_at, expires_at)) = row else {
            return Ok(SessionLookup::Rejected(SessionProblem::Invalid));
        };

        let session = Session {
            session_id,
            user_id,
            created_at,
            expires_at,
            status: SessionStatus::Valid,
        };

        if session.expires_at <= Utc::now() {
            return Ok(SessionLookup::Rejected(SessionProblem::Expired));
        }

        Ok(SessionLookup::Active(session))
    }

    /// Validate a raw cookie value, treating any rejection as fatal.
    pub async fn require(
        conn: &mut SqliteConnection,
        cookie_value: Option<&str>,
    ) -> Result<Session, AppError> {
        match Self::lookup(conn, cookie_value).await? {
            SessionLookup::Active(session) => Ok(session),
            SessionLookup::Rejected(problem) => Err(AppError::Session(problem)),
        }
    }

    /// Flip this session's status to revoked.
    ///
    /// Terminal transition; a revoked session is never reinstated.
    pub async fn revoke(&self, conn: &mut SqliteConnection) -> Result<(), AppError> {
        tracing::info!(session_id = %self.session_id, "Revoking session");

        sqlx::query("UPDATE sessions SET status = 'revoked' WHERE session_id = ?")
            .bind(self.session_id.to_string())
            .execute(&mut *conn)
            .await?;

        crate::metrics::SESSIONS_REVOKED_TOTAL.inc();
        Ok(())
    }

    /// Encode this session as a `Set-Cookie` header value.
    ///
    /// SameSite needs to be `lax` instead of `strict` to get the browser
    /// to send the session cookie when navigating back from GitHub's
    /// login. Max-Age is the remaining lifetime, clamped at zero.
    pub fn as_cookie(&self) -> String {
        let remaining = (self.expires_at - Utc::now()).num_seconds().max(0);

        format!(
            "{SESSION_COOKIE}={}; Max-Age={}; Path=/; HttpOnly; Secure; SameSite=Lax",
            self.session_id.simple(),
            remaining
        )
    }

    /// A cookie that removes the session from the browser.
    pub fn removal_cookie() -> String {
        format!("{SESSION_COOKIE}=; Max-Age=0; Path=/; HttpOnly; Secure; SameSite=Lax")
    }
}
