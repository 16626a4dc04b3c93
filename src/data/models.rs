//! Persistent models
//!
//! Rust structs representing database rows, with their queries.

use serde::{Deserialize, Serialize};
use sqlx::SqliteConnection;

use crate::error::AppError;

/// A user authenticated through GitHub OAuth.
///
/// `username` is the natural key; `user_id` is the surrogate key that
/// sessions reference and that survives profile changes.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub user_id: i64,
    pub username: String,
    pub avatar_url: String,
}

impl User {
    /// Insert or refresh a user by username, returning the user id.
    ///
    /// Atomic at the store level: on a username conflict the existing row
    /// keeps its `user_id` and gets the latest `avatar_url`. Re-running
    /// with the same username never creates a duplicate row.
    pub async fn upsert(
        conn: &mut SqliteConnection,
        username: &str,
        avatar_url: &str,
    ) -> Result<i64, AppError> {
        let (user_id,): (i64,) = sqlx::query_as(
            "INSERT INTO users (username, avatar_url)
             VALUES (?, ?)
             ON CONFLICT (username) DO UPDATE SET avatar_url = excluded.avatar_url
             RETURNING user_id",
        )
        .bind(username)
        .bind(avatar_url)
        .fetch_one(&mut *conn)
        .await?;

        Ok(user_id)
    }

    /// List all users.
    pub async fn list(conn: &mut SqliteConnection) -> Result<Vec<User>, AppError> {
        let users = sqlx::query_as::<_, User>(
            "SELECT user_id, username, avatar_url FROM users ORDER BY user_id",
        )
        .fetch_all(&mut *conn)
        .await?;

        Ok(users)
    }
}
