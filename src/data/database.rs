//! Connection pool guard
//!
//! A process-wide pool of SQLite connections. Constructed exactly once at
//! startup and injected wherever a connection is needed; the closed state
//! is unrepresentable because `close` consumes the guard, so no runtime
//! assertions are required.

use sqlx::pool::PoolConnection;
use sqlx::{Sqlite, SqlitePool};
use std::path::Path;

use crate::error::AppError;

/// Database connection pool wrapper.
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Connect to the database
    ///
    /// Creates the database file if it doesn't exist.
    /// Runs pending migrations automatically.
    ///
    /// # Arguments
    /// * `path` - Path to SQLite database file
    ///
    /// # Errors
    /// Returns error if connection or migration fails
    pub async fn connect(path: &Path) -> Result<Self, AppError> {
        // Create parent directory if it doesn't exist
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| AppError::Database(sqlx::Error::Io(e)))?;
        }

        let connection_string = format!("sqlite:{}?mode=rwc", path.display());
        let pool = SqlitePool::connect(&connection_string).await?;

        sqlx::migrate!("./migrations").run(&pool).await.map_err(|e| {
            tracing::error!("Migration failed: {}", e);
            AppError::Internal(anyhow::anyhow!("Migration failed: {}", e))
        })?;

        tracing::info!("Database connected and migrated successfully");

        Ok(Self { pool })
    }

    /// Check out one connection for a scoped unit of work.
    ///
    /// The connection returns to the pool when the guard drops, on every
    /// exit path including cancellation. Acquisition is queued internally,
    /// so this is safe to call from many in-flight requests.
    pub async fn acquire(&self) -> Result<PoolConnection<Sqlite>, AppError> {
        Ok(self.pool.acquire().await?)
    }

    /// Close all pooled connections.
    ///
    /// Consumes the guard: no `acquire` is possible afterwards.
    pub async fn close(self) {
        self.pool.close().await;
        tracing::info!("Database connection pool closed");
    }

    #[cfg(test)]
    pub(crate) fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}
