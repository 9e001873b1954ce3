//! Key-Value Store over SQLite
//!
//! The store is one table: `key TEXT PRIMARY KEY, value TEXT, expires_at
//! INTEGER`. All single-key operations are atomic (SQLite serializes
//! writers), and TTL rows become invisible to reads the moment they expire,
//! before the sweeper physically removes them.
//!
//! # Connection Strings
//!
//! `DATABASE_URL`-style sqlx URLs: `sqlite://path/to/store.db` for a file
//! database, `sqlite::memory:` for an in-process store (used by tests).
//! In-memory stores pin the pool to a single connection, since every SQLite
//! memory connection is its own database.
//!
//! # Failure
//!
//! Any driver failure surfaces as `StoreUnavailable`. The adapter never
//! retries; callers decide whether to retry or propagate.

use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use sqlx::Row;

use crate::shared::document::now_millis;
use crate::shared::error::SharedError;

/// The document store handle; cheap to clone
#[derive(Clone)]
pub struct KvStore {
    pool: SqlitePool,
}

fn store_err(err: sqlx::Error) -> SharedError {
    SharedError::store_unavailable(err.to_string())
}

impl KvStore {
    /// Open (or create) the store at the given sqlx URL
    pub async fn connect(url: &str) -> Result<Self, SharedError> {
        let in_memory = url.contains(":memory:") || url.contains("mode=memory");

        let mut options = SqliteConnectOptions::from_str(url)
            .map_err(store_err)?
            .create_if_missing(true)
            .busy_timeout(Duration::from_secs(5));
        if !in_memory {
            options = options.journal_mode(SqliteJournalMode::Wal);
        }

        let pool = SqlitePoolOptions::new()
            .max_connections(if in_memory { 1 } else { 5 })
            .connect_with(options)
            .await
            .map_err(store_err)?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS documents (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                expires_at INTEGER
            )",
        )
        .execute(&pool)
        .await
        .map_err(store_err)?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_documents_expires_at ON documents(expires_at)",
        )
        .execute(&pool)
        .await
        .map_err(store_err)?;

        Ok(Self { pool })
    }

    /// Read one value; expired rows read as absent
    pub async fn get(&self, key: &str) -> Result<Option<String>, SharedError> {
        let row = sqlx::query(
            "SELECT value FROM documents
             WHERE key = ? AND (expires_at IS NULL OR expires_at > ?)",
        )
        .bind(key)
        .bind(now_millis())
        .fetch_optional(&self.pool)
        .await
        .map_err(store_err)?;

        Ok(row.map(|r| r.get::<String, _>("value")))
    }

    /// Write one value, replacing any previous value under the key
    ///
    /// A `ttl` stamps the row to expire that far in the future; rewriting a
    /// key resets its TTL window.
    pub async fn set(
        &self,
        key: &str,
        value: &str,
        ttl: Option<Duration>,
    ) -> Result<(), SharedError> {
        let expires_at = ttl.map(|d| now_millis() + d.as_millis() as i64);

        sqlx::query(
            "INSERT INTO documents (key, value, expires_at) VALUES (?, ?, ?)
             ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                expires_at = excluded.expires_at",
        )
        .bind(key)
        .bind(value)
        .bind(expires_at)
        .execute(&self.pool)
        .await
        .map_err(store_err)?;

        Ok(())
    }

    /// Delete one key; returns whether a live row was removed
    pub async fn delete(&self, key: &str) -> Result<bool, SharedError> {
        let result = sqlx::query(
            "DELETE FROM documents
             WHERE key = ? AND (expires_at IS NULL OR expires_at > ?)",
        )
        .bind(key)
        .bind(now_millis())
        .execute(&self.pool)
        .await
        .map_err(store_err)?;

        Ok(result.rows_affected() > 0)
    }

    /// Enumerate live keys under a prefix
    pub async fn scan_keys(&self, prefix: &str) -> Result<Vec<String>, SharedError> {
        let rows = sqlx::query(
            "SELECT key FROM documents
             WHERE key LIKE ? AND (expires_at IS NULL OR expires_at > ?)
             ORDER BY key",
        )
        .bind(format!("{}%", prefix))
        .bind(now_millis())
        .fetch_all(&self.pool)
        .await
        .map_err(store_err)?;

        Ok(rows.into_iter().map(|r| r.get::<String, _>("key")).collect())
    }

    /// Bulk-read all live `(key, value)` pairs under a prefix
    pub async fn get_prefix(&self, prefix: &str) -> Result<Vec<(String, String)>, SharedError> {
        let rows = sqlx::query(
            "SELECT key, value FROM documents
             WHERE key LIKE ? AND (expires_at IS NULL OR expires_at > ?)
             ORDER BY key",
        )
        .bind(format!("{}%", prefix))
        .bind(now_millis())
        .fetch_all(&self.pool)
        .await
        .map_err(store_err)?;

        Ok(rows
            .into_iter()
            .map(|r| (r.get::<String, _>("key"), r.get::<String, _>("value")))
            .collect())
    }

    /// Delete every row under a prefix, expired ones included
    pub async fn clear_prefix(&self, prefix: &str) -> Result<u64, SharedError> {
        let result = sqlx::query("DELETE FROM documents WHERE key LIKE ?")
            .bind(format!("{}%", prefix))
            .execute(&self.pool)
            .await
            .map_err(store_err)?;

        Ok(result.rows_affected())
    }

    /// Physically remove expired rows under a prefix
    ///
    /// Returns the removed `(key, value)` pairs so the collection layer can
    /// de-index them and publish their DELETE events.
    pub async fn delete_expired(
        &self,
        prefix: &str,
    ) -> Result<Vec<(String, String)>, SharedError> {
        let rows = sqlx::query(
            "DELETE FROM documents
             WHERE key LIKE ? AND expires_at IS NOT NULL AND expires_at <= ?
             RETURNING key, value",
        )
        .bind(format!("{}%", prefix))
        .bind(now_millis())
        .fetch_all(&self.pool)
        .await
        .map_err(store_err)?;

        Ok(rows
            .into_iter()
            .map(|r| (r.get::<String, _>("key"), r.get::<String, _>("value")))
            .collect())
    }
}
