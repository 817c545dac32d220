use async_trait::async_trait;
use serde_json::Value;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Executor, Row, SqlitePool};
use std::path::Path;
use std::str::FromStr;
use tracing::debug;

use crate::{RecordStore, StoreError};

// ═══════════════════════════════════════════════════════════════════════════
// SQLITE STORE IMPLEMENTATION
// ═══════════════════════════════════════════════════════════════════════════

pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open (creating if needed) the database at `db_path`
    pub async fn new<P: AsRef<Path>>(db_path: P) -> Result<Self, StoreError> {
        let url = format!("sqlite:{}", db_path.as_ref().display());
        let options = SqliteConnectOptions::from_str(&url)
            .map_err(|e| StoreError::Connection(e.to_string()))?
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .connect_with(options)
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))?;

        let store = Self { pool };
        store.run_migrations().await?;

        debug!(path = %db_path.as_ref().display(), "Opened sqlite record store");
        Ok(store)
    }

    /// Create an in-memory SQLite database (for testing)
    pub async fn in_memory() -> Result<Self, StoreError> {
        // Each connection to :memory: is its own database
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))?;

        let store = Self { pool };
        store.run_migrations().await?;

        Ok(store)
    }

    async fn run_migrations(&self) -> Result<(), StoreError> {
        self.pool
            .execute(include_str!("../migrations/001_create_records.sql"))
            .await
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(())
    }

    fn row_to_entry(row: &sqlx::sqlite::SqliteRow) -> Result<(String, Value), StoreError> {
        let key: String = row.get("record_key");
        let raw: String = row.get("value");
        let value = serde_json::from_str(&raw)?;
        Ok((key, value))
    }
}

#[async_trait]
impl RecordStore for SqliteStore {
    async fn get(&self, collection: &str, key: &str) -> Result<Option<Value>, StoreError> {
        let row = sqlx::query("SELECT record_key, value FROM records WHERE collection = ? AND record_key = ?")
            .bind(collection)
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StoreError::Database(e.to_string()))?;

        row.as_ref()
            .map(Self::row_to_entry)
            .transpose()
            .map(|entry| entry.map(|(_, value)| value))
    }

    async fn set(&self, collection: &str, key: &str, value: Value) -> Result<(), StoreError> {
        let now = chrono::Utc::now().timestamp();
        let raw = serde_json::to_string(&value)?;

        sqlx::query(
            r#"
            INSERT INTO records (collection, record_key, value, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT (collection, record_key)
            DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
            "#,
        )
        .bind(collection)
        .bind(key)
        .bind(&raw)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(())
    }

    async fn insert(&self, collection: &str, key: &str, value: Value) -> Result<(), StoreError> {
        let now = chrono::Utc::now().timestamp();
        let raw = serde_json::to_string(&value)?;

        let result = sqlx::query(
            r#"
            INSERT INTO records (collection, record_key, value, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(collection)
        .bind(key)
        .bind(&raw)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                Err(StoreError::DuplicateId(key.to_string()))
            }
            Err(e) => Err(StoreError::Database(e.to_string())),
        }
    }

    async fn list(&self, collection: &str) -> Result<Vec<(String, Value)>, StoreError> {
        let rows = sqlx::query("SELECT record_key, value FROM records WHERE collection = ? ORDER BY seq ASC")
            .bind(collection)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StoreError::Database(e.to_string()))?;

        rows.iter().map(Self::row_to_entry).collect()
    }

    async fn remove(&self, collection: &str, key: &str) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM records WHERE collection = ? AND record_key = ?")
            .bind(collection)
            .bind(key)
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }

    async fn clear(&self, collection: &str) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM records WHERE collection = ?")
            .bind(collection)
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(())
    }
}
