//! # SQLite Backend
//!
//! Durable key-value store on top of a single `kv` table.
//!
//! ```text
//! ┌─────────────────┐
//! │   Repository    │  typed collections
//! └────────┬────────┘
//!          │ key / JSON text
//!          ▼
//! ┌─────────────────┐
//! │   SqliteStore   │  INSERT OR REPLACE per key
//! │  (this file)    │  batches in one transaction
//! └────────┬────────┘
//!          ▼
//! ┌─────────────────┐
//! │   SQLite DB     │  file, or in-memory for tests
//! └─────────────────┘
//! ```

use async_trait::async_trait;
use parking_lot::Mutex;
use rusqlite::{params, Connection};
use std::sync::Arc;

use super::schema;
use super::KeyValueStore;
use crate::error::{Error, Result};

/// SQLite-backed key-value store
pub struct SqliteStore {
    /// The underlying SQLite connection
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open or create a database
    ///
    /// If path is None, creates an in-memory database (useful for testing).
    pub fn open(path: Option<&str>) -> Result<Self> {
        let conn = match path {
            Some(p) => Connection::open(p)
                .map_err(|e| Error::DatabaseError(format!("Failed to open database: {}", e)))?,
            None => Connection::open_in_memory().map_err(|e| {
                Error::DatabaseError(format!("Failed to create in-memory database: {}", e))
            })?,
        };

        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
        };

        store.init_schema()?;

        Ok(store)
    }

    /// Initialize the database schema
    fn init_schema(&self) -> Result<()> {
        let conn = self.conn.lock();

        let version: Option<i32> = conn
            .query_row("SELECT version FROM schema_version LIMIT 1", [], |row| {
                row.get(0)
            })
            .ok();

        match version {
            None => {
                conn.execute_batch(schema::CREATE_TABLES)
                    .map_err(|e| Error::DatabaseError(format!("Failed to create tables: {}", e)))?;

                conn.execute(
                    "INSERT INTO schema_version (version) VALUES (?)",
                    params![schema::SCHEMA_VERSION],
                )
                .map_err(|e| {
                    Error::DatabaseError(format!("Failed to set schema version: {}", e))
                })?;

                tracing::info!("Key-value schema created (version {})", schema::SCHEMA_VERSION);
            }
            Some(v) if v > schema::SCHEMA_VERSION => {
                return Err(Error::DatabaseError(format!(
                    "Database schema version {} is newer than supported {}",
                    v,
                    schema::SCHEMA_VERSION
                )));
            }
            Some(v) => {
                tracing::debug!("Key-value schema at version {}", v);
            }
        }

        Ok(())
    }
}

#[async_trait]
impl KeyValueStore for SqliteStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let conn = self.conn.lock();

        let result = conn.query_row(
            "SELECT value FROM kv WHERE key = ?",
            params![key],
            |row| row.get(0),
        );

        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(Error::StorageReadError(format!(
                "Failed to read {}: {}",
                key, e
            ))),
        }
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let conn = self.conn.lock();
        let now = crate::time::now_timestamp();

        conn.execute(
            "INSERT OR REPLACE INTO kv (key, value, updated_at) VALUES (?, ?, ?)",
            params![key, value, now],
        )
        .map_err(|e| Error::StorageWriteError(format!("Failed to write {}: {}", key, e)))?;

        Ok(())
    }

    async fn set_many(&self, entries: &[(String, String)]) -> Result<()> {
        let mut conn = self.conn.lock();
        let now = crate::time::now_timestamp();

        let tx = conn
            .transaction()
            .map_err(|e| Error::StorageWriteError(format!("Failed to begin batch: {}", e)))?;

        for (key, value) in entries {
            tx.execute(
                "INSERT OR REPLACE INTO kv (key, value, updated_at) VALUES (?, ?, ?)",
                params![key, value, now],
            )
            .map_err(|e| Error::StorageWriteError(format!("Failed to write {}: {}", key, e)))?;
        }

        tx.commit()
            .map_err(|e| Error::StorageWriteError(format!("Failed to commit batch: {}", e)))?;

        Ok(())
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_store_creation() {
        let store = SqliteStore::open(None).unwrap();
        assert!(store.get("@posts").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_set_overwrites() {
        let store = SqliteStore::open(None).unwrap();

        store.set("@posts", "[]").await.unwrap();
        store.set("@posts", r#"[{"id":"1"}]"#).await.unwrap();

        let value = store.get("@posts").await.unwrap().unwrap();
        assert_eq!(value, r#"[{"id":"1"}]"#);
    }

    #[tokio::test]
    async fn test_set_many_writes_all() {
        let store = SqliteStore::open(None).unwrap();

        store
            .set_many(&[
                ("@messages_1".to_string(), "[]".to_string()),
                ("@conversations".to_string(), "[]".to_string()),
            ])
            .await
            .unwrap();

        assert!(store.get("@messages_1").await.unwrap().is_some());
        assert!(store.get("@conversations").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_file_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("feed.db");
        let path = path.to_str().unwrap();

        {
            let store = SqliteStore::open(Some(path)).unwrap();
            store.set("@user", r#"{"id":"1"}"#).await.unwrap();
        }

        let reopened = SqliteStore::open(Some(path)).unwrap();
        assert_eq!(
            reopened.get("@user").await.unwrap().as_deref(),
            Some(r#"{"id":"1"}"#)
        );
    }
}
