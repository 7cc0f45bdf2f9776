//! Key-value persistence using SQLite

use std::path::Path;

use rusqlite::{Connection, OptionalExtension, params};
use tracing::{debug, info};

use super::KeyValueStore;
use crate::{Error, Result};

/// SQLite-based key-value store
pub struct SqliteKvStore {
    conn: Connection,
}

impl SqliteKvStore {
    /// Open (or create) the database at `db_path`
    pub fn new(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                Error::Storage(format!(
                    "Failed to create directory '{}': {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        debug!("Opening key-value database at: {}", db_path.display());
        let conn = Connection::open(db_path)?;
        let store = Self { conn };
        store.init_tables()?;
        info!("SqliteKvStore initialized successfully");
        Ok(store)
    }

    /// Create an in-memory store (for testing)
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn };
        store.init_tables()?;
        Ok(store)
    }

    fn init_tables(&self) -> Result<()> {
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS kv (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            )",
            [],
        )?;
        Ok(())
    }

    /// Number of stored keys
    pub fn count(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM kv", [], |row| row.get(0))?;
        usize::try_from(count)
            .map_err(|_| Error::Storage(format!("Invalid key count: {}", count)))
    }
}

impl KeyValueStore for SqliteKvStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM kv WHERE key = ?1",
                params![key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        debug!("Saved {} bytes under key: {}", value.len(), key);
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        let rows_affected = self
            .conn
            .execute("DELETE FROM kv WHERE key = ?1", params![key])?;
        if rows_affected > 0 {
            debug!("Removed key: {}", key);
        }
        Ok(())
    }
}
