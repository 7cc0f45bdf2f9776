//! Persistent key-value surface
//!
//! A small synchronous string store: `get` returns `None` for an absent key,
//! `set` overwrites, `remove` deletes. The history store keeps its whole
//! sequence under a single key.

mod file;
mod memory;
mod sqlite;

pub use file::FileKvStore;
pub use memory::MemoryKvStore;
pub use sqlite::SqliteKvStore;

use crate::config::{StorageBackend, StorageConfig};
use crate::Result;

/// Durable string storage scoped to one location
pub trait KeyValueStore: Send {
    /// Read the value under `key`, `None` when absent
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Overwrite the value under `key`
    fn set(&mut self, key: &str, value: &str) -> Result<()>;

    /// Delete `key`. Removing an absent key is not an error.
    fn remove(&mut self, key: &str) -> Result<()>;
}

/// Open the backend described by the storage configuration
pub fn open_backend(config: &StorageConfig) -> Result<Box<dyn KeyValueStore>> {
    let path = config.effective_path();
    let store: Box<dyn KeyValueStore> = match config.backend {
        StorageBackend::File => Box::new(FileKvStore::new(path)),
        StorageBackend::Sqlite => Box::new(SqliteKvStore::new(&path)?),
        StorageBackend::Memory => Box::new(MemoryKvStore::new()),
    };
    tracing::debug!("Opened {:?} storage backend", config.backend);
    Ok(store)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_backend_memory() {
        let config = StorageConfig {
            backend: StorageBackend::Memory,
            path: None,
        };
        let mut store = open_backend(&config).unwrap();
        store.set("k", "v").unwrap();
        assert_eq!(store.get("k").unwrap(), Some("v".to_string()));
    }

    #[test]
    fn test_open_backend_sqlite_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("chatai.db");
        let config = StorageConfig {
            backend: StorageBackend::Sqlite,
            path: Some(path.to_string_lossy().into_owned()),
        };

        {
            let mut store = open_backend(&config).unwrap();
            store.set("history", "[]").unwrap();
        }

        let store = open_backend(&config).unwrap();
        assert_eq!(store.get("history").unwrap(), Some("[]".to_string()));
    }

    #[test]
    fn test_open_backend_file_persists() {
        let dir = tempfile::tempdir().unwrap();
        let config = StorageConfig {
            backend: StorageBackend::File,
            path: Some(dir.path().to_string_lossy().into_owned()),
        };

        {
            let mut store = open_backend(&config).unwrap();
            store.set("history", "[]").unwrap();
        }

        let store = open_backend(&config).unwrap();
        assert_eq!(store.get("history").unwrap(), Some("[]".to_string()));
    }
}
