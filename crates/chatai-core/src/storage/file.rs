//! Directory-backed key-value store
//!
//! Each key is a `<key>.json` file. Writes go to a temporary sibling first and
//! are renamed into place, so a crash never leaves a half-written value.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::KeyValueStore;
use crate::{Error, Result};

/// One-file-per-key store rooted at a directory
#[derive(Debug, Clone)]
pub struct FileKvStore {
    dir: PathBuf,
}

impl FileKvStore {
    /// The directory is created lazily on the first write
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(Error::Storage(format!("Invalid key: {:?}", key)));
        }
        Ok(self.dir.join(format!("{}.json", key)))
    }
}

impl KeyValueStore for FileKvStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key)?;
        match std::fs::read_to_string(&path) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Error::Storage(format!(
                "Failed to read '{}': {}",
                path.display(),
                e
            ))),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let path = self.path_for(key)?;
        std::fs::create_dir_all(&self.dir).map_err(|e| {
            Error::Storage(format!(
                "Failed to create directory '{}': {}",
                self.dir.display(),
                e
            ))
        })?;

        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, value).map_err(|e| {
            Error::Storage(format!("Failed to write '{}': {}", tmp.display(), e))
        })?;
        std::fs::rename(&tmp, &path).map_err(|e| {
            Error::Storage(format!(
                "Failed to rename '{}' to '{}': {}",
                tmp.display(),
                path.display(),
                e
            ))
        })?;

        debug!("Wrote {} bytes to {}", value.len(), path.display());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        let path = self.path_for(key)?;
        match std::fs::remove_file(&path) {
            Ok(()) => {
                debug!("Removed {}", path.display());
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::Storage(format!(
                "Failed to remove '{}': {}",
                path.display(),
                e
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_absent_key() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileKvStore::new(dir.path().join("not-created-yet"));
        assert_eq!(store.get("history").unwrap(), None);
    }

    #[test]
    fn test_set_creates_directory_and_file() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("data");
        let mut store = FileKvStore::new(&root);

        store.set("history", "[]").unwrap();

        let on_disk = std::fs::read_to_string(root.join("history.json")).unwrap();
        assert_eq!(on_disk, "[]");
        assert!(!root.join("history.json.tmp").exists());
    }

    #[test]
    fn test_set_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileKvStore::new(dir.path());

        store.set("history", "first").unwrap();
        store.set("history", "second").unwrap();
        assert_eq!(store.get("history").unwrap(), Some("second".to_string()));
    }

    #[test]
    fn test_remove_deletes_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileKvStore::new(dir.path());

        store.set("history", "[]").unwrap();
        store.remove("history").unwrap();

        assert!(!dir.path().join("history.json").exists());
        assert_eq!(store.get("history").unwrap(), None);
        // removing again is fine
        store.remove("history").unwrap();
    }

    #[test]
    fn test_rejects_path_like_keys() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileKvStore::new(dir.path());

        assert!(matches!(store.set("../escape", "x"), Err(Error::Storage(_))));
        assert!(matches!(store.get(""), Err(Error::Storage(_))));
        assert!(matches!(store.remove("a/b"), Err(Error::Storage(_))));
    }
}
