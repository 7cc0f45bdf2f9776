//! Write-through history store

use tracing::{debug, info, warn};

use super::Interaction;
use crate::storage::KeyValueStore;
use crate::{Error, Result};

/// Key under which the serialized history lives
pub const HISTORY_KEY: &str = "history";

/// Ordered interaction log mirrored to a key-value backend.
///
/// Every mutation serializes the complete new sequence and writes it before
/// the in-memory copy is replaced, so memory and storage stay equal even when
/// the write fails.
pub struct HistoryStore {
    backend: Box<dyn KeyValueStore>,
    records: Vec<Interaction>,
}

impl HistoryStore {
    /// Take ownership of the backend and load whatever history it holds
    pub fn open(backend: Box<dyn KeyValueStore>) -> Self {
        let mut store = Self {
            backend,
            records: Vec::new(),
        };
        store.load();
        store
    }

    /// Re-read the persisted history.
    ///
    /// An absent key, a read error or unparsable JSON all yield an empty
    /// history; none of them is reported to the caller.
    pub fn load(&mut self) -> &[Interaction] {
        self.records = match self.backend.get(HISTORY_KEY) {
            Ok(Some(raw)) => match serde_json::from_str::<Vec<Interaction>>(&raw) {
                Ok(records) => records,
                Err(e) => {
                    warn!("Stored history is not valid, starting empty: {}", e);
                    Vec::new()
                }
            },
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!("Failed to read stored history, starting empty: {}", e);
                Vec::new()
            }
        };
        debug!("Loaded {} history records", self.records.len());
        &self.records
    }

    /// Add a record at the end
    pub fn append(
        &mut self,
        question: impl Into<String>,
        answer: impl Into<String>,
    ) -> Result<&[Interaction]> {
        let mut next = self.records.clone();
        next.push(Interaction::new(question, answer));
        self.commit(next)
    }

    /// Replace the record at `index`
    pub fn replace_at(
        &mut self,
        index: usize,
        question: impl Into<String>,
        answer: impl Into<String>,
    ) -> Result<&[Interaction]> {
        self.check_index(index)?;
        let mut next = self.records.clone();
        next[index] = Interaction::new(question, answer);
        self.commit(next)
    }

    /// Remove the record at `index`, keeping the order of the rest
    pub fn delete_at(&mut self, index: usize) -> Result<&[Interaction]> {
        self.check_index(index)?;
        let mut next = self.records.clone();
        next.remove(index);
        self.commit(next)
    }

    /// Empty the history and delete the persisted key
    pub fn clear(&mut self) -> Result<&[Interaction]> {
        self.backend.remove(HISTORY_KEY)?;
        self.records.clear();
        info!("Cleared history");
        Ok(&self.records)
    }

    pub fn records(&self) -> &[Interaction] {
        &self.records
    }

    pub fn get(&self, index: usize) -> Option<&Interaction> {
        self.records.get(index)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// The backing key-value surface
    pub fn backend(&self) -> &dyn KeyValueStore {
        self.backend.as_ref()
    }

    /// Give the backend back, dropping the in-memory copy
    pub fn into_backend(self) -> Box<dyn KeyValueStore> {
        self.backend
    }

    fn check_index(&self, index: usize) -> Result<()> {
        if index >= self.records.len() {
            return Err(Error::OutOfRange {
                index,
                len: self.records.len(),
            });
        }
        Ok(())
    }

    fn commit(&mut self, next: Vec<Interaction>) -> Result<&[Interaction]> {
        let json = serde_json::to_string(&next)?;
        self.backend.set(HISTORY_KEY, &json)?;
        self.records = next;
        debug!("Persisted {} history records", self.records.len());
        Ok(&self.records)
    }
}
