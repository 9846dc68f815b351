use std::collections::HashMap;
use std::sync::Mutex;

use thiserror::Error;

/// Errors raised by key/value backends.
///
/// These never reach callers of the notes facade; the local note collection
/// treats an unreadable slot as empty.
#[derive(Debug, Error)]
pub enum StoreError {
    /// SQLite failure in the file-backed store
    #[error("Storage error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Collection could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A previous holder of the store lock panicked
    #[error("Store lock poisoned")]
    Poisoned,
}

/// A string-valued key/value store holding whole serialized blobs.
///
/// Every read and write covers the full value under a key; there is no
/// partial update and no transaction spanning a read and a later write.
pub trait KeyValueStore {
    /// Returns the value stored under `key`, or `None` if the slot is empty.
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Replaces the value stored under `key`.
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
}

/// Process-local store kept entirely in memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    slots: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let slots = self.slots.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(slots.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut slots = self.slots.lock().map_err(|_| StoreError::Poisoned)?;
        slots.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_store_starts_empty() {
        let store = MemoryStore::new();
        assert_eq!(store.get("anything").unwrap(), None);
    }

    #[test]
    fn memory_store_overwrites_whole_value() {
        let store = MemoryStore::new();
        store.set("k", "first").unwrap();
        store.set("k", "second").unwrap();

        assert_eq!(store.get("k").unwrap().as_deref(), Some("second"));
    }

    #[test]
    fn store_error_messages_are_descriptive() {
        let json_error = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let error = StoreError::from(json_error);
        assert!(error.to_string().contains("Serialization error"));
        assert_eq!(StoreError::Poisoned.to_string(), "Store lock poisoned");
    }
}
