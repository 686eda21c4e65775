//! In-memory key-value backend.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;

use super::KeyValueStore;
use crate::error::Result;

/// Key-value store held in a process-local map.
///
/// Used by tests and by hosts that only need a session-scoped feed.
/// `set_many` applies the whole batch under one write lock.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys currently stored
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Whether no keys are stored
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Read a raw value without going through the async trait
    pub fn raw(&self, key: &str) -> Option<String> {
        self.entries.read().get(key).cloned()
    }

    /// Write a raw value without going through the async trait
    pub fn insert_raw(&self, key: &str, value: &str) {
        self.entries.write().insert(key.to_string(), value.to_string());
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.raw(key))
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.insert_raw(key, value);
        Ok(())
    }

    async fn set_many(&self, entries: &[(String, String)]) -> Result<()> {
        let mut map = self.entries.write();
        for (key, value) in entries {
            map.insert(key.clone(), value.clone());
        }
        Ok(())
    }
}
