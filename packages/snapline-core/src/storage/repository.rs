//! Typed access to whole collections.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;

use super::{CollectionKey, KeyValueStore};
use crate::error::{Error, Result};

/// Typed facade over a [`KeyValueStore`].
///
/// Every collection is one JSON document under one key. Reads decode the
/// whole document; writes go through a [`WriteBatch`] so that a mutation
/// touching several collections lands in a single `set_many` call.
#[derive(Clone)]
pub struct Repository {
    kv: Arc<dyn KeyValueStore>,
}

impl Repository {
    /// Wrap a key-value backend
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self { kv }
    }

    /// Load and decode a collection.
    ///
    /// `None` if the key has never been written or holds a blob that no
    /// longer decodes. An undecodable blob is overwritten by the next write
    /// to the collection. Backend failures are returned as errors.
    pub async fn load<T: DeserializeOwned>(&self, key: &CollectionKey) -> Result<Option<T>> {
        let raw = match self.kv.get(&key.as_key()).await? {
            Some(raw) => raw,
            None => return Ok(None),
        };

        match serde_json::from_str(&raw) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                let err = Error::DeserializationError(format!("{}: {}", key, e));
                tracing::warn!("Treating {} as empty (code {}): {}", key, err.code(), err);
                Ok(None)
            }
        }
    }

    /// Load a list collection, treating an absent key as empty
    pub async fn load_list<T: DeserializeOwned>(&self, key: &CollectionKey) -> Result<Vec<T>> {
        Ok(self.load(key).await?.unwrap_or_default())
    }

    /// Encode and write a single collection
    pub async fn store<T: Serialize + ?Sized>(&self, key: &CollectionKey, value: &T) -> Result<()> {
        let mut batch = WriteBatch::new();
        batch.put(key, value)?;
        self.commit(batch).await
    }

    /// Write every entry of `batch`
    pub async fn commit(&self, batch: WriteBatch) -> Result<()> {
        if batch.is_empty() {
            return Ok(());
        }
        tracing::trace!("Committing {} collection(s)", batch.len());
        self.kv.set_many(&batch.entries).await
    }
}

/// Collections encoded and waiting to be written together.
#[derive(Debug, Default)]
pub struct WriteBatch {
    entries: Vec<(String, String)>,
}

impl WriteBatch {
    /// Create an empty batch
    pub fn new() -> Self {
        Self::default()
    }

    /// Encode `value` for `key`. A later put for the same key replaces the
    /// earlier one.
    pub fn put<T: Serialize + ?Sized>(&mut self, key: &CollectionKey, value: &T) -> Result<()> {
        let key = key.as_key();
        let encoded = serde_json::to_string(value)
            .map_err(|e| Error::SerializationError(format!("{}: {}", key, e)))?;

        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = encoded,
            None => self.entries.push((key, encoded)),
        }
        Ok(())
    }

    /// Number of collections in the batch
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the batch is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Storage keys in write order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    #[tokio::test]
    async fn test_absent_list_is_empty() {
        let repo = Repository::new(Arc::new(MemoryStore::new()));
        let posts: Vec<u32> = repo.load_list(&CollectionKey::Posts).await.unwrap();
        assert!(posts.is_empty());
    }

    #[tokio::test]
    async fn test_store_then_load() {
        let repo = Repository::new(Arc::new(MemoryStore::new()));
        repo.store(&CollectionKey::SearchHistory, &vec!["a", "b"])
            .await
            .unwrap();

        let loaded: Vec<String> = repo.load_list(&CollectionKey::SearchHistory).await.unwrap();
        assert_eq!(loaded, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_malformed_blob_reads_as_absent() {
        let kv = Arc::new(MemoryStore::new());
        kv.insert_raw("@posts", "{not json");
        let repo = Repository::new(kv.clone());

        let posts: Vec<u32> = repo.load_list(&CollectionKey::Posts).await.unwrap();
        assert!(posts.is_empty());

        repo.store(&CollectionKey::Posts, &vec![7u32]).await.unwrap();
        assert_eq!(kv.raw("@posts").unwrap(), "[7]");
    }

    #[test]
    fn test_batch_put_replaces_same_key() {
        let mut batch = WriteBatch::new();
        batch.put(&CollectionKey::Posts, &vec![1]).unwrap();
        batch.put(&CollectionKey::SyncQueue, &vec![2]).unwrap();
        batch.put(&CollectionKey::Posts, &vec![3]).unwrap();

        assert_eq!(batch.len(), 2);
        assert_eq!(batch.keys().collect::<Vec<_>>(), vec!["@posts", "@sync_queue"]);
    }
}
