//! # Storage Module
//!
//! Local persistence for every feed collection.
//!
//! ## Storage Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         STORAGE SYSTEM                                  │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │  Repository (typed)                                             │   │
//! │  │  ──────────────────                                              │   │
//! │  │  load_list::<Post>(CollectionKey::Posts)                        │   │
//! │  │  WriteBatch::put(CollectionKey::Posts, &posts)                  │   │
//! │  └──────────────────────────────┬──────────────────────────────────┘   │
//! │                                 │ JSON strings                          │
//! │                                 ▼                                       │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │  KeyValueStore trait                                            │   │
//! │  │  ───────────────────                                             │   │
//! │  │  • get(key)            - Fetch a blob, None if absent           │   │
//! │  │  • set(key, value)     - Overwrite a blob                       │   │
//! │  │  • set_many(entries)   - Overwrite several blobs together       │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                                                         │
//! │  Implementations:                                                      │
//! │  ┌───────────────┐  ┌───────────────┐                                  │
//! │  │  MemoryStore  │  │  SqliteStore  │                                  │
//! │  │               │  │               │                                  │
//! │  │ - Tests       │  │ - kv table    │                                  │
//! │  │ - Ephemeral   │  │ - Batches in  │                                  │
//! │  │   sessions    │  │   one txn     │                                  │
//! │  └───────────────┘  └───────────────┘                                  │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Key Namespace
//!
//! | Collection    | Key                 |
//! |---------------|---------------------|
//! | User          | `@user`             |
//! | Posts         | `@posts`            |
//! | Stories       | `@stories`          |
//! | Conversations | `@conversations`    |
//! | Messages      | `@messages_<convId>`|
//! | Notifications | `@notifications`    |
//! | Search        | `@search_history`   |
//! | Sync queue    | `@sync_queue`       |

mod keys;
mod memory;
mod repository;
mod schema;
mod sqlite;

pub use keys::CollectionKey;
pub use memory::MemoryStore;
pub use repository::{Repository, WriteBatch};
pub use sqlite::SqliteStore;

use async_trait::async_trait;
use std::sync::Arc;

use crate::config::Backend;
use crate::error::Result;

/// String-keyed, string-valued persistent store.
///
/// This is the only collaborator outside the crate. A completed `set` must
/// be visible to subsequent `get`s from the same process.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Fetch the value stored under `key`
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Overwrite the value stored under `key`
    async fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Overwrite several keys.
    ///
    /// Backends that can apply the whole batch atomically should override
    /// this; the default writes entries one at a time in order.
    async fn set_many(&self, entries: &[(String, String)]) -> Result<()> {
        for (key, value) in entries {
            self.set(key, value).await?;
        }
        Ok(())
    }
}

/// Open the backend described by `backend`
pub fn open(backend: &Backend) -> Result<Arc<dyn KeyValueStore>> {
    let store: Arc<dyn KeyValueStore> = match backend {
        Backend::Memory => Arc::new(MemoryStore::new()),
        Backend::Sqlite(path) => Arc::new(SqliteStore::open(Some(path))?),
        Backend::SqliteInMemory => Arc::new(SqliteStore::open(None)?),
    };
    Ok(store)
}
