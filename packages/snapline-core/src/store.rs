//! # Feed Store
//!
//! The facade every screen talks to.
//!
//! ## Operation Flow
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       MUTATION OPERATION                                │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  UI event ──► FeedStore::like_post("42")                               │
//! │                     │                                                   │
//! │                     ▼                                                   │
//! │              acquire writer gate                                       │
//! │                     │                                                   │
//! │                     ▼                                                   │
//! │              load @posts ──► find "42" ──► toggle liked / likes        │
//! │                     │                                                   │
//! │                     ▼                                                   │
//! │              WriteBatch { @posts, @sync_queue (+ like_post) }          │
//! │                     │                                                   │
//! │                     ▼                                                   │
//! │              KeyValueStore::set_many ──► release gate                  │
//! │                     │                                                   │
//! │                     ▼                                                   │
//! │              Ok ──► true        Err ──► warn! ──► false                │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Concurrency
//!
//! Every read-modify-write runs under one async mutex (the writer gate), so
//! two tasks sharing an `Arc<FeedStore>` cannot overwrite each other's
//! snapshot. Plain reads skip the gate. Operation bodies live in the domain
//! modules (`feed`, `stories`, `messaging`, ...) as `impl FeedStore` blocks;
//! they must never call a gated public method while holding the gate.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard};
use uuid::Uuid;

use crate::config::StoreConfig;
use crate::error::Result;
use crate::storage::{self, KeyValueStore, MemoryStore, Repository};
use crate::time::{Clock, SystemClock};

/// Local data store for the social feed
pub struct FeedStore {
    /// Typed collection access
    repo: Repository,
    /// Time source for timestamps and story expiry
    clock: Arc<dyn Clock>,
    /// Limits and backend selection
    config: StoreConfig,
    /// Serializes read-modify-write operations
    writer: Mutex<()>,
}

impl FeedStore {
    /// Create a store over an existing backend
    pub fn new(kv: Arc<dyn KeyValueStore>, config: StoreConfig) -> Self {
        Self::with_clock(kv, config, Arc::new(SystemClock))
    }

    /// Create a store with an explicit clock
    pub fn with_clock(kv: Arc<dyn KeyValueStore>, config: StoreConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            repo: Repository::new(kv),
            clock,
            config,
            writer: Mutex::new(()),
        }
    }

    /// Open the backend named in `config`
    pub fn open(config: StoreConfig) -> Result<Self> {
        config.validate()?;
        let kv = storage::open(&config.backend)?;
        tracing::info!("Opened feed store ({:?})", config.backend);
        Ok(Self::new(kv, config))
    }

    /// A store backed by a fresh [`MemoryStore`]
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()), StoreConfig::default())
    }

    /// Active configuration
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub(crate) fn repo(&self) -> &Repository {
        &self.repo
    }

    pub(crate) fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Wait for exclusive write access
    pub(crate) async fn write_gate(&self) -> MutexGuard<'_, ()> {
        self.writer.lock().await
    }
}

/// Fresh record identifier
pub(crate) fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// Collapse a failed operation into `default`, logging why.
pub(crate) fn soft<T>(operation: &str, result: Result<T>, default: T) -> T {
    match result {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!("{} failed (code {}): {}", operation, e.code(), e);
            default
        }
    }
}
