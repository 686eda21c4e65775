//! # Snapline Core
//!
//! Offline-first data layer for the Snapline social feed client. Everything
//! the app shows (posts, stories, direct messages, notifications, recent
//! searches) lives on the device in a string-keyed store. Mutations that a
//! backend would eventually need are recorded in an outbox instead of being
//! sent anywhere.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       SNAPLINE CORE MODULES                             │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  ┌─────────────┐  ┌─────────────┐  ┌─────────────┐  ┌──────────────┐   │
//! │  │  Identity   │  │    Feed     │  │   Stories   │  │  Messaging   │   │
//! │  │             │  │             │  │             │  │              │   │
//! │  │ - User      │  │ - Posts     │  │ - Publish   │  │ - Convos     │   │
//! │  │ - Profile   │  │ - Likes     │  │ - Viewed    │  │ - Messages   │   │
//! │  │             │  │ - Comments  │  │ - 24h TTL   │  │ - Unread     │   │
//! │  └──────┬──────┘  └──────┬──────┘  └──────┬──────┘  └──────┬───────┘   │
//! │         │                │                │                │           │
//! │         └────────────────┴───────┬────────┴────────────────┘           │
//! │                                  ▼                                     │
//! │  ┌───────────────┐  ┌──────────────────────┐  ┌─────────────────────┐  │
//! │  │ Notifications │  │      FeedStore       │  │       Outbox        │  │
//! │  │ Search        │─►│  writer gate, soft   │─►│  policy table,      │  │
//! │  │ History       │  │  failure policy      │  │  @sync_queue        │  │
//! │  └───────────────┘  └──────────┬───────────┘  └─────────────────────┘  │
//! │                                ▼                                        │
//! │                 ┌──────────────────────────────┐                        │
//! │                 │ Storage: KeyValueStore trait │                        │
//! │                 │  MemoryStore │ SqliteStore   │                        │
//! │                 └──────────────────────────────┘                        │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Hierarchy
//!
//! - [`error`] - Error types for the entire library
//! - [`config`] - Store limits and backend selection
//! - [`storage`] - Key-value backends and typed collection access
//! - [`store`] - The [`FeedStore`] facade
//! - [`identity`] - The device user and profile edits
//! - [`feed`] - Posts, likes, comments, post search
//! - [`stories`] - Expiring stories
//! - [`messaging`] - Conversations and messages
//! - [`notifications`] - Activity notifications
//! - [`search`] - Search history
//! - [`outbox`] - Sync queue and its enqueue policy
//!
//! ## Failure Model
//!
//! | Operation kind | On failure |
//! |----------------|------------|
//! | Collection read | empty list / `None` |
//! | Mutation | `false` |
//! | Create (post, story, message, ...) | `None` |
//!
//! Every failure is logged through `tracing` before being collapsed.

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

// ============================================================================
// MODULE DECLARATIONS
// ============================================================================

pub mod config;
pub mod error;
pub mod feed;
pub mod identity;
pub mod messaging;
pub mod notifications;
pub mod outbox;
pub mod search;
mod seed;
pub mod storage;
pub mod stories;
pub mod store;
/// Clock abstraction used for timestamps and story expiry.
pub mod time;

// ============================================================================
// RE-EXPORTS
// ============================================================================

pub use config::{Backend, StoreConfig};
pub use error::{Error, Result};
pub use feed::{Comment, NewPost, Post};
pub use identity::User;
pub use messaging::{Conversation, Message, MessageStatus};
pub use notifications::{Notification, NotificationData, NotificationKind};
pub use outbox::{SyncAction, SyncQueueEntry};
pub use search::SearchHistoryEntry;
pub use storage::KeyValueStore;
pub use store::FeedStore;
pub use stories::Story;

// ============================================================================
// CORE INSTANCE
// ============================================================================

use once_cell::sync::OnceCell;
use std::sync::Arc;

/// Global store shared by every screen of the app
static CORE_INSTANCE: OnceCell<Arc<FeedStore>> = OnceCell::new();

/// Configuration for initializing Snapline Core
#[derive(Debug, Clone, Default)]
pub struct CoreConfig {
    /// Store backend and limits
    pub store: StoreConfig,
    /// Fill empty collections with demo content on startup
    pub seed_demo_data: bool,
}

/// Process-wide entry point for hosts that want a single shared store
pub struct SnaplineCore;

impl SnaplineCore {
    /// Open the configured store and make it globally available.
    ///
    /// Call once at application startup. A second call fails with
    /// [`Error::AlreadyInitialized`].
    pub async fn initialize(config: CoreConfig) -> Result<Arc<FeedStore>> {
        tracing::info!("Initializing Snapline Core v{}", version());

        if CORE_INSTANCE.get().is_some() {
            return Err(Error::AlreadyInitialized);
        }

        let store = Arc::new(FeedStore::open(config.store)?);
        if config.seed_demo_data && !store.initialize_demo_data().await {
            tracing::warn!("Demo data could not be written; starting with an empty store");
        }

        CORE_INSTANCE
            .set(store.clone())
            .map_err(|_| Error::AlreadyInitialized)?;

        tracing::info!("Snapline Core initialized successfully");
        Ok(store)
    }

    /// Get the global store
    ///
    /// Returns an error if the core hasn't been initialized.
    pub fn store() -> Result<Arc<FeedStore>> {
        CORE_INSTANCE.get().cloned().ok_or(Error::NotInitialized)
    }

    /// Check if the core is initialized
    pub fn is_initialized() -> bool {
        CORE_INSTANCE.get().is_some()
    }
}

// ============================================================================
// VERSION INFO
// ============================================================================

/// Returns the version of Snapline Core
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!version().is_empty());
    }

    #[test]
    fn test_core_config_default() {
        let config = CoreConfig::default();
        assert!(!config.seed_demo_data);
        assert_eq!(config.store.backend, Backend::Memory);
    }
}
