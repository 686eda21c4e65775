//! Store configuration.
//!
//! Limits that the feed screens depend on (story lifetime, how many recent
//! searches to keep, profile field lengths) live here rather than as scattered
//! literals, so that a host app can tune them and tests can shrink them.

use chrono::Duration;

use crate::error::{Error, Result};

/// Default lifetime of a story
pub const DEFAULT_STORY_TTL_HOURS: i64 = 24;

/// Default number of recent searches kept
pub const DEFAULT_SEARCH_HISTORY_LIMIT: usize = 20;

/// Default maximum username length (characters)
pub const DEFAULT_MAX_USERNAME_LENGTH: usize = 30;

/// Default maximum bio length (characters)
pub const DEFAULT_MAX_BIO_LENGTH: usize = 150;

/// Which key-value backend a [`FeedStore`](crate::FeedStore) should open
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Backend {
    /// Process-local map; nothing survives the process
    #[default]
    Memory,
    /// SQLite database file at the given path
    Sqlite(String),
    /// SQLite in-memory database (exercises the SQL path without a file)
    SqliteInMemory,
}

/// Configuration for a [`FeedStore`](crate::FeedStore)
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Key-value backend
    pub backend: Backend,
    /// Stories older than this are evicted on read
    pub story_ttl: Duration,
    /// Maximum number of search history entries
    pub search_history_limit: usize,
    /// Maximum username length accepted by `update_profile`
    pub max_username_length: usize,
    /// Maximum bio length accepted by `update_profile`
    pub max_bio_length: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: Backend::Memory,
            story_ttl: Duration::hours(DEFAULT_STORY_TTL_HOURS),
            search_history_limit: DEFAULT_SEARCH_HISTORY_LIMIT,
            max_username_length: DEFAULT_MAX_USERNAME_LENGTH,
            max_bio_length: DEFAULT_MAX_BIO_LENGTH,
        }
    }
}

impl StoreConfig {
    /// Use a SQLite file at `path`
    pub fn with_database_path(mut self, path: impl Into<String>) -> Self {
        self.backend = Backend::Sqlite(path.into());
        self
    }

    /// Select a backend explicitly
    pub fn with_backend(mut self, backend: Backend) -> Self {
        self.backend = backend;
        self
    }

    /// Override the story lifetime
    pub fn with_story_ttl(mut self, ttl: Duration) -> Self {
        self.story_ttl = ttl;
        self
    }

    /// Override the search history cap
    pub fn with_search_history_limit(mut self, limit: usize) -> Self {
        self.search_history_limit = limit;
        self
    }

    /// Reject values that would make the store misbehave
    pub fn validate(&self) -> Result<()> {
        if self.story_ttl <= Duration::zero() {
            return Err(Error::InvalidConfig("story_ttl must be positive".into()));
        }
        if self.search_history_limit == 0 {
            return Err(Error::InvalidConfig(
                "search_history_limit must be at least 1".into(),
            ));
        }
        if self.max_username_length == 0 {
            return Err(Error::InvalidConfig(
                "max_username_length must be at least 1".into(),
            ));
        }
        if let Backend::Sqlite(path) = &self.backend {
            if path.trim().is_empty() {
                return Err(Error::InvalidConfig("database path is empty".into()));
            }
        }
        Ok(())
    }
}
