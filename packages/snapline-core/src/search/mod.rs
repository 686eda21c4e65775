//! # Search History
//!
//! Recent queries from the explore screen, most recent first. Queries are
//! unique; repeating one moves it back to the front.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::outbox::Operation;
use crate::storage::{CollectionKey, WriteBatch};
use crate::store::{soft, FeedStore};

/// A remembered query
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHistoryEntry {
    /// Query text as typed
    pub query: String,
    /// When it was last searched
    pub timestamp: DateTime<Utc>,
}

/// Put `entry` at the front, dropping any older copy of the same query
/// and anything past `limit`.
pub fn remember(history: &mut Vec<SearchHistoryEntry>, entry: SearchHistoryEntry, limit: usize) {
    history.retain(|existing| existing.query != entry.query);
    history.insert(0, entry);
    history.truncate(limit);
}

impl FeedStore {
    /// Remembered queries, most recent first
    pub async fn search_history(&self) -> Vec<SearchHistoryEntry> {
        soft(
            "get search history",
            self.repo().load_list(&CollectionKey::SearchHistory).await,
            Vec::new(),
        )
    }

    /// Remember a query.
    ///
    /// Matching is exact and case-sensitive; the caller trims input.
    pub async fn add_search_history(&self, query: &str) -> bool {
        let _gate = self.write_gate().await;
        let result = self.try_add_search_history(query).await;
        soft("add search history", result.map(|_| true), false)
    }

    /// Forget every query
    pub async fn clear_search_history(&self) -> bool {
        let _gate = self.write_gate().await;
        let empty: Vec<SearchHistoryEntry> = Vec::new();
        let result = self.repo().store(&CollectionKey::SearchHistory, &empty).await;
        soft("clear search history", result.map(|_| true), false)
    }

    async fn try_add_search_history(&self, query: &str) -> Result<()> {
        let mut history: Vec<SearchHistoryEntry> =
            self.repo().load_list(&CollectionKey::SearchHistory).await?;
        let entry = SearchHistoryEntry {
            query: query.to_string(),
            timestamp: self.now(),
        };
        remember(&mut history, entry.clone(), self.config().search_history_limit);

        let mut batch = WriteBatch::new();
        batch.put(&CollectionKey::SearchHistory, &history)?;
        self.enqueue(&mut batch, Operation::AddSearchHistory, &entry)
            .await?;
        self.repo().commit(batch).await
    }
}
