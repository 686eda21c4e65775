//! # Outbox
//!
//! Append-only queue of actions that a future backend would need to replay.
//! Nothing in this crate drains it.
//!
//! ## Enqueue Policy
//!
//! Which operations produce an outbox entry is decided in one place,
//! [`policy`], instead of at each call site:
//!
//! | Operation                  | Action          |
//! |----------------------------|-----------------|
//! | `add_post`                 | `create_post`   |
//! | `like_post`                | `like_post`     |
//! | `add_comment`              | `add_comment`   |
//! | `add_story`                | `add_story`     |
//! | `mark_story_viewed`        | `view_story`    |
//! | `send_message`             | `send_message`  |
//! | everything else            | (local only)    |

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::storage::{CollectionKey, WriteBatch};
use crate::store::{new_id, soft, FeedStore};

/// A remote action waiting in the outbox
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncAction {
    /// A post was created
    CreatePost,
    /// A post was liked or unliked
    LikePost,
    /// A comment was added to a post
    AddComment,
    /// A story was published
    AddStory,
    /// A story was viewed
    ViewStory,
    /// A direct message was sent
    SendMessage,
}

impl SyncAction {
    /// Wire name of the action
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncAction::CreatePost => "create_post",
            SyncAction::LikePost => "like_post",
            SyncAction::AddComment => "add_comment",
            SyncAction::AddStory => "add_story",
            SyncAction::ViewStory => "view_story",
            SyncAction::SendMessage => "send_message",
        }
    }
}

/// Store operations that may produce an outbox entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// `add_post`
    AddPost,
    /// `like_post`
    LikePost,
    /// `add_comment`
    AddComment,
    /// `add_story`
    AddStory,
    /// `mark_story_viewed`
    MarkStoryViewed,
    /// `send_message`
    SendMessage,
    /// `update_profile`
    UpdateProfile,
    /// `add_notification`
    AddNotification,
    /// `mark_notification_read`
    MarkNotificationRead,
    /// `mark_all_notifications_read`
    MarkAllNotificationsRead,
    /// `mark_conversation_read`
    MarkConversationRead,
    /// `add_search_history`
    AddSearchHistory,
}

/// The outbox action an operation enqueues, if any
pub fn policy(operation: Operation) -> Option<SyncAction> {
    match operation {
        Operation::AddPost => Some(SyncAction::CreatePost),
        Operation::LikePost => Some(SyncAction::LikePost),
        Operation::AddComment => Some(SyncAction::AddComment),
        Operation::AddStory => Some(SyncAction::AddStory),
        Operation::MarkStoryViewed => Some(SyncAction::ViewStory),
        Operation::SendMessage => Some(SyncAction::SendMessage),
        Operation::UpdateProfile
        | Operation::AddNotification
        | Operation::MarkNotificationRead
        | Operation::MarkAllNotificationsRead
        | Operation::MarkConversationRead
        | Operation::AddSearchHistory => None,
    }
}

/// One outbox record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncQueueEntry {
    /// Unique entry ID
    pub id: String,
    /// What should be replayed
    pub action: SyncAction,
    /// Action payload (shape depends on `action`)
    pub data: serde_json::Value,
    /// When the entry was queued
    pub timestamp: DateTime<Utc>,
}

impl SyncQueueEntry {
    /// Create an entry stamped `now`
    pub fn new(action: SyncAction, data: serde_json::Value, now: DateTime<Utc>) -> Self {
        Self {
            id: new_id(),
            action,
            data,
            timestamp: now,
        }
    }
}

impl FeedStore {
    /// All queued actions, oldest first
    pub async fn sync_queue(&self) -> Vec<SyncQueueEntry> {
        soft(
            "get sync queue",
            self.repo().load_list(&CollectionKey::SyncQueue).await,
            Vec::new(),
        )
    }

    /// Append an action to the outbox directly
    pub async fn add_to_sync_queue(&self, action: SyncAction, data: serde_json::Value) -> bool {
        let _gate = self.write_gate().await;
        let result = async {
            let mut batch = WriteBatch::new();
            self.push_sync_entry(&mut batch, action, data).await?;
            self.repo().commit(batch).await
        }
        .await;
        soft("add to sync queue", result.map(|_| true), false)
    }

    /// Drop every queued action
    pub async fn clear_sync_queue(&self) -> bool {
        let _gate = self.write_gate().await;
        let empty: Vec<SyncQueueEntry> = Vec::new();
        let result = self.repo().store(&CollectionKey::SyncQueue, &empty).await;
        soft("clear sync queue", result.map(|_| true), false)
    }

    /// Add the outbox entry `operation` calls for to `batch`.
    ///
    /// Caller must hold the writer gate.
    pub(crate) async fn enqueue<T: Serialize>(
        &self,
        batch: &mut WriteBatch,
        operation: Operation,
        data: &T,
    ) -> Result<()> {
        let action = match policy(operation) {
            Some(action) => action,
            None => return Ok(()),
        };
        let data = serde_json::to_value(data)
            .map_err(|e| Error::SerializationError(format!("{} payload: {}", action.as_str(), e)))?;
        self.push_sync_entry(batch, action, data).await
    }

    async fn push_sync_entry(
        &self,
        batch: &mut WriteBatch,
        action: SyncAction,
        data: serde_json::Value,
    ) -> Result<()> {
        let mut queue: Vec<SyncQueueEntry> =
            self.repo().load_list(&CollectionKey::SyncQueue).await?;
        queue.push(SyncQueueEntry::new(action, data, self.now()));
        tracing::debug!("Queued {} (outbox size {})", action.as_str(), queue.len());
        batch.put(&CollectionKey::SyncQueue, &queue)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_policy_table() {
        assert_eq!(policy(Operation::AddPost), Some(SyncAction::CreatePost));
        assert_eq!(policy(Operation::MarkStoryViewed), Some(SyncAction::ViewStory));
        assert_eq!(policy(Operation::SendMessage), Some(SyncAction::SendMessage));
        assert_eq!(policy(Operation::AddNotification), None);
        assert_eq!(policy(Operation::AddSearchHistory), None);
    }

    #[test]
    fn test_action_wire_names() {
        let encoded = serde_json::to_string(&SyncAction::CreatePost).unwrap();
        assert_eq!(encoded, "\"create_post\"");
        assert_eq!(SyncAction::SendMessage.as_str(), "send_message");
    }

    #[tokio::test]
    async fn test_add_and_clear_sync_queue() {
        let store = FeedStore::in_memory();

        assert!(store.add_to_sync_queue(SyncAction::LikePost, json!({"postId": "1", "liked": true})).await);
        assert!(store.add_to_sync_queue(SyncAction::LikePost, json!({"postId": "2", "liked": false})).await);

        let queue = store.sync_queue().await;
        assert_eq!(queue.len(), 2);
        assert_eq!(queue[0].data["postId"], "1");
        assert_eq!(queue[1].data["postId"], "2");

        assert!(store.clear_sync_queue().await);
        assert!(store.sync_queue().await.is_empty());
    }
}
