//! # Notifications
//!
//! Activity notifications shown on the notifications tab, newest first.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::error::Result;
use crate::outbox::Operation;
use crate::storage::{CollectionKey, WriteBatch};
use crate::store::{new_id, soft, FeedStore};

/// What kind of activity a notification reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    /// Someone liked a post
    Like,
    /// Someone commented on a post
    Comment,
    /// Someone followed the user
    Follow,
    /// Someone sent a message
    Message,
}

/// Notification payload. Which fields are set depends on the kind; keys
/// this crate does not know about are kept in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationData {
    /// Who triggered it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    /// Comment text (comment)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    /// Thumbnail of the post involved (like, comment)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post_image: Option<String>,
    /// Post involved (like, comment)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post_id: Option<String>,
    /// Conversation involved (message)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,
    /// Message preview (message)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Any other keys the app stored
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A notification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    /// Notification ID
    pub id: String,
    /// Activity kind
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    /// Kind-specific payload
    #[serde(default)]
    pub data: NotificationData,
    /// When it happened
    pub timestamp: DateTime<Utc>,
    /// Whether the user has seen it
    #[serde(default)]
    pub read: bool,
}

impl FeedStore {
    /// All notifications, newest first
    pub async fn notifications(&self) -> Vec<Notification> {
        soft(
            "get notifications",
            self.repo().load_list(&CollectionKey::Notifications).await,
            Vec::new(),
        )
    }

    /// Overwrite the notifications collection
    pub async fn save_notifications(&self, notifications: &[Notification]) -> bool {
        let _gate = self.write_gate().await;
        let result = self
            .repo()
            .store(&CollectionKey::Notifications, notifications)
            .await;
        soft("save notifications", result.map(|_| true), false)
    }

    /// Number of notifications not yet read
    pub async fn unread_notification_count(&self) -> usize {
        self.notifications().await.iter().filter(|n| !n.read).count()
    }

    /// Record a new unread notification at the top of the list
    pub async fn add_notification(
        &self,
        kind: NotificationKind,
        data: NotificationData,
    ) -> Option<Notification> {
        let _gate = self.write_gate().await;
        let result = self.try_add_notification(kind, data).await;
        soft("add notification", result.map(Some), None)
    }

    /// Mark one notification read.
    ///
    /// An unknown id changes nothing and still reports success.
    pub async fn mark_notification_read(&self, notification_id: &str) -> bool {
        let _gate = self.write_gate().await;
        let result = self
            .update_notifications(Operation::MarkNotificationRead, |notifications| {
                let notification = notifications.iter_mut().find(|n| n.id == notification_id)?;
                notification.read = true;
                Some(json!({ "notificationId": notification_id }))
            })
            .await;
        soft("mark notification read", result.map(|_| true), false)
    }

    /// Mark every notification read
    pub async fn mark_all_notifications_read(&self) -> bool {
        let _gate = self.write_gate().await;
        let result = self
            .update_notifications(Operation::MarkAllNotificationsRead, |notifications| {
                let ids: Vec<String> = notifications
                    .iter_mut()
                    .filter(|n| !n.read)
                    .map(|n| {
                        n.read = true;
                        n.id.clone()
                    })
                    .collect();
                Some(json!({ "notificationIds": ids }))
            })
            .await;
        soft("mark all notifications read", result.map(|_| true), false)
    }

    async fn try_add_notification(
        &self,
        kind: NotificationKind,
        data: NotificationData,
    ) -> Result<Notification> {
        let notification = Notification {
            id: new_id(),
            kind,
            data,
            timestamp: self.now(),
            read: false,
        };

        let mut notifications: Vec<Notification> =
            self.repo().load_list(&CollectionKey::Notifications).await?;
        notifications.insert(0, notification.clone());

        let mut batch = WriteBatch::new();
        batch.put(&CollectionKey::Notifications, &notifications)?;
        self.enqueue(&mut batch, Operation::AddNotification, &notification)
            .await?;
        self.repo().commit(batch).await?;

        Ok(notification)
    }

    /// Load, apply `change`, and persist if it returns an outbox payload
    async fn update_notifications<F>(&self, operation: Operation, change: F) -> Result<bool>
    where
        F: FnOnce(&mut Vec<Notification>) -> Option<Value>,
    {
        let mut notifications: Vec<Notification> =
            self.repo().load_list(&CollectionKey::Notifications).await?;
        let payload = match change(&mut notifications) {
            Some(payload) => payload,
            None => return Ok(false),
        };

        let mut batch = WriteBatch::new();
        batch.put(&CollectionKey::Notifications, &notifications)?;
        self.enqueue(&mut batch, operation, &payload).await?;
        self.repo().commit(batch).await?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn like_from(username: &str) -> NotificationData {
        NotificationData {
            username: Some(username.into()),
            ..Default::default()
        }
    }

    #[test]
    fn test_notification_json_shape() {
        let notification = Notification {
            id: "n1".into(),
            kind: NotificationKind::Comment,
            data: NotificationData {
                username: Some("jane_doe".into()),
                comment: Some("Amazing shot!".into()),
                ..Default::default()
            },
            timestamp: Utc::now(),
            read: false,
        };

        let json = serde_json::to_value(&notification).unwrap();
        assert_eq!(json["type"], "comment");
        assert_eq!(json["data"]["comment"], "Amazing shot!");
        assert!(json["data"].get("postId").is_none());
    }

    #[tokio::test]
    async fn test_add_notification_prepends() {
        let store = FeedStore::in_memory();

        let first = store
            .add_notification(NotificationKind::Like, like_from("a"))
            .await
            .unwrap();
        let second = store
            .add_notification(NotificationKind::Follow, like_from("b"))
            .await
            .unwrap();

        let notifications = store.notifications().await;
        assert_eq!(notifications[0].id, second.id);
        assert_eq!(notifications[1].id, first.id);
        assert_eq!(store.unread_notification_count().await, 2);
        assert!(store.sync_queue().await.is_empty());
    }

    #[tokio::test]
    async fn test_mark_read() {
        let store = FeedStore::in_memory();
        let first = store
            .add_notification(NotificationKind::Like, like_from("a"))
            .await
            .unwrap();
        store
            .add_notification(NotificationKind::Message, like_from("b"))
            .await
            .unwrap();

        assert!(store.mark_notification_read(&first.id).await);
        assert_eq!(store.unread_notification_count().await, 1);

        assert!(store.mark_notification_read("unknown").await);
        assert_eq!(store.unread_notification_count().await, 1);

        assert!(store.mark_all_notifications_read().await);
        assert_eq!(store.unread_notification_count().await, 0);
    }

    #[tokio::test]
    async fn test_unknown_data_keys_survive_rewrite() {
        let store = FeedStore::in_memory();
        let stored: Vec<Notification> = serde_json::from_value(json!([{
            "id": "n1",
            "type": "follow",
            "data": { "username": "leo", "followerCount": 12, "badge": { "color": "gold" } },
            "timestamp": "2025-06-01T09:00:00Z",
            "read": false
        }]))
        .unwrap();
        assert_eq!(stored[0].data.extra["followerCount"], 12);
        store.save_notifications(&stored).await;

        assert!(store.mark_notification_read("n1").await);

        let notifications = store.notifications().await;
        let notification = &notifications[0];
        assert!(notification.read);
        assert_eq!(notification.data.username.as_deref(), Some("leo"));
        let json = serde_json::to_value(&notification.data).unwrap();
        assert_eq!(json["followerCount"], 12);
        assert_eq!(json["badge"]["color"], "gold");
    }
}
