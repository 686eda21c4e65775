//! Demo content for a first launch.
//!
//! Each collection is only filled if it is empty (or holds a blob that no
//! longer decodes), so running the seeder on every start is harmless. A
//! backend read error aborts the whole seed without writing anything.

use chrono::{DateTime, Duration, Utc};

use crate::error::Result;
use crate::feed::Post;
use crate::identity::User;
use crate::messaging::{Conversation, Message, MessageStatus};
use crate::notifications::{Notification, NotificationData, NotificationKind};
use crate::storage::{CollectionKey, WriteBatch};
use crate::store::{soft, FeedStore};
use crate::stories::Story;

const USER_AVATAR: &str =
    "https://images.pexels.com/photos/2379004/pexels-photo-2379004.jpeg?auto=compress&cs=tinysrgb&w=200";
const SUNSET_IMAGE: &str =
    "https://images.pexels.com/photos/1181467/pexels-photo-1181467.jpeg?auto=compress&cs=tinysrgb&w=800";
const MOUNTAIN_IMAGE: &str =
    "https://images.pexels.com/photos/1366919/pexels-photo-1366919.jpeg?auto=compress&cs=tinysrgb&w=800";
const SUNSET_THUMB: &str =
    "https://images.pexels.com/photos/1181467/pexels-photo-1181467.jpeg?auto=compress&cs=tinysrgb&w=200";
const MOUNTAIN_THUMB: &str =
    "https://images.pexels.com/photos/1366919/pexels-photo-1366919.jpeg?auto=compress&cs=tinysrgb&w=200";
const SARAH_AVATAR: &str =
    "https://images.pexels.com/photos/774909/pexels-photo-774909.jpeg?auto=compress&cs=tinysrgb&w=200";

impl FeedStore {
    /// Fill empty collections with demo content.
    ///
    /// Returns `false` if the store could not be read or written.
    pub async fn initialize_demo_data(&self) -> bool {
        let _gate = self.write_gate().await;
        let result = self.try_seed().await;
        soft("initialize demo data", result.map(|_| true), false)
    }

    async fn try_seed(&self) -> Result<()> {
        let now = self.now();
        let mut batch = WriteBatch::new();

        let user = match self.repo().load::<User>(&CollectionKey::User).await? {
            Some(user) => user,
            None => {
                let user = demo_user();
                batch.put(&CollectionKey::User, &user)?;
                user
            }
        };

        let posts: Vec<Post> = self.repo().load_list(&CollectionKey::Posts).await?;
        if posts.is_empty() {
            batch.put(&CollectionKey::Posts, &demo_posts(now))?;
        }

        let conversations: Vec<Conversation> =
            self.repo().load_list(&CollectionKey::Conversations).await?;
        if conversations.is_empty() {
            let (conversation, message) = demo_conversation(now);
            batch.put(&CollectionKey::Conversations, &[conversation])?;
            batch.put(&CollectionKey::Messages("1".into()), &[message])?;
        }

        if self.active_stories().await?.is_empty() {
            batch.put(&CollectionKey::Stories, &[demo_story(&user, now)])?;
        }

        let notifications: Vec<Notification> =
            self.repo().load_list(&CollectionKey::Notifications).await?;
        if notifications.is_empty() {
            batch.put(&CollectionKey::Notifications, &demo_notifications(now))?;
        }

        if !batch.is_empty() {
            tracing::info!("Seeding demo data: {:?}", batch.keys().collect::<Vec<_>>());
        }
        self.repo().commit(batch).await
    }
}

fn demo_user() -> User {
    User {
        id: "1".into(),
        username: "you".into(),
        bio: "Welcome to your offline social app! 📱".into(),
        avatar: USER_AVATAR.into(),
    }
}

fn demo_posts(now: DateTime<Utc>) -> Vec<Post> {
    let post = |id: &str, image: &str, caption: &str, likes: i64, age: Duration| Post {
        id: id.into(),
        username: "you".into(),
        avatar: USER_AVATAR.into(),
        image: image.into(),
        caption: caption.into(),
        likes,
        liked: false,
        comments: Vec::new(),
        timestamp: now - age,
        synced: true,
    };

    vec![
        post("1", SUNSET_IMAGE, "Beautiful sunset 🌅", 42, Duration::hours(1)),
        post("2", MOUNTAIN_IMAGE, "Mountain vibes ⛰️", 28, Duration::hours(2)),
    ]
}

fn demo_conversation(now: DateTime<Utc>) -> (Conversation, Message) {
    let sent = now - Duration::minutes(30);
    let message = Message {
        id: "1".into(),
        text: "Hey! How are you?".into(),
        timestamp: sent,
        is_mine: false,
        status: MessageStatus::Read,
        synced: true,
    };
    let conversation = Conversation {
        id: "1".into(),
        name: "Sarah Johnson".into(),
        avatar: SARAH_AVATAR.into(),
        last_message: message.text.clone(),
        last_message_time: Some(sent),
        unread: 2,
    };
    (conversation, message)
}

fn demo_story(user: &User, now: DateTime<Utc>) -> Story {
    Story {
        id: "story1".into(),
        user_id: user.id.clone(),
        username: user.username.clone(),
        avatar: user.avatar.clone(),
        image: SUNSET_IMAGE.into(),
        timestamp: now - Duration::hours(2),
        viewed: false,
        synced: true,
    }
}

fn demo_notifications(now: DateTime<Utc>) -> Vec<Notification> {
    vec![
        Notification {
            id: "notif1".into(),
            kind: NotificationKind::Like,
            data: NotificationData {
                username: Some("demo_user".into()),
                post_image: Some(SUNSET_THUMB.into()),
                ..Default::default()
            },
            timestamp: now - Duration::hours(1),
            read: false,
        },
        Notification {
            id: "notif2".into(),
            kind: NotificationKind::Comment,
            data: NotificationData {
                username: Some("jane_doe".into()),
                comment: Some("Amazing shot!".into()),
                post_image: Some(MOUNTAIN_THUMB.into()),
                ..Default::default()
            },
            timestamp: now - Duration::hours(2),
            read: false,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StoreConfig;
    use crate::error::Error;
    use crate::feed::NewPost;
    use crate::storage::{KeyValueStore, MemoryStore};
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::sync::Arc;

    /// Memory backend that fails the next read of one key
    struct FlakyStore {
        inner: MemoryStore,
        fail_next_get: Mutex<Option<String>>,
    }

    #[async_trait]
    impl KeyValueStore for FlakyStore {
        async fn get(&self, key: &str) -> crate::error::Result<Option<String>> {
            let fail = {
                let mut pending = self.fail_next_get.lock();
                if pending.as_deref() == Some(key) {
                    pending.take();
                    true
                } else {
                    false
                }
            };
            if fail {
                return Err(Error::StorageReadError(format!("{} unavailable", key)));
            }
            self.inner.get(key).await
        }

        async fn set(&self, key: &str, value: &str) -> crate::error::Result<()> {
            self.inner.set(key, value).await
        }
    }

    #[tokio::test]
    async fn test_seed_empty_store() {
        let store = FeedStore::in_memory();
        assert!(store.initialize_demo_data().await);

        assert_eq!(store.user().await.unwrap().username, "you");
        assert_eq!(store.posts().await.len(), 2);
        assert_eq!(store.conversations().await[0].unread, 2);
        assert_eq!(store.messages("1").await.len(), 1);
        assert_eq!(store.notifications().await.len(), 2);

        let stories = store.stories().await;
        assert_eq!(stories.len(), 1);
        assert_eq!(stories[0].user_id, "1");
        assert!(!stories[0].viewed);
        assert!(store.sync_queue().await.is_empty());
    }

    #[tokio::test]
    async fn test_seed_keeps_existing_data() {
        let store = FeedStore::in_memory();
        let user = User {
            id: "u9".into(),
            username: "maria".into(),
            bio: String::new(),
            avatar: String::new(),
        };
        store.save_user(&user).await;
        store.save_conversations(&[Conversation {
            id: "c1".into(),
            name: "Leo".into(),
            avatar: String::new(),
            last_message: String::new(),
            last_message_time: None,
            unread: 0,
        }])
        .await;

        assert!(store.initialize_demo_data().await);
        assert!(store.initialize_demo_data().await);

        assert_eq!(store.user().await, Some(user));
        assert_eq!(store.conversations().await.len(), 1);
        assert!(store.messages("1").await.is_empty());
        assert_eq!(store.stories().await[0].username, "maria");
        assert_eq!(store.posts().await.len(), 2);
    }

    #[tokio::test]
    async fn test_seed_aborts_on_read_error() {
        let kv = Arc::new(FlakyStore {
            inner: MemoryStore::new(),
            fail_next_get: Mutex::new(None),
        });
        let store = FeedStore::new(kv.clone(), StoreConfig::default());
        let mine = store
            .add_post(NewPost {
                username: "you".into(),
                caption: "my own post".into(),
                ..Default::default()
            })
            .await
            .unwrap();

        *kv.fail_next_get.lock() = Some("@posts".into());
        assert!(!store.initialize_demo_data().await);

        assert_eq!(store.posts().await, vec![mine]);
        assert!(store.user().await.is_none());
        assert!(store.notifications().await.is_empty());
    }
}
