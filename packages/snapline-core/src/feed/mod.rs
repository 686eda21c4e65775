//! # Feed
//!
//! Posts, their likes and comments.
//!
//! ```text
//! @posts  (newest first)
//! ┌──────────────────────────────────────────────┐
//! │ Post { id, likes: 43, liked: true, ... }     │ ◄── add_post prepends
//! │   comments: [ Comment, Comment ] (oldest 1st)│ ◄── add_comment appends
//! │ Post { id, likes: 28, liked: false, ... }    │
//! └──────────────────────────────────────────────┘
//! ```
//!
//! `likes` and `liked` only ever change together: a toggle moves `likes` by
//! exactly one in the direction of the new `liked` value. The counter is
//! signed and never clamped, so an even number of toggles always restores
//! the original pair.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::Result;
use crate::outbox::Operation;
use crate::storage::{CollectionKey, WriteBatch};
use crate::store::{new_id, soft, FeedStore};

/// A post in the feed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    /// Post ID
    pub id: String,
    /// Author handle
    pub username: String,
    /// Author avatar URI
    #[serde(default)]
    pub avatar: String,
    /// Image URI
    #[serde(default)]
    pub image: String,
    /// Caption text
    #[serde(default)]
    pub caption: String,
    /// Like counter
    #[serde(default)]
    pub likes: i64,
    /// Whether the local user liked it
    #[serde(default)]
    pub liked: bool,
    /// Comments, oldest first
    #[serde(default)]
    pub comments: Vec<Comment>,
    /// Creation time
    pub timestamp: DateTime<Utc>,
    /// Whether a backend has acknowledged it
    #[serde(default)]
    pub synced: bool,
}

impl Post {
    /// Flip `liked` and move `likes` with it. Returns the new `liked`.
    pub fn toggle_like(&mut self) -> bool {
        self.liked = !self.liked;
        self.likes += if self.liked { 1 } else { -1 };
        self.liked
    }

    /// Case-insensitive match on author or caption.
    ///
    /// `needle` must already be lowercase.
    fn matches(&self, needle: &str) -> bool {
        self.username.to_lowercase().contains(needle) || self.caption.to_lowercase().contains(needle)
    }
}

/// A comment on a post
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    /// Comment ID
    pub id: String,
    /// Comment text
    pub text: String,
    /// Creation time
    pub timestamp: DateTime<Utc>,
    /// Whether a backend has acknowledged it
    #[serde(default)]
    pub synced: bool,
}

/// Caller-supplied fields of a new post.
///
/// `likes`, `liked` and `comments` default to an untouched post.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewPost {
    /// Author handle
    pub username: String,
    /// Author avatar URI
    pub avatar: String,
    /// Image URI
    pub image: String,
    /// Caption text
    pub caption: String,
    /// Starting like counter
    pub likes: i64,
    /// Whether the local user already liked it
    pub liked: bool,
    /// Comments carried over, oldest first
    pub comments: Vec<Comment>,
}

impl NewPost {
    fn into_post(self, id: String, now: DateTime<Utc>) -> Post {
        Post {
            id,
            username: self.username,
            avatar: self.avatar,
            image: self.image,
            caption: self.caption,
            likes: self.likes,
            liked: self.liked,
            comments: self.comments,
            timestamp: now,
            synced: false,
        }
    }
}

impl FeedStore {
    // ========================================================================
    // ACCESSORS
    // ========================================================================

    /// All posts, newest first
    pub async fn posts(&self) -> Vec<Post> {
        soft(
            "get posts",
            self.repo().load_list(&CollectionKey::Posts).await,
            Vec::new(),
        )
    }

    /// Overwrite the posts collection
    pub async fn save_posts(&self, posts: &[Post]) -> bool {
        let _gate = self.write_gate().await;
        let result = self.repo().store(&CollectionKey::Posts, posts).await;
        soft("save posts", result.map(|_| true), false)
    }

    /// Posts whose author or caption contains `query`, ignoring case.
    ///
    /// A blank query matches nothing.
    pub async fn search_posts(&self, query: &str) -> Vec<Post> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return Vec::new();
        }

        self.posts()
            .await
            .into_iter()
            .filter(|post| post.matches(&needle))
            .collect()
    }

    /// Posts authored by `username`, newest first
    pub async fn posts_by(&self, username: &str) -> Vec<Post> {
        self.posts()
            .await
            .into_iter()
            .filter(|post| post.username == username)
            .collect()
    }

    // ========================================================================
    // MUTATIONS
    // ========================================================================

    /// Publish a post at the top of the feed.
    ///
    /// Returns the stored post, or `None` if it could not be persisted.
    pub async fn add_post(&self, new_post: NewPost) -> Option<Post> {
        let _gate = self.write_gate().await;
        let result = self.try_add_post(new_post).await;
        soft("add post", result.map(Some), None)
    }

    /// Toggle the local user's like on a post.
    ///
    /// An unknown `post_id` changes nothing and still reports success.
    pub async fn like_post(&self, post_id: &str) -> bool {
        let _gate = self.write_gate().await;
        let result = self.try_like_post(post_id).await;
        soft("like post", result.map(|_| true), false)
    }

    /// Append a comment to a post.
    ///
    /// An unknown `post_id` changes nothing and still reports success.
    pub async fn add_comment(&self, post_id: &str, text: &str) -> bool {
        let _gate = self.write_gate().await;
        let result = self.try_add_comment(post_id, text).await;
        soft("add comment", result.map(|_| true), false)
    }

    async fn try_add_post(&self, new_post: NewPost) -> Result<Post> {
        let mut posts: Vec<Post> = self.repo().load_list(&CollectionKey::Posts).await?;
        let post = new_post.into_post(new_id(), self.now());
        posts.insert(0, post.clone());

        let mut batch = WriteBatch::new();
        batch.put(&CollectionKey::Posts, &posts)?;
        self.enqueue(&mut batch, Operation::AddPost, &post).await?;
        self.repo().commit(batch).await?;

        tracing::debug!("Added post {} ({} total)", post.id, posts.len());
        Ok(post)
    }

    async fn try_like_post(&self, post_id: &str) -> Result<Option<bool>> {
        let mut posts: Vec<Post> = self.repo().load_list(&CollectionKey::Posts).await?;
        let post = match posts.iter_mut().find(|p| p.id == post_id) {
            Some(post) => post,
            None => {
                tracing::debug!("like_post: no post {}", post_id);
                return Ok(None);
            }
        };
        let liked = post.toggle_like();

        let mut batch = WriteBatch::new();
        batch.put(&CollectionKey::Posts, &posts)?;
        self.enqueue(
            &mut batch,
            Operation::LikePost,
            &json!({ "postId": post_id, "liked": liked }),
        )
        .await?;
        self.repo().commit(batch).await?;

        Ok(Some(liked))
    }

    async fn try_add_comment(&self, post_id: &str, text: &str) -> Result<Option<Comment>> {
        let mut posts: Vec<Post> = self.repo().load_list(&CollectionKey::Posts).await?;
        let post = match posts.iter_mut().find(|p| p.id == post_id) {
            Some(post) => post,
            None => {
                tracing::debug!("add_comment: no post {}", post_id);
                return Ok(None);
            }
        };

        let comment = Comment {
            id: new_id(),
            text: text.to_string(),
            timestamp: self.now(),
            synced: false,
        };
        post.comments.push(comment.clone());

        let mut batch = WriteBatch::new();
        batch.put(&CollectionKey::Posts, &posts)?;
        self.enqueue(
            &mut batch,
            Operation::AddComment,
            &json!({ "postId": post_id, "comment": comment }),
        )
        .await?;
        self.repo().commit(batch).await?;

        Ok(Some(comment))
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outbox::SyncAction;

    fn new_post(caption: &str) -> NewPost {
        NewPost {
            username: "you".into(),
            avatar: "a.jpg".into(),
            image: "p.jpg".into(),
            caption: caption.into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_toggle_like_lock_step() {
        let mut post = new_post("x").into_post("1".into(), Utc::now());
        post.likes = 10;

        assert!(post.toggle_like());
        assert_eq!(post.likes, 11);
        assert!(!post.toggle_like());
        assert_eq!(post.likes, 10);
    }

    #[test]
    fn test_toggle_like_from_zero_is_reversible() {
        let mut post = new_post("x").into_post("1".into(), Utc::now());
        post.liked = true;
        post.likes = 0;

        assert!(!post.toggle_like());
        assert_eq!(post.likes, -1);
        assert!(post.toggle_like());
        assert_eq!((post.liked, post.likes), (true, 0));
    }

    #[test]
    fn test_negative_counter_decodes() {
        let post: Post = serde_json::from_str(
            r#"{"id":"9","username":"you","likes":-1,"timestamp":"2025-01-01T00:00:00Z"}"#,
        )
        .unwrap();
        assert_eq!(post.likes, -1);
    }

    #[test]
    fn test_post_missing_optional_fields() {
        let post: Post = serde_json::from_str(
            r#"{"id":"9","username":"you","timestamp":"2025-01-01T00:00:00Z"}"#,
        )
        .unwrap();
        assert_eq!(post.likes, 0);
        assert!(!post.liked);
        assert!(post.comments.is_empty());
    }

    #[tokio::test]
    async fn test_add_post_prepends_and_enqueues() {
        let store = FeedStore::in_memory();

        let first = store.add_post(new_post("first")).await.unwrap();
        let second = store.add_post(new_post("second")).await.unwrap();
        assert!(!first.synced);
        assert_ne!(first.id, second.id);

        let posts = store.posts().await;
        assert_eq!(posts.len(), 2);
        assert_eq!(posts[0].id, second.id);
        assert_eq!(posts[1].id, first.id);

        let queue = store.sync_queue().await;
        assert_eq!(queue.len(), 2);
        assert_eq!(queue[0].action, SyncAction::CreatePost);
        assert_eq!(queue[0].data["id"], first.id.as_str());
    }

    #[tokio::test]
    async fn test_like_post_enqueues_state() {
        let store = FeedStore::in_memory();
        let post = store.add_post(new_post("x")).await.unwrap();
        store.clear_sync_queue().await;

        assert!(store.like_post(&post.id).await);

        let posts = store.posts().await;
        let stored = &posts[0];
        assert!(stored.liked);
        assert_eq!(stored.likes, 1);

        let queue = store.sync_queue().await;
        assert_eq!(queue.len(), 1);
        assert_eq!(queue[0].action, SyncAction::LikePost);
        assert_eq!(queue[0].data["liked"], true);
    }

    #[tokio::test]
    async fn test_like_parity_from_liked_zero() {
        let store = FeedStore::in_memory();
        let mut post = new_post("x").into_post("p1".into(), Utc::now());
        post.liked = true;
        store.save_posts(&[post]).await;

        assert!(store.like_post("p1").await);
        assert!(store.like_post("p1").await);

        let posts = store.posts().await;
        assert_eq!((posts[0].liked, posts[0].likes), (true, 0));
    }

    #[tokio::test]
    async fn test_add_post_keeps_supplied_counters() {
        let store = FeedStore::in_memory();
        let comment = Comment {
            id: "c1".into(),
            text: "first!".into(),
            timestamp: Utc::now(),
            synced: true,
        };

        let post = store
            .add_post(NewPost {
                likes: 5,
                liked: true,
                comments: vec![comment.clone()],
                ..new_post("imported")
            })
            .await
            .unwrap();

        assert_eq!(post.likes, 5);
        assert!(post.liked);
        assert_eq!(post.comments, vec![comment]);
        assert!(!post.synced);
        assert_eq!(store.posts().await[0], post);
    }

    #[tokio::test]
    async fn test_like_unknown_post_is_noop() {
        let store = FeedStore::in_memory();
        store.add_post(new_post("x")).await.unwrap();
        store.clear_sync_queue().await;
        let before = store.posts().await;

        assert!(store.like_post("missing").await);
        assert_eq!(store.posts().await, before);
        assert!(store.sync_queue().await.is_empty());
    }

    #[tokio::test]
    async fn test_add_comment_appends() {
        let store = FeedStore::in_memory();
        let post = store.add_post(new_post("x")).await.unwrap();

        assert!(store.add_comment(&post.id, "nice").await);
        assert!(store.add_comment(&post.id, "again").await);

        let posts = store.posts().await;
        let stored = &posts[0];
        let texts: Vec<&str> = stored.comments.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, vec!["nice", "again"]);

        let queue = store.sync_queue().await;
        let last = queue.last().unwrap();
        assert_eq!(last.action, SyncAction::AddComment);
        assert_eq!(last.data["comment"]["text"], "again");
    }

    #[tokio::test]
    async fn test_add_comment_unknown_post() {
        let store = FeedStore::in_memory();
        assert!(store.add_comment("missing", "hi").await);
        assert!(store.posts().await.is_empty());
        assert!(store.sync_queue().await.is_empty());
    }

    #[tokio::test]
    async fn test_search_posts() {
        let store = FeedStore::in_memory();
        store.add_post(new_post("Beautiful Sunset")).await;
        store.add_post(new_post("Mountain vibes")).await;

        assert_eq!(store.search_posts("sunset").await.len(), 1);
        assert_eq!(store.search_posts("YOU").await.len(), 2);
        assert!(store.search_posts("   ").await.is_empty());
        assert!(store.search_posts("ocean").await.is_empty());
    }

    #[tokio::test]
    async fn test_posts_by() {
        let store = FeedStore::in_memory();
        store.add_post(new_post("mine")).await;
        store
            .add_post(NewPost {
                username: "someone".into(),
                ..new_post("theirs")
            })
            .await;

        let mine = store.posts_by("you").await;
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].caption, "mine");
    }
}
