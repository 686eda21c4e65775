//! # Stories
//!
//! Short-lived image posts. A story is visible until it is older than the
//! configured TTL (24 hours by default).
//!
//! ## Expiry
//!
//! ```text
//!   stored @stories            read via stories()
//!  ┌────────────────┐         ┌────────────────┐
//!  │ s3  (1h old)   │  ────►  │ s3             │
//!  │ s2  (5h old)   │         │ s2             │
//!  │ s1  (26h old)  │  ✗      └────────────────┘
//!  └────────────────┘                 │
//!                                     ▼
//!                     evicted something? ──► write [s3, s2] back
//! ```
//!
//! Reading stories can therefore write, so it takes the writer gate like a
//! mutation does.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::{Error, Result};
use crate::identity::User;
use crate::outbox::Operation;
use crate::storage::{CollectionKey, WriteBatch};
use crate::store::{new_id, soft, FeedStore};

/// A story
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Story {
    /// Story ID
    pub id: String,
    /// Author's user ID
    pub user_id: String,
    /// Author handle
    pub username: String,
    /// Author avatar URI
    #[serde(default)]
    pub avatar: String,
    /// Image URI
    pub image: String,
    /// When it was published
    pub timestamp: DateTime<Utc>,
    /// Whether the local user has seen it
    #[serde(default)]
    pub viewed: bool,
    /// Whether a backend has acknowledged it
    #[serde(default)]
    pub synced: bool,
}

impl Story {
    /// Build a story authored by `user`
    pub fn from_user(user: &User, image: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            id: new_id(),
            user_id: user.id.clone(),
            username: user.username.clone(),
            avatar: user.avatar.clone(),
            image: image.into(),
            timestamp: now,
            viewed: false,
            synced: false,
        }
    }

    /// Whether the story has outlived `ttl` at `now`
    pub fn is_expired(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        now.signed_duration_since(self.timestamp) >= ttl
    }
}

impl FeedStore {
    // ========================================================================
    // ACCESSORS
    // ========================================================================

    /// Stories that have not expired, newest first.
    ///
    /// Expired stories are removed from storage as a side effect.
    pub async fn stories(&self) -> Vec<Story> {
        let _gate = self.write_gate().await;
        soft("get stories", self.active_stories().await, Vec::new())
    }

    /// Overwrite the stories collection
    pub async fn save_stories(&self, stories: &[Story]) -> bool {
        let _gate = self.write_gate().await;
        let result = self.repo().store(&CollectionKey::Stories, stories).await;
        soft("save stories", result.map(|_| true), false)
    }

    // ========================================================================
    // MUTATIONS
    // ========================================================================

    /// Publish a story from the stored user.
    ///
    /// Returns `None` if there is no user on the device or the write failed.
    pub async fn add_story(&self, image: &str) -> Option<Story> {
        let _gate = self.write_gate().await;
        let result = self.try_add_story(image).await;
        soft("add story", result.map(Some), None)
    }

    /// Mark a story as seen.
    ///
    /// An unknown `story_id` changes nothing and still reports success.
    pub async fn mark_story_viewed(&self, story_id: &str) -> bool {
        let _gate = self.write_gate().await;
        let result = self.try_mark_story_viewed(story_id).await;
        soft("mark story viewed", result.map(|_| true), false)
    }

    /// Load stories, dropping and persisting away expired ones.
    ///
    /// Caller must hold the writer gate.
    pub(crate) async fn active_stories(&self) -> Result<Vec<Story>> {
        let stored: Vec<Story> = self.repo().load_list(&CollectionKey::Stories).await?;
        let total = stored.len();
        let now = self.now();
        let ttl = self.config().story_ttl;

        let active: Vec<Story> = stored
            .into_iter()
            .filter(|story| !story.is_expired(now, ttl))
            .collect();

        if active.len() != total {
            tracing::debug!("Evicting {} expired stories", total - active.len());
            self.repo().store(&CollectionKey::Stories, &active).await?;
        }

        Ok(active)
    }

    async fn try_add_story(&self, image: &str) -> Result<Story> {
        let user: User = self
            .repo()
            .load(&CollectionKey::User)
            .await?
            .ok_or(Error::NoUser)?;

        let mut stories = self.active_stories().await?;
        let story = Story::from_user(&user, image, self.now());
        stories.insert(0, story.clone());

        let mut batch = WriteBatch::new();
        batch.put(&CollectionKey::Stories, &stories)?;
        self.enqueue(&mut batch, Operation::AddStory, &story).await?;
        self.repo().commit(batch).await?;

        tracing::debug!("Added story {}", story.id);
        Ok(story)
    }

    async fn try_mark_story_viewed(&self, story_id: &str) -> Result<bool> {
        let mut stories = self.active_stories().await?;
        let story = match stories.iter_mut().find(|s| s.id == story_id) {
            Some(story) => story,
            None => return Ok(false),
        };
        story.viewed = true;

        let mut batch = WriteBatch::new();
        batch.put(&CollectionKey::Stories, &stories)?;
        self.enqueue(
            &mut batch,
            Operation::MarkStoryViewed,
            &json!({ "storyId": story_id }),
        )
        .await?;
        self.repo().commit(batch).await?;

        Ok(true)
    }
}

// ============================================================================
// TESTS
// ============================================================================
