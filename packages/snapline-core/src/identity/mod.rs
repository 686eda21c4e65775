//! # Identity
//!
//! The single local user of the device. There is no account system; the
//! user record exists so that posts and stories can be attributed and the
//! profile screen has something to edit.

use serde::{Deserialize, Serialize};

use crate::config::StoreConfig;
use crate::error::{Error, Result};
use crate::outbox::Operation;
use crate::storage::{CollectionKey, WriteBatch};
use crate::store::{soft, FeedStore};

/// The device's user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// User ID
    pub id: String,
    /// Handle shown on posts and stories
    pub username: String,
    /// Free-form profile text
    #[serde(default)]
    pub bio: String,
    /// Avatar image URI
    #[serde(default)]
    pub avatar: String,
}

/// Trim and check a profile edit against the configured limits.
///
/// Returns the trimmed `(username, bio)`.
pub fn validate_profile(username: &str, bio: &str, config: &StoreConfig) -> Result<(String, String)> {
    let username = username.trim();
    let bio = bio.trim();

    if username.is_empty() {
        return Err(Error::InvalidProfile("Username cannot be empty".into()));
    }
    if username.chars().count() > config.max_username_length {
        return Err(Error::InvalidProfile(format!(
            "Username too long: max {} characters",
            config.max_username_length
        )));
    }
    if bio.chars().count() > config.max_bio_length {
        return Err(Error::InvalidProfile(format!(
            "Bio too long: max {} characters",
            config.max_bio_length
        )));
    }

    Ok((username.to_string(), bio.to_string()))
}

impl FeedStore {
    /// The stored user, if any
    pub async fn user(&self) -> Option<User> {
        soft("get user", self.repo().load(&CollectionKey::User).await, None)
    }

    /// Overwrite the stored user
    pub async fn save_user(&self, user: &User) -> bool {
        let _gate = self.write_gate().await;
        let result = self.repo().store(&CollectionKey::User, user).await;
        soft("save user", result.map(|_| true), false)
    }

    /// Change username and bio, keeping id and avatar.
    ///
    /// Both fields are trimmed; an empty username is rejected.
    pub async fn update_profile(&self, username: &str, bio: &str) -> Option<User> {
        let _gate = self.write_gate().await;
        let result = self.try_update_profile(username, bio).await;
        soft("update profile", result.map(Some), None)
    }

    async fn try_update_profile(&self, username: &str, bio: &str) -> Result<User> {
        let (username, bio) = validate_profile(username, bio, self.config())?;

        let mut user: User = self
            .repo()
            .load(&CollectionKey::User)
            .await?
            .ok_or(Error::NoUser)?;
        user.username = username;
        user.bio = bio;

        let mut batch = WriteBatch::new();
        batch.put(&CollectionKey::User, &user)?;
        self.enqueue(&mut batch, Operation::UpdateProfile, &user).await?;
        self.repo().commit(batch).await?;
        tracing::info!("Updated profile for user {}", user.id);
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_user() -> User {
        User {
            id: "1".into(),
            username: "you".into(),
            bio: "hello".into(),
            avatar: "https://example.com/a.jpg".into(),
        }
    }

    #[test]
    fn test_validate_profile_trims() {
        let config = StoreConfig::default();
        let (name, bio) = validate_profile("  alice ", " bio  ", &config).unwrap();
        assert_eq!(name, "alice");
        assert_eq!(bio, "bio");
    }

    #[test]
    fn test_validate_profile_rejects_empty_name() {
        let config = StoreConfig::default();
        let err = validate_profile("   ", "bio", &config).unwrap_err();
        assert_eq!(err.code(), 201);
    }

    #[test]
    fn test_validate_profile_rejects_long_bio() {
        let config = StoreConfig::default();
        let bio = "x".repeat(config.max_bio_length + 1);
        assert!(validate_profile("alice", &bio, &config).is_err());
    }

    #[test]
    fn test_user_json_shape() {
        let json = serde_json::to_value(sample_user()).unwrap();
        assert_eq!(json["username"], "you");
        assert_eq!(json["avatar"], "https://example.com/a.jpg");
    }

    #[tokio::test]
    async fn test_user_roundtrip() {
        let store = FeedStore::in_memory();
        assert!(store.user().await.is_none());

        assert!(store.save_user(&sample_user()).await);
        assert_eq!(store.user().await, Some(sample_user()));
    }

    #[tokio::test]
    async fn test_update_profile() {
        let store = FeedStore::in_memory();
        store.save_user(&sample_user()).await;

        let updated = store.update_profile(" alice ", " new bio ").await.unwrap();
        assert_eq!(updated.username, "alice");
        assert_eq!(updated.bio, "new bio");
        assert_eq!(updated.avatar, sample_user().avatar);
        assert_eq!(store.user().await, Some(updated));
    }

    #[tokio::test]
    async fn test_update_profile_without_user() {
        let store = FeedStore::in_memory();
        assert!(store.update_profile("alice", "").await.is_none());
        assert!(store.user().await.is_none());
    }

    #[tokio::test]
    async fn test_update_profile_rejects_blank_username() {
        let store = FeedStore::in_memory();
        store.save_user(&sample_user()).await;

        assert!(store.update_profile("  ", "bio").await.is_none());
        assert_eq!(store.user().await.unwrap().username, "you");
    }
}
