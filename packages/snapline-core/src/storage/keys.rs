use std::fmt;

/// Prefix for per-conversation message collections
const MESSAGES_PREFIX: &str = "@messages_";

/// Every collection the store knows about.
///
/// Using this instead of raw strings keeps key typos out of the mutation
/// code; [`CollectionKey::as_key`] is the only place key strings are built.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CollectionKey {
    /// The device's own user (singleton)
    User,
    /// Feed posts, newest first
    Posts,
    /// Stories, newest first
    Stories,
    /// Conversation summaries
    Conversations,
    /// Messages of one conversation, oldest first
    Messages(String),
    /// Notifications, newest first
    Notifications,
    /// Recent search queries, newest first
    SearchHistory,
    /// Outbox of actions awaiting a backend
    SyncQueue,
}

impl CollectionKey {
    /// The storage key string
    pub fn as_key(&self) -> String {
        match self {
            CollectionKey::User => "@user".to_string(),
            CollectionKey::Posts => "@posts".to_string(),
            CollectionKey::Stories => "@stories".to_string(),
            CollectionKey::Conversations => "@conversations".to_string(),
            CollectionKey::Messages(conversation_id) => {
                format!("{}{}", MESSAGES_PREFIX, conversation_id)
            }
            CollectionKey::Notifications => "@notifications".to_string(),
            CollectionKey::SearchHistory => "@search_history".to_string(),
            CollectionKey::SyncQueue => "@sync_queue".to_string(),
        }
    }
}

impl fmt::Display for CollectionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_key())
    }
}
