//! # Messaging Module
//!
//! Direct-message conversations stored on the device.
//!
//! ## Layout
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      CONVERSATION STORAGE                               │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  @conversations                                                        │
//! │  ┌─────────────────────────────────────────────────────────────┐       │
//! │  │ { id: "1", name, avatar,                                    │       │
//! │  │   lastMessage: "hi",          ◄── mirror of newest message  │       │
//! │  │   lastMessageTime: ...,                                      │       │
//! │  │   unread: 0 }                                                │       │
//! │  └─────────────────────────────────────────────────────────────┘       │
//! │                                                                         │
//! │  @messages_1   (oldest first)                                          │
//! │  ┌─────────────────────────────────────────────────────────────┐       │
//! │  │ { id, text: "Hey! How are you?", isMine: false, ... }       │       │
//! │  │ { id, text: "hi", isMine: true, status: "sent", ... }       │       │
//! │  └─────────────────────────────────────────────────────────────┘       │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! `send_message` writes the message list, the conversation summary and the
//! outbox entry in one batch, so the mirror cannot fall behind the messages
//! on backends with atomic batches.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::Result;
use crate::outbox::Operation;
use crate::storage::{CollectionKey, WriteBatch};
use crate::store::{new_id, soft, FeedStore};

/// Delivery status of a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageStatus {
    /// Written locally
    Sent,
    /// Seen by the recipient
    Read,
}

impl MessageStatus {
    /// Get string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageStatus::Sent => "sent",
            MessageStatus::Read => "read",
        }
    }
}

/// A message in a conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    /// Message ID
    pub id: String,
    /// Message text
    pub text: String,
    /// When it was sent
    pub timestamp: DateTime<Utc>,
    /// Whether the local user sent it
    pub is_mine: bool,
    /// Delivery status
    pub status: MessageStatus,
    /// Whether a backend has acknowledged it
    #[serde(default)]
    pub synced: bool,
}

impl Message {
    /// Create a new outgoing message
    pub fn outgoing(text: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            id: new_id(),
            text: text.into(),
            timestamp: now,
            is_mine: true,
            status: MessageStatus::Sent,
            synced: false,
        }
    }
}

/// Summary row of a conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    /// Conversation ID
    pub id: String,
    /// Other participant's display name
    pub name: String,
    /// Other participant's avatar URI
    #[serde(default)]
    pub avatar: String,
    /// Text of the newest message
    #[serde(default)]
    pub last_message: String,
    /// Time of the newest message
    #[serde(default)]
    pub last_message_time: Option<DateTime<Utc>>,
    /// Messages not yet seen
    #[serde(default)]
    pub unread: u32,
}

impl Conversation {
    /// Point the summary at `message`
    pub fn record_message(&mut self, message: &Message) {
        self.last_message = message.text.clone();
        self.last_message_time = Some(message.timestamp);
    }
}

impl FeedStore {
    // ========================================================================
    // ACCESSORS
    // ========================================================================

    /// All conversation summaries
    pub async fn conversations(&self) -> Vec<Conversation> {
        soft(
            "get conversations",
            self.repo().load_list(&CollectionKey::Conversations).await,
            Vec::new(),
        )
    }

    /// Overwrite the conversations collection
    pub async fn save_conversations(&self, conversations: &[Conversation]) -> bool {
        let _gate = self.write_gate().await;
        let result = self
            .repo()
            .store(&CollectionKey::Conversations, conversations)
            .await;
        soft("save conversations", result.map(|_| true), false)
    }

    /// A single conversation summary
    pub async fn conversation(&self, conversation_id: &str) -> Option<Conversation> {
        self.conversations()
            .await
            .into_iter()
            .find(|c| c.id == conversation_id)
    }

    /// Messages of a conversation, oldest first
    pub async fn messages(&self, conversation_id: &str) -> Vec<Message> {
        soft(
            "get messages",
            self.repo()
                .load_list(&CollectionKey::Messages(conversation_id.to_string()))
                .await,
            Vec::new(),
        )
    }

    /// Overwrite the messages of a conversation
    pub async fn save_messages(&self, conversation_id: &str, messages: &[Message]) -> bool {
        let _gate = self.write_gate().await;
        let result = self
            .repo()
            .store(&CollectionKey::Messages(conversation_id.to_string()), messages)
            .await;
        soft("save messages", result.map(|_| true), false)
    }

    // ========================================================================
    // MUTATIONS
    // ========================================================================

    /// Append an outgoing message and refresh the conversation summary.
    ///
    /// The message is stored even if no summary exists for
    /// `conversation_id`.
    pub async fn send_message(&self, conversation_id: &str, text: &str) -> Option<Message> {
        let _gate = self.write_gate().await;
        let result = self.try_send_message(conversation_id, text).await;
        soft("send message", result.map(Some), None)
    }

    /// Reset a conversation's unread counter.
    ///
    /// An unknown `conversation_id` changes nothing and still reports success.
    pub async fn mark_conversation_read(&self, conversation_id: &str) -> bool {
        let _gate = self.write_gate().await;
        let result = self.try_mark_conversation_read(conversation_id).await;
        soft("mark conversation read", result.map(|_| true), false)
    }

    async fn try_send_message(&self, conversation_id: &str, text: &str) -> Result<Message> {
        let messages_key = CollectionKey::Messages(conversation_id.to_string());
        let mut messages: Vec<Message> = self.repo().load_list(&messages_key).await?;
        let message = Message::outgoing(text, self.now());
        messages.push(message.clone());

        let mut batch = WriteBatch::new();
        batch.put(&messages_key, &messages)?;

        let mut conversations: Vec<Conversation> =
            self.repo().load_list(&CollectionKey::Conversations).await?;
        let summary = conversations.iter_mut().find(|c| c.id == conversation_id);
        let mirrored = match summary {
            Some(conversation) => {
                conversation.record_message(&message);
                true
            }
            None => false,
        };
        if mirrored {
            batch.put(&CollectionKey::Conversations, &conversations)?;
        } else {
            tracing::debug!("send_message: no summary for conversation {}", conversation_id);
        }

        self.enqueue(
            &mut batch,
            Operation::SendMessage,
            &json!({ "conversationId": conversation_id, "message": message }),
        )
        .await?;
        self.repo().commit(batch).await?;

        tracing::debug!(
            "Sent message {} in conversation {} ({} messages)",
            message.id,
            conversation_id,
            messages.len()
        );
        Ok(message)
    }

    async fn try_mark_conversation_read(&self, conversation_id: &str) -> Result<bool> {
        let mut conversations: Vec<Conversation> =
            self.repo().load_list(&CollectionKey::Conversations).await?;
        let conversation = match conversations.iter_mut().find(|c| c.id == conversation_id) {
            Some(conversation) => conversation,
            None => return Ok(false),
        };
        conversation.unread = 0;

        let mut batch = WriteBatch::new();
        batch.put(&CollectionKey::Conversations, &conversations)?;
        self.enqueue(
            &mut batch,
            Operation::MarkConversationRead,
            &json!({ "conversationId": conversation_id }),
        )
        .await?;
        self.repo().commit(batch).await?;

        Ok(true)
    }
}

// ============================================================================
// TESTS
// ============================================================================
