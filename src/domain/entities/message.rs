//! Chat message entity and repository trait.
//!
//! Maps to the `messages` table. A message is a child of its room by
//! reference; history queries filter on `room_id`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::shared::error::AppError;

/// A message sent in a chat room.
///
/// Maps to the `messages` table:
/// - id: BIGINT PRIMARY KEY (Snowflake ID)
/// - room_id: BIGINT NOT NULL REFERENCES rooms(id) ON DELETE CASCADE
/// - author_id: BIGINT NOT NULL
/// - body: TEXT NOT NULL
/// - edited_at: TIMESTAMPTZ NULL
/// - created_at: TIMESTAMPTZ NOT NULL DEFAULT NOW()
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Snowflake ID (primary key)
    pub id: i64,

    /// Room the message belongs to
    pub room_id: i64,

    /// Author of the message
    pub author_id: i64,

    /// Message text
    pub body: String,

    /// Set when the message has been edited
    pub edited_at: Option<DateTime<Utc>>,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl ChatMessage {
    /// Whether the given user wrote this message.
    pub fn is_author(&self, user_id: i64) -> bool {
        self.author_id == user_id
    }
}

/// Repository trait for chat message data access operations.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MessageRepository: Send + Sync {
    /// Find a message by its Snowflake ID.
    async fn find_by_id(&self, id: i64) -> Result<Option<ChatMessage>, AppError>;

    /// Messages of a room, oldest first.
    async fn find_by_room(&self, room_id: i64, limit: i64) -> Result<Vec<ChatMessage>, AppError>;

    /// Persist a new message.
    async fn create(&self, message: &ChatMessage) -> Result<ChatMessage, AppError>;

    /// Replace a message's body, stamping edited_at.
    async fn update_body(&self, id: i64, body: &str) -> Result<ChatMessage, AppError>;

    /// Delete a message.
    async fn delete(&self, id: i64) -> Result<(), AppError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_author() {
        let message = ChatMessage {
            id: 1,
            room_id: 2,
            author_id: 3,
            body: "hello".into(),
            edited_at: None,
            created_at: Utc::now(),
        };
        assert!(message.is_author(3));
        assert!(!message.is_author(4));
    }
}
