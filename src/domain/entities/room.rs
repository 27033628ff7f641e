//! Chat room entity and repository trait.
//!
//! Maps to the `rooms` table. Subscriber and online lists are stored as
//! id arrays; mutations are last-write-wins with no optimistic guard.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::shared::error::AppError;

/// A chat room.
///
/// Maps to the `rooms` table:
/// - id: BIGINT PRIMARY KEY (Snowflake ID)
/// - name: VARCHAR(100) NOT NULL
/// - creator_id: BIGINT NULL (NULL means a public room)
/// - subscribers: BIGINT[] NOT NULL DEFAULT '{}'
/// - online: BIGINT[] NOT NULL DEFAULT '{}'
/// - created_at: TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// - updated_at: TIMESTAMPTZ NOT NULL DEFAULT NOW()
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Room {
    /// Snowflake ID (primary key)
    pub id: i64,

    /// Room name
    pub name: String,

    /// Creator id; a room without a creator is public
    pub creator_id: Option<i64>,

    /// Ids of users subscribed to the room
    pub subscribers: Vec<i64>,

    /// Ids of users currently present in the room
    pub online: Vec<i64>,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl Room {
    /// A room with no creator is public.
    pub fn is_public(&self) -> bool {
        self.creator_id.is_none()
    }

    /// Whether the given user created this room.
    pub fn is_creator(&self, user_id: i64) -> bool {
        self.creator_id == Some(user_id)
    }

    /// Whether the given user is subscribed.
    pub fn is_subscriber(&self, user_id: i64) -> bool {
        self.subscribers.contains(&user_id)
    }

    /// Whether the given user is in the online list.
    pub fn is_online(&self, user_id: i64) -> bool {
        self.online.contains(&user_id)
    }
}

/// Repository trait for Room data access operations.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RoomRepository: Send + Sync {
    /// Find a room by its Snowflake ID.
    async fn find_by_id(&self, id: i64) -> Result<Option<Room>, AppError>;

    /// Rooms visible to a user: public rooms plus private rooms the user
    /// is subscribed to.
    async fn find_visible_to(&self, user_id: i64) -> Result<Vec<Room>, AppError>;

    /// Create a new room.
    async fn create(&self, room: &Room) -> Result<Room, AppError>;

    /// Delete a room (messages cascade).
    async fn delete(&self, id: i64) -> Result<(), AppError>;

    /// Add a user to the subscriber list (no-op if present). Returns the
    /// updated room.
    async fn add_subscriber(&self, room_id: i64, user_id: i64) -> Result<Room, AppError>;

    /// Remove a user from the subscriber list (no-op if absent). Returns the
    /// updated room.
    async fn remove_subscriber(&self, room_id: i64, user_id: i64) -> Result<Room, AppError>;

    /// Add a user to the online list (no-op if present). Returns the
    /// updated room.
    async fn add_online(&self, room_id: i64, user_id: i64) -> Result<Room, AppError>;

    /// Remove a user from the online list (no-op if absent). Returns the
    /// updated room.
    async fn remove_online(&self, room_id: i64, user_id: i64) -> Result<Room, AppError>;
}
