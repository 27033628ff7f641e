//! Room Repository Implementation
//!
//! PostgreSQL implementation of the RoomRepository trait. Subscriber and
//! presence lists are BIGINT[] columns updated read-modify-write; the last
//! writer wins, matching the store's lack of optimistic concurrency.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::domain::{Room, RoomRepository};
use crate::shared::error::AppError;

/// Database row representation matching the rooms table schema.
#[derive(Debug, sqlx::FromRow)]
struct RoomRow {
    id: i64,
    name: String,
    creator_id: Option<i64>,
    subscribers: Vec<i64>,
    online: Vec<i64>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl RoomRow {
    fn into_room(self) -> Room {
        Room {
            id: self.id,
            name: self.name,
            creator_id: self.creator_id,
            subscribers: self.subscribers,
            online: self.online,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

const ROOM_COLUMNS: &str = "id, name, creator_id, subscribers, online, created_at, updated_at";

/// PostgreSQL room repository implementation.
#[derive(Clone)]
pub struct PgRoomRepository {
    pool: PgPool,
}

impl PgRoomRepository {
    /// Create a new PgRoomRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn require_room(&self, id: i64) -> Result<Room, AppError> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Room with id {} not found", id)))
    }

    async fn write_subscribers(&self, room_id: i64, subscribers: &[i64]) -> Result<Room, AppError> {
        let row = sqlx::query_as::<_, RoomRow>(&format!(
            "UPDATE rooms SET subscribers = $2, updated_at = NOW() WHERE id = $1 RETURNING {ROOM_COLUMNS}"
        ))
        .bind(room_id)
        .bind(subscribers)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Room with id {} not found", room_id)))?;

        Ok(row.into_room())
    }

    async fn write_online(&self, room_id: i64, online: &[i64]) -> Result<Room, AppError> {
        let row = sqlx::query_as::<_, RoomRow>(&format!(
            "UPDATE rooms SET online = $2, updated_at = NOW() WHERE id = $1 RETURNING {ROOM_COLUMNS}"
        ))
        .bind(room_id)
        .bind(online)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Room with id {} not found", room_id)))?;

        Ok(row.into_room())
    }
}

#[async_trait]
impl RoomRepository for PgRoomRepository {
    async fn find_by_id(&self, id: i64) -> Result<Option<Room>, AppError> {
        let row = sqlx::query_as::<_, RoomRow>(&format!(
            "SELECT {ROOM_COLUMNS} FROM rooms WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.into_room()))
    }

    async fn find_visible_to(&self, user_id: i64) -> Result<Vec<Room>, AppError> {
        let rows = sqlx::query_as::<_, RoomRow>(&format!(
            "SELECT {ROOM_COLUMNS} FROM rooms \
             WHERE creator_id IS NULL OR $1 = ANY(subscribers) \
             ORDER BY created_at"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|r| r.into_room()).collect())
    }

    async fn create(&self, room: &Room) -> Result<Room, AppError> {
        let row = sqlx::query_as::<_, RoomRow>(&format!(
            "INSERT INTO rooms (id, name, creator_id, subscribers, online) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {ROOM_COLUMNS}"
        ))
        .bind(room.id)
        .bind(&room.name)
        .bind(room.creator_id)
        .bind(&room.subscribers)
        .bind(&room.online)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into_room())
    }

    async fn delete(&self, id: i64) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM rooms WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Room with id {} not found", id)));
        }

        Ok(())
    }

    async fn add_subscriber(&self, room_id: i64, user_id: i64) -> Result<Room, AppError> {
        let room = self.require_room(room_id).await?;

        let mut subscribers = room.subscribers;
        if !subscribers.contains(&user_id) {
            subscribers.push(user_id);
        }

        self.write_subscribers(room_id, &subscribers).await
    }

    async fn remove_subscriber(&self, room_id: i64, user_id: i64) -> Result<Room, AppError> {
        let room = self.require_room(room_id).await?;

        let mut subscribers = room.subscribers;
        subscribers.retain(|id| *id != user_id);

        self.write_subscribers(room_id, &subscribers).await
    }

    async fn add_online(&self, room_id: i64, user_id: i64) -> Result<Room, AppError> {
        let room = self.require_room(room_id).await?;

        let mut online = room.online;
        if !online.contains(&user_id) {
            online.push(user_id);
        }

        self.write_online(room_id, &online).await
    }

    async fn remove_online(&self, room_id: i64, user_id: i64) -> Result<Room, AppError> {
        let room = self.require_room(room_id).await?;

        let mut online = room.online;
        online.retain(|id| *id != user_id);

        self.write_online(room_id, &online).await
    }
}
