//! Message Repository Implementation
//!
//! PostgreSQL implementation of the MessageRepository trait for chat
//! messages.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::domain::{ChatMessage, MessageRepository};
use crate::shared::error::AppError;

/// Database row representation matching the messages table schema.
#[derive(Debug, sqlx::FromRow)]
struct MessageRow {
    id: i64,
    room_id: i64,
    author_id: i64,
    body: String,
    edited_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl MessageRow {
    fn into_message(self) -> ChatMessage {
        ChatMessage {
            id: self.id,
            room_id: self.room_id,
            author_id: self.author_id,
            body: self.body,
            edited_at: self.edited_at,
            created_at: self.created_at,
        }
    }
}

/// PostgreSQL message repository implementation.
#[derive(Clone)]
pub struct PgMessageRepository {
    pool: PgPool,
}

impl PgMessageRepository {
    /// Create a new PgMessageRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MessageRepository for PgMessageRepository {
    async fn find_by_id(&self, id: i64) -> Result<Option<ChatMessage>, AppError> {
        let row = sqlx::query_as::<_, MessageRow>(
            r#"
            SELECT id, room_id, author_id, body, edited_at, created_at
            FROM messages
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.into_message()))
    }

    async fn find_by_room(&self, room_id: i64, limit: i64) -> Result<Vec<ChatMessage>, AppError> {
        let rows = sqlx::query_as::<_, MessageRow>(
            r#"
            SELECT id, room_id, author_id, body, edited_at, created_at
            FROM messages
            WHERE room_id = $1
            ORDER BY created_at
            LIMIT $2
            "#,
        )
        .bind(room_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|r| r.into_message()).collect())
    }

    async fn create(&self, message: &ChatMessage) -> Result<ChatMessage, AppError> {
        let row = sqlx::query_as::<_, MessageRow>(
            r#"
            INSERT INTO messages (id, room_id, author_id, body)
            VALUES ($1, $2, $3, $4)
            RETURNING id, room_id, author_id, body, edited_at, created_at
            "#,
        )
        .bind(message.id)
        .bind(message.room_id)
        .bind(message.author_id)
        .bind(&message.body)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into_message())
    }

    async fn update_body(&self, id: i64, body: &str) -> Result<ChatMessage, AppError> {
        let row = sqlx::query_as::<_, MessageRow>(
            r#"
            UPDATE messages
            SET body = $2, edited_at = NOW()
            WHERE id = $1
            RETURNING id, room_id, author_id, body, edited_at, created_at
            "#,
        )
        .bind(id)
        .bind(body)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Message with id {} not found", id)))?;

        Ok(row.into_message())
    }

    async fn delete(&self, id: i64) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM messages WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Message with id {} not found", id)));
        }

        Ok(())
    }
}
