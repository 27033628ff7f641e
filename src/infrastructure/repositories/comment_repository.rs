//! Comment Repository Implementation
//!
//! PostgreSQL implementation of the CommentRepository trait.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::domain::{Comment, CommentRepository};
use crate::shared::error::AppError;

/// Database row representation matching the comments table schema.
#[derive(Debug, sqlx::FromRow)]
struct CommentRow {
    id: i64,
    author_id: i64,
    tweet_id: Option<i64>,
    text: String,
    likes: Vec<i64>,
    reply_to: Option<i64>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl CommentRow {
    fn into_comment(self) -> Comment {
        Comment {
            id: self.id,
            author_id: self.author_id,
            tweet_id: self.tweet_id,
            text: self.text,
            likes: self.likes,
            reply_to: self.reply_to,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

const COMMENT_COLUMNS: &str =
    "id, author_id, tweet_id, text, likes, reply_to, created_at, updated_at";

/// PostgreSQL comment repository implementation.
#[derive(Clone)]
pub struct PgCommentRepository {
    pool: PgPool,
}

impl PgCommentRepository {
    /// Create a new PgCommentRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn require_comment(&self, id: i64) -> Result<Comment, AppError> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Comment with id {} not found", id)))
    }

    async fn write_likes(&self, comment_id: i64, likes: &[i64]) -> Result<Comment, AppError> {
        let row = sqlx::query_as::<_, CommentRow>(&format!(
            "UPDATE comments SET likes = $2, updated_at = NOW() WHERE id = $1 RETURNING {COMMENT_COLUMNS}"
        ))
        .bind(comment_id)
        .bind(likes)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Comment with id {} not found", comment_id)))?;

        Ok(row.into_comment())
    }
}

#[async_trait]
impl CommentRepository for PgCommentRepository {
    async fn find_by_id(&self, id: i64) -> Result<Option<Comment>, AppError> {
        let row = sqlx::query_as::<_, CommentRow>(&format!(
            "SELECT {COMMENT_COLUMNS} FROM comments WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.into_comment()))
    }

    async fn find_by_tweet(&self, tweet_id: i64) -> Result<Vec<Comment>, AppError> {
        let rows = sqlx::query_as::<_, CommentRow>(&format!(
            "SELECT {COMMENT_COLUMNS} FROM comments \
             WHERE tweet_id = $1 AND reply_to IS NULL \
             ORDER BY created_at"
        ))
        .bind(tweet_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|r| r.into_comment()).collect())
    }

    async fn find_replies(&self, comment_id: i64) -> Result<Vec<Comment>, AppError> {
        let rows = sqlx::query_as::<_, CommentRow>(&format!(
            "SELECT {COMMENT_COLUMNS} FROM comments WHERE reply_to = $1 ORDER BY created_at"
        ))
        .bind(comment_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|r| r.into_comment()).collect())
    }

    async fn create(&self, comment: &Comment) -> Result<Comment, AppError> {
        let row = sqlx::query_as::<_, CommentRow>(&format!(
            "INSERT INTO comments (id, author_id, tweet_id, text, likes, reply_to) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING {COMMENT_COLUMNS}"
        ))
        .bind(comment.id)
        .bind(comment.author_id)
        .bind(comment.tweet_id)
        .bind(&comment.text)
        .bind(&comment.likes)
        .bind(comment.reply_to)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into_comment())
    }

    async fn update_text(&self, id: i64, text: &str) -> Result<Comment, AppError> {
        let row = sqlx::query_as::<_, CommentRow>(&format!(
            "UPDATE comments SET text = $2, updated_at = NOW() WHERE id = $1 RETURNING {COMMENT_COLUMNS}"
        ))
        .bind(id)
        .bind(text)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Comment with id {} not found", id)))?;

        Ok(row.into_comment())
    }

    async fn delete(&self, id: i64) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM comments WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Comment with id {} not found", id)));
        }

        Ok(())
    }

    async fn add_like(&self, comment_id: i64, user_id: i64) -> Result<Comment, AppError> {
        let comment = self.require_comment(comment_id).await?;

        let mut likes = comment.likes;
        if !likes.contains(&user_id) {
            likes.push(user_id);
        }

        self.write_likes(comment_id, &likes).await
    }

    async fn remove_like(&self, comment_id: i64, user_id: i64) -> Result<Comment, AppError> {
        let comment = self.require_comment(comment_id).await?;

        let mut likes = comment.likes;
        likes.retain(|id| *id != user_id);

        self.write_likes(comment_id, &likes).await
    }

    async fn count_for_tweet(&self, tweet_id: i64) -> Result<i64, AppError> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM comments WHERE tweet_id = $1 AND reply_to IS NULL",
        )
        .bind(tweet_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    async fn count_replies(&self, comment_id: i64) -> Result<i64, AppError> {
        let count =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM comments WHERE reply_to = $1")
                .bind(comment_id)
                .fetch_one(&self.pool)
                .await?;

        Ok(count)
    }
}
