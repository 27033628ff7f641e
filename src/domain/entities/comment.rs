//! Comment entity and repository trait.
//!
//! Maps to the `comments` table. A comment either belongs to a tweet or
//! replies to another comment (threaded).

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::shared::error::AppError;

/// A comment on a tweet, or a threaded reply to another comment.
///
/// Maps to the `comments` table:
/// - id: BIGINT PRIMARY KEY (Snowflake ID)
/// - author_id: BIGINT NOT NULL REFERENCES users(id)
/// - tweet_id: BIGINT NULL REFERENCES tweets(id) ON DELETE CASCADE
/// - text: VARCHAR(280) NOT NULL
/// - likes: BIGINT[] NOT NULL DEFAULT '{}'
/// - reply_to: BIGINT NULL REFERENCES comments(id)
/// - created_at: TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// - updated_at: TIMESTAMPTZ NOT NULL DEFAULT NOW()
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    /// Snowflake ID (primary key)
    pub id: i64,

    /// Author of the comment
    pub author_id: i64,

    /// Tweet this comment belongs to (None for a bare reply)
    pub tweet_id: Option<i64>,

    /// Comment text
    pub text: String,

    /// Ids of users who liked the comment
    pub likes: Vec<i64>,

    /// Parent comment when this is a threaded reply
    pub reply_to: Option<i64>,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl Comment {
    /// Whether the given user wrote this comment.
    pub fn is_author(&self, user_id: i64) -> bool {
        self.author_id == user_id
    }

    /// Whether the given user has liked this comment.
    pub fn is_liked_by(&self, user_id: i64) -> bool {
        self.likes.contains(&user_id)
    }

    /// Whether this comment is a reply to another comment.
    pub fn is_reply(&self) -> bool {
        self.reply_to.is_some()
    }
}

/// Repository trait for Comment data access operations.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CommentRepository: Send + Sync {
    /// Find a comment by its Snowflake ID.
    async fn find_by_id(&self, id: i64) -> Result<Option<Comment>, AppError>;

    /// Top-level comments of a tweet, oldest first.
    async fn find_by_tweet(&self, tweet_id: i64) -> Result<Vec<Comment>, AppError>;

    /// Replies to a comment, oldest first.
    async fn find_replies(&self, comment_id: i64) -> Result<Vec<Comment>, AppError>;

    /// Persist a new comment.
    async fn create(&self, comment: &Comment) -> Result<Comment, AppError>;

    /// Replace a comment's text.
    async fn update_text(&self, id: i64, text: &str) -> Result<Comment, AppError>;

    /// Delete a comment.
    async fn delete(&self, id: i64) -> Result<(), AppError>;

    /// Add a user to the like list (no-op if present).
    async fn add_like(&self, comment_id: i64, user_id: i64) -> Result<Comment, AppError>;

    /// Remove a user from the like list (no-op if absent).
    async fn remove_like(&self, comment_id: i64, user_id: i64) -> Result<Comment, AppError>;

    /// Number of top-level comments on a tweet.
    async fn count_for_tweet(&self, tweet_id: i64) -> Result<i64, AppError>;

    /// Number of replies to a comment.
    async fn count_replies(&self, comment_id: i64) -> Result<i64, AppError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_comment_reply_and_likes() {
        let now = Utc::now();
        let comment = Comment {
            id: 1,
            author_id: 5,
            tweet_id: Some(2),
            text: "nice".into(),
            likes: vec![7],
            reply_to: None,
            created_at: now,
            updated_at: now,
        };
        assert!(comment.is_author(5));
        assert!(comment.is_liked_by(7));
        assert!(!comment.is_reply());
    }
}
