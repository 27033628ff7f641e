//! Tweet Repository Implementation
//!
//! PostgreSQL implementation of the TweetRepository trait. Like lists are
//! BIGINT[] columns updated read-modify-write; retweet and viewer-flag
//! queries are issued per tweet at read time.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::domain::{Tweet, TweetRepository};
use crate::shared::error::AppError;

/// Database row representation matching the tweets table schema.
#[derive(Debug, sqlx::FromRow)]
struct TweetRow {
    id: i64,
    author_id: i64,
    text: String,
    likes: Vec<i64>,
    retweet_of: Option<i64>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TweetRow {
    fn into_tweet(self) -> Tweet {
        Tweet {
            id: self.id,
            author_id: self.author_id,
            text: self.text,
            likes: self.likes,
            retweet_of: self.retweet_of,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

const TWEET_COLUMNS: &str = "id, author_id, text, likes, retweet_of, created_at, updated_at";

/// PostgreSQL tweet repository implementation.
#[derive(Clone)]
pub struct PgTweetRepository {
    pool: PgPool,
}

impl PgTweetRepository {
    /// Create a new PgTweetRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn require_tweet(&self, id: i64) -> Result<Tweet, AppError> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Tweet with id {} not found", id)))
    }

    async fn write_likes(&self, tweet_id: i64, likes: &[i64]) -> Result<Tweet, AppError> {
        let row = sqlx::query_as::<_, TweetRow>(&format!(
            "UPDATE tweets SET likes = $2, updated_at = NOW() WHERE id = $1 RETURNING {TWEET_COLUMNS}"
        ))
        .bind(tweet_id)
        .bind(likes)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Tweet with id {} not found", tweet_id)))?;

        Ok(row.into_tweet())
    }
}

#[async_trait]
impl TweetRepository for PgTweetRepository {
    async fn find_by_id(&self, id: i64) -> Result<Option<Tweet>, AppError> {
        let row = sqlx::query_as::<_, TweetRow>(&format!(
            "SELECT {TWEET_COLUMNS} FROM tweets WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.into_tweet()))
    }

    async fn find_latest(&self, limit: i64) -> Result<Vec<Tweet>, AppError> {
        let rows = sqlx::query_as::<_, TweetRow>(&format!(
            "SELECT {TWEET_COLUMNS} FROM tweets ORDER BY created_at DESC LIMIT $1"
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|r| r.into_tweet()).collect())
    }

    async fn find_by_author(&self, author_id: i64, limit: i64) -> Result<Vec<Tweet>, AppError> {
        let rows = sqlx::query_as::<_, TweetRow>(&format!(
            "SELECT {TWEET_COLUMNS} FROM tweets WHERE author_id = $1 ORDER BY created_at DESC LIMIT $2"
        ))
        .bind(author_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|r| r.into_tweet()).collect())
    }

    async fn create(&self, tweet: &Tweet) -> Result<Tweet, AppError> {
        let row = sqlx::query_as::<_, TweetRow>(&format!(
            "INSERT INTO tweets (id, author_id, text, likes, retweet_of) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {TWEET_COLUMNS}"
        ))
        .bind(tweet.id)
        .bind(tweet.author_id)
        .bind(&tweet.text)
        .bind(&tweet.likes)
        .bind(tweet.retweet_of)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into_tweet())
    }

    async fn update_text(&self, id: i64, text: &str) -> Result<Tweet, AppError> {
        let row = sqlx::query_as::<_, TweetRow>(&format!(
            "UPDATE tweets SET text = $2, updated_at = NOW() WHERE id = $1 RETURNING {TWEET_COLUMNS}"
        ))
        .bind(id)
        .bind(text)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Tweet with id {} not found", id)))?;

        Ok(row.into_tweet())
    }

    async fn delete(&self, id: i64) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM tweets WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Tweet with id {} not found", id)));
        }

        Ok(())
    }

    async fn add_like(&self, tweet_id: i64, user_id: i64) -> Result<Tweet, AppError> {
        let tweet = self.require_tweet(tweet_id).await?;

        let mut likes = tweet.likes;
        if !likes.contains(&user_id) {
            likes.push(user_id);
        }

        self.write_likes(tweet_id, &likes).await
    }

    async fn remove_like(&self, tweet_id: i64, user_id: i64) -> Result<Tweet, AppError> {
        let tweet = self.require_tweet(tweet_id).await?;

        let mut likes = tweet.likes;
        likes.retain(|id| *id != user_id);

        self.write_likes(tweet_id, &likes).await
    }

    async fn count_retweets(&self, tweet_id: i64) -> Result<i64, AppError> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM tweets WHERE retweet_of = $1",
        )
        .bind(tweet_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    async fn has_retweeted(&self, tweet_id: i64, user_id: i64) -> Result<bool, AppError> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM tweets WHERE retweet_of = $1 AND author_id = $2)",
        )
        .bind(tweet_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }
}
