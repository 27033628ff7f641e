//! Tweet entity and repository trait.
//!
//! Maps to the `tweets` table. Like membership is an id array; retweets
//! are rows pointing at the original through `retweet_of`. Counts are
//! never stored, they are computed per request.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::shared::error::AppError;

/// A tweet (post).
///
/// Maps to the `tweets` table:
/// - id: BIGINT PRIMARY KEY (Snowflake ID)
/// - author_id: BIGINT NOT NULL REFERENCES users(id)
/// - text: VARCHAR(280) NOT NULL
/// - likes: BIGINT[] NOT NULL DEFAULT '{}'
/// - retweet_of: BIGINT NULL REFERENCES tweets(id)
/// - created_at: TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// - updated_at: TIMESTAMPTZ NOT NULL DEFAULT NOW()
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tweet {
    /// Snowflake ID (primary key)
    pub id: i64,

    /// Author of the tweet
    pub author_id: i64,

    /// Tweet text
    pub text: String,

    /// Ids of users who liked the tweet
    pub likes: Vec<i64>,

    /// Original tweet when this row is a retweet
    pub retweet_of: Option<i64>,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl Tweet {
    /// Whether the given user wrote this tweet.
    pub fn is_author(&self, user_id: i64) -> bool {
        self.author_id == user_id
    }

    /// Whether the given user has liked this tweet.
    pub fn is_liked_by(&self, user_id: i64) -> bool {
        self.likes.contains(&user_id)
    }

    /// Whether this row is a retweet.
    pub fn is_retweet(&self) -> bool {
        self.retweet_of.is_some()
    }
}

/// Repository trait for Tweet data access operations.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TweetRepository: Send + Sync {
    /// Find a tweet by its Snowflake ID.
    async fn find_by_id(&self, id: i64) -> Result<Option<Tweet>, AppError>;

    /// Latest tweets, newest first.
    async fn find_latest(&self, limit: i64) -> Result<Vec<Tweet>, AppError>;

    /// Tweets by a given author, newest first.
    async fn find_by_author(&self, author_id: i64, limit: i64) -> Result<Vec<Tweet>, AppError>;

    /// Persist a new tweet (or retweet).
    async fn create(&self, tweet: &Tweet) -> Result<Tweet, AppError>;

    /// Replace a tweet's text.
    async fn update_text(&self, id: i64, text: &str) -> Result<Tweet, AppError>;

    /// Delete a tweet.
    async fn delete(&self, id: i64) -> Result<(), AppError>;

    /// Add a user to the like list (no-op if present).
    async fn add_like(&self, tweet_id: i64, user_id: i64) -> Result<Tweet, AppError>;

    /// Remove a user from the like list (no-op if absent).
    async fn remove_like(&self, tweet_id: i64, user_id: i64) -> Result<Tweet, AppError>;

    /// Number of retweets referencing the given tweet.
    async fn count_retweets(&self, tweet_id: i64) -> Result<i64, AppError>;

    /// Whether the viewer has already retweeted the given tweet.
    async fn has_retweeted(&self, tweet_id: i64, user_id: i64) -> Result<bool, AppError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_tweet() -> Tweet {
        let now = Utc::now();
        Tweet {
            id: 1,
            author_id: 10,
            text: "hello world".into(),
            likes: vec![20, 30],
            retweet_of: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_is_author() {
        let tweet = test_tweet();
        assert!(tweet.is_author(10));
        assert!(!tweet.is_author(20));
    }

    #[test]
    fn test_is_liked_by() {
        let tweet = test_tweet();
        assert!(tweet.is_liked_by(20));
        assert!(!tweet.is_liked_by(10));
    }

    #[test]
    fn test_is_retweet() {
        let mut tweet = test_tweet();
        assert!(!tweet.is_retweet());
        tweet.retweet_of = Some(99);
        assert!(tweet.is_retweet());
    }
}
