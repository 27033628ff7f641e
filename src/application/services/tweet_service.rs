//! Tweet Service
//!
//! Tweet CRUD, likes, and retweets. Derived counters and viewer flags are
//! recomputed per request with one auxiliary query per tweet; nothing is
//! cached or stored.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;

use crate::domain::{CommentRepository, Tweet, TweetRepository, User, UserRepository};
use crate::shared::snowflake::SnowflakeGenerator;

/// Tweet service trait
#[async_trait]
pub trait TweetService: Send + Sync {
    /// Create a tweet
    async fn create_tweet(&self, author_id: i64, text: &str) -> Result<TweetDto, TweetError>;

    /// Latest tweets, newest first, projected for the viewer
    async fn get_feed(&self, viewer_id: Option<i64>, limit: i64) -> Result<Vec<TweetDto>, TweetError>;

    /// Fetch a single tweet
    async fn get_tweet(&self, tweet_id: i64, viewer_id: Option<i64>) -> Result<TweetDto, TweetError>;

    /// Edit a tweet's text (author only)
    async fn update_tweet(&self, tweet_id: i64, actor: &User, text: &str) -> Result<TweetDto, TweetError>;

    /// Delete a tweet (author or admin)
    async fn delete_tweet(&self, tweet_id: i64, actor: &User) -> Result<(), TweetError>;

    /// Like a tweet (idempotent)
    async fn like(&self, tweet_id: i64, user_id: i64) -> Result<TweetDto, TweetError>;

    /// Remove a like (idempotent)
    async fn unlike(&self, tweet_id: i64, user_id: i64) -> Result<TweetDto, TweetError>;

    /// Retweet: a new tweet row referencing the original
    async fn retweet(&self, tweet_id: i64, author_id: i64, text: &str) -> Result<TweetDto, TweetError>;
}

/// Author summary embedded in tweet and comment projections
#[derive(Debug, Clone)]
pub struct AuthorDto {
    pub id: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub avatar_url: Option<String>,
}

impl From<User> for AuthorDto {
    fn from(user: User) -> Self {
        Self {
            id: user.id.to_string(),
            username: user.username,
            first_name: user.first_name,
            last_name: user.last_name,
            avatar_url: user.avatar_url,
        }
    }
}

/// Tweet data transfer object with derived fields
#[derive(Debug, Clone)]
pub struct TweetDto {
    pub id: String,
    pub author: Option<AuthorDto>,
    pub text: String,
    pub like_count: i64,
    pub retweet_count: i64,
    pub comment_count: i64,
    pub liked_by_viewer: bool,
    pub retweeted_by_viewer: bool,
    pub retweet_of: Option<String>,
    pub created_at: String,
}

/// Tweet service errors
#[derive(Debug, thiserror::Error)]
pub enum TweetError {
    #[error("Tweet not found")]
    NotFound,

    #[error("Not the author of this tweet")]
    Forbidden,

    #[error("Internal error: {0}")]
    Internal(String),
}

/// TweetService implementation
pub struct TweetServiceImpl<T, C, U>
where
    T: TweetRepository,
    C: CommentRepository,
    U: UserRepository,
{
    tweet_repo: Arc<T>,
    comment_repo: Arc<C>,
    user_repo: Arc<U>,
    id_generator: Arc<SnowflakeGenerator>,
}

impl<T, C, U> TweetServiceImpl<T, C, U>
where
    T: TweetRepository,
    C: CommentRepository,
    U: UserRepository,
{
    pub fn new(
        tweet_repo: Arc<T>,
        comment_repo: Arc<C>,
        user_repo: Arc<U>,
        id_generator: Arc<SnowflakeGenerator>,
    ) -> Self {
        Self {
            tweet_repo,
            comment_repo,
            user_repo,
            id_generator,
        }
    }

    async fn require_tweet(&self, tweet_id: i64) -> Result<Tweet, TweetError> {
        self.tweet_repo
            .find_by_id(tweet_id)
            .await
            .map_err(|e| TweetError::Internal(e.to_string()))?
            .ok_or(TweetError::NotFound)
    }

    /// Project a tweet for a viewer, issuing the per-tweet auxiliary
    /// queries for counts and flags.
    async fn project(&self, tweet: Tweet, viewer_id: Option<i64>) -> Result<TweetDto, TweetError> {
        let retweet_count = self
            .tweet_repo
            .count_retweets(tweet.id)
            .await
            .map_err(|e| TweetError::Internal(e.to_string()))?;

        let comment_count = self
            .comment_repo
            .count_for_tweet(tweet.id)
            .await
            .map_err(|e| TweetError::Internal(e.to_string()))?;

        let retweeted_by_viewer = match viewer_id {
            Some(viewer) => self
                .tweet_repo
                .has_retweeted(tweet.id, viewer)
                .await
                .map_err(|e| TweetError::Internal(e.to_string()))?,
            None => false,
        };

        let author = self
            .user_repo
            .find_by_id(tweet.author_id)
            .await
            .map_err(|e| TweetError::Internal(e.to_string()))?
            .map(AuthorDto::from);

        let liked_by_viewer = viewer_id.map(|v| tweet.is_liked_by(v)).unwrap_or(false);

        Ok(TweetDto {
            id: tweet.id.to_string(),
            author,
            text: tweet.text,
            like_count: tweet.likes.len() as i64,
            retweet_count,
            comment_count,
            liked_by_viewer,
            retweeted_by_viewer,
            retweet_of: tweet.retweet_of.map(|id| id.to_string()),
            created_at: tweet.created_at.to_rfc3339(),
        })
    }
}

#[async_trait]
impl<T, C, U> TweetService for TweetServiceImpl<T, C, U>
where
    T: TweetRepository + 'static,
    C: CommentRepository + 'static,
    U: UserRepository + 'static,
{
    async fn create_tweet(&self, author_id: i64, text: &str) -> Result<TweetDto, TweetError> {
        let now = Utc::now();
        let tweet = Tweet {
            id: self.id_generator.generate(),
            author_id,
            text: text.to_string(),
            likes: Vec::new(),
            retweet_of: None,
            created_at: now,
            updated_at: now,
        };

        let created = self
            .tweet_repo
            .create(&tweet)
            .await
            .map_err(|e| TweetError::Internal(e.to_string()))?;

        self.project(created, Some(author_id)).await
    }

    async fn get_feed(
        &self,
        viewer_id: Option<i64>,
        limit: i64,
    ) -> Result<Vec<TweetDto>, TweetError> {
        let tweets = self
            .tweet_repo
            .find_latest(limit)
            .await
            .map_err(|e| TweetError::Internal(e.to_string()))?;

        // One projection per tweet, each paying its own count queries
        let mut dtos = Vec::with_capacity(tweets.len());
        for tweet in tweets {
            dtos.push(self.project(tweet, viewer_id).await?);
        }

        Ok(dtos)
    }

    async fn get_tweet(
        &self,
        tweet_id: i64,
        viewer_id: Option<i64>,
    ) -> Result<TweetDto, TweetError> {
        let tweet = self.require_tweet(tweet_id).await?;
        self.project(tweet, viewer_id).await
    }

    async fn update_tweet(
        &self,
        tweet_id: i64,
        actor: &User,
        text: &str,
    ) -> Result<TweetDto, TweetError> {
        let tweet = self.require_tweet(tweet_id).await?;

        if !tweet.is_author(actor.id) {
            return Err(TweetError::Forbidden);
        }

        let updated = self
            .tweet_repo
            .update_text(tweet_id, text)
            .await
            .map_err(|e| TweetError::Internal(e.to_string()))?;

        self.project(updated, Some(actor.id)).await
    }

    async fn delete_tweet(&self, tweet_id: i64, actor: &User) -> Result<(), TweetError> {
        let tweet = self.require_tweet(tweet_id).await?;

        if !tweet.is_author(actor.id) && !actor.is_admin() {
            return Err(TweetError::Forbidden);
        }

        self.tweet_repo
            .delete(tweet_id)
            .await
            .map_err(|e| TweetError::Internal(e.to_string()))?;

        tracing::info!(tweet_id = tweet_id, actor_id = actor.id, "Tweet deleted");
        Ok(())
    }

    async fn like(&self, tweet_id: i64, user_id: i64) -> Result<TweetDto, TweetError> {
        self.require_tweet(tweet_id).await?;

        let updated = self
            .tweet_repo
            .add_like(tweet_id, user_id)
            .await
            .map_err(|e| TweetError::Internal(e.to_string()))?;

        self.project(updated, Some(user_id)).await
    }

    async fn unlike(&self, tweet_id: i64, user_id: i64) -> Result<TweetDto, TweetError> {
        self.require_tweet(tweet_id).await?;

        let updated = self
            .tweet_repo
            .remove_like(tweet_id, user_id)
            .await
            .map_err(|e| TweetError::Internal(e.to_string()))?;

        self.project(updated, Some(user_id)).await
    }

    async fn retweet(
        &self,
        tweet_id: i64,
        author_id: i64,
        text: &str,
    ) -> Result<TweetDto, TweetError> {
        // The original must exist; retweets of retweets point at their
        // direct target, not the root.
        self.require_tweet(tweet_id).await?;

        let now = Utc::now();
        let retweet = Tweet {
            id: self.id_generator.generate(),
            author_id,
            text: text.to_string(),
            likes: Vec::new(),
            retweet_of: Some(tweet_id),
            created_at: now,
            updated_at: now,
        };

        let created = self
            .tweet_repo
            .create(&retweet)
            .await
            .map_err(|e| TweetError::Internal(e.to_string()))?;

        self.project(created, Some(author_id)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::comment::MockCommentRepository;
    use crate::domain::entities::tweet::MockTweetRepository;
    use crate::domain::entities::user::MockUserRepository;
    use crate::domain::UserRole;

    fn author() -> User {
        User {
            id: 10,
            username: "jackb".into(),
            active: true,
            ..Default::default()
        }
    }

    fn tweet_by(author_id: i64) -> Tweet {
        let now = Utc::now();
        Tweet {
            id: 1,
            author_id,
            text: "hello".into(),
            likes: vec![20],
            retweet_of: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn mocks_for_projection() -> (MockTweetRepository, MockCommentRepository, MockUserRepository) {
        let mut tweet_repo = MockTweetRepository::new();
        let mut comment_repo = MockCommentRepository::new();
        let mut user_repo = MockUserRepository::new();

        tweet_repo.expect_count_retweets().returning(|_| Ok(2));
        tweet_repo.expect_has_retweeted().returning(|_, _| Ok(false));
        comment_repo.expect_count_for_tweet().returning(|_| Ok(3));
        user_repo.expect_find_by_id().returning(|_| Ok(Some(author())));

        (tweet_repo, comment_repo, user_repo)
    }

    #[tokio::test]
    async fn test_get_tweet_computes_derived_fields() {
        let (mut tweet_repo, comment_repo, user_repo) = mocks_for_projection();
        tweet_repo
            .expect_find_by_id()
            .returning(|_| Ok(Some(tweet_by(10))));

        let service = TweetServiceImpl::new(
            Arc::new(tweet_repo),
            Arc::new(comment_repo),
            Arc::new(user_repo),
            Arc::new(SnowflakeGenerator::new(1, 0)),
        );

        let dto = service.get_tweet(1, Some(20)).await.unwrap();
        assert_eq!(dto.like_count, 1);
        assert_eq!(dto.retweet_count, 2);
        assert_eq!(dto.comment_count, 3);
        assert!(dto.liked_by_viewer);
        assert!(!dto.retweeted_by_viewer);
        assert_eq!(dto.author.unwrap().username, "jackb");
    }

    #[tokio::test]
    async fn test_get_missing_tweet_is_not_found() {
        let mut tweet_repo = MockTweetRepository::new();
        tweet_repo.expect_find_by_id().returning(|_| Ok(None));

        let service = TweetServiceImpl::new(
            Arc::new(tweet_repo),
            Arc::new(MockCommentRepository::new()),
            Arc::new(MockUserRepository::new()),
            Arc::new(SnowflakeGenerator::new(1, 0)),
        );

        assert!(matches!(service.get_tweet(1, None).await, Err(TweetError::NotFound)));
    }

    #[tokio::test]
    async fn test_update_by_non_author_forbidden() {
        let mut tweet_repo = MockTweetRepository::new();
        tweet_repo
            .expect_find_by_id()
            .returning(|_| Ok(Some(tweet_by(10))));

        let service = TweetServiceImpl::new(
            Arc::new(tweet_repo),
            Arc::new(MockCommentRepository::new()),
            Arc::new(MockUserRepository::new()),
            Arc::new(SnowflakeGenerator::new(1, 0)),
        );

        let stranger = User { id: 99, ..Default::default() };
        let result = service.update_tweet(1, &stranger, "edited").await;
        assert!(matches!(result, Err(TweetError::Forbidden)));
    }

    #[tokio::test]
    async fn test_admin_can_delete_others_tweet() {
        let mut tweet_repo = MockTweetRepository::new();
        tweet_repo
            .expect_find_by_id()
            .returning(|_| Ok(Some(tweet_by(10))));
        tweet_repo.expect_delete().times(1).returning(|_| Ok(()));

        let service = TweetServiceImpl::new(
            Arc::new(tweet_repo),
            Arc::new(MockCommentRepository::new()),
            Arc::new(MockUserRepository::new()),
            Arc::new(SnowflakeGenerator::new(1, 0)),
        );

        let admin = User { id: 99, role: UserRole::Admin, ..Default::default() };
        assert!(service.delete_tweet(1, &admin).await.is_ok());
    }

    #[tokio::test]
    async fn test_non_author_non_admin_cannot_delete() {
        let mut tweet_repo = MockTweetRepository::new();
        tweet_repo
            .expect_find_by_id()
            .returning(|_| Ok(Some(tweet_by(10))));

        let service = TweetServiceImpl::new(
            Arc::new(tweet_repo),
            Arc::new(MockCommentRepository::new()),
            Arc::new(MockUserRepository::new()),
            Arc::new(SnowflakeGenerator::new(1, 0)),
        );

        let stranger = User { id: 99, ..Default::default() };
        assert!(matches!(
            service.delete_tweet(1, &stranger).await,
            Err(TweetError::Forbidden)
        ));
    }

    #[tokio::test]
    async fn test_retweet_references_original() {
        let (mut tweet_repo, comment_repo, user_repo) = mocks_for_projection();
        tweet_repo
            .expect_find_by_id()
            .returning(|_| Ok(Some(tweet_by(10))));
        tweet_repo
            .expect_create()
            .withf(|t: &Tweet| t.retweet_of == Some(1) && t.author_id == 20)
            .times(1)
            .returning(|t| Ok(t.clone()));

        let service = TweetServiceImpl::new(
            Arc::new(tweet_repo),
            Arc::new(comment_repo),
            Arc::new(user_repo),
            Arc::new(SnowflakeGenerator::new(1, 0)),
        );

        let dto = service.retweet(1, 20, "").await.unwrap();
        assert_eq!(dto.retweet_of.as_deref(), Some("1"));
    }
}
