//! Comment Service
//!
//! Threaded comments on tweets, with per-request derived counters.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;

use crate::domain::{Comment, CommentRepository, TweetRepository, User, UserRepository};
use crate::shared::snowflake::SnowflakeGenerator;

use super::tweet_service::AuthorDto;

/// Comment service trait
#[async_trait]
pub trait CommentService: Send + Sync {
    /// Create a comment on a tweet, or a reply to another comment
    async fn create_comment(
        &self,
        author_id: i64,
        request: CreateCommentDto,
    ) -> Result<CommentDto, CommentError>;

    /// Fetch a single comment
    async fn get_comment(
        &self,
        comment_id: i64,
        viewer_id: Option<i64>,
    ) -> Result<CommentDto, CommentError>;

    /// Top-level comments of a tweet
    async fn comments_for_tweet(
        &self,
        tweet_id: i64,
        viewer_id: Option<i64>,
    ) -> Result<Vec<CommentDto>, CommentError>;

    /// Replies to a comment
    async fn replies(
        &self,
        comment_id: i64,
        viewer_id: Option<i64>,
    ) -> Result<Vec<CommentDto>, CommentError>;

    /// Edit a comment's text (author only)
    async fn update_comment(
        &self,
        comment_id: i64,
        actor: &User,
        text: &str,
    ) -> Result<CommentDto, CommentError>;

    /// Delete a comment (author or admin)
    async fn delete_comment(&self, comment_id: i64, actor: &User) -> Result<(), CommentError>;

    /// Like a comment (idempotent)
    async fn like(&self, comment_id: i64, user_id: i64) -> Result<CommentDto, CommentError>;

    /// Remove a like (idempotent)
    async fn unlike(&self, comment_id: i64, user_id: i64) -> Result<CommentDto, CommentError>;
}

/// Create comment request
#[derive(Debug, Clone)]
pub struct CreateCommentDto {
    pub text: String,
    pub tweet_id: Option<i64>,
    pub reply_to: Option<i64>,
}

/// Comment data transfer object with derived fields
#[derive(Debug, Clone)]
pub struct CommentDto {
    pub id: String,
    pub author: Option<AuthorDto>,
    pub tweet_id: Option<String>,
    pub text: String,
    pub like_count: i64,
    pub reply_count: i64,
    pub liked_by_viewer: bool,
    pub reply_to: Option<String>,
    pub created_at: String,
}

/// Comment service errors
#[derive(Debug, thiserror::Error)]
pub enum CommentError {
    #[error("Comment not found")]
    NotFound,

    #[error("Tweet not found")]
    TweetNotFound,

    #[error("Comment needs a tweet or a parent comment")]
    MissingTarget,

    #[error("Not the author of this comment")]
    Forbidden,

    #[error("Internal error: {0}")]
    Internal(String),
}

/// CommentService implementation
pub struct CommentServiceImpl<C, T, U>
where
    C: CommentRepository,
    T: TweetRepository,
    U: UserRepository,
{
    comment_repo: Arc<C>,
    tweet_repo: Arc<T>,
    user_repo: Arc<U>,
    id_generator: Arc<SnowflakeGenerator>,
}

impl<C, T, U> CommentServiceImpl<C, T, U>
where
    C: CommentRepository,
    T: TweetRepository,
    U: UserRepository,
{
    pub fn new(
        comment_repo: Arc<C>,
        tweet_repo: Arc<T>,
        user_repo: Arc<U>,
        id_generator: Arc<SnowflakeGenerator>,
    ) -> Self {
        Self {
            comment_repo,
            tweet_repo,
            user_repo,
            id_generator,
        }
    }

    async fn require_comment(&self, comment_id: i64) -> Result<Comment, CommentError> {
        self.comment_repo
            .find_by_id(comment_id)
            .await
            .map_err(|e| CommentError::Internal(e.to_string()))?
            .ok_or(CommentError::NotFound)
    }

    /// Project a comment for a viewer, paying the per-comment reply-count
    /// and author queries.
    async fn project(
        &self,
        comment: Comment,
        viewer_id: Option<i64>,
    ) -> Result<CommentDto, CommentError> {
        let reply_count = self
            .comment_repo
            .count_replies(comment.id)
            .await
            .map_err(|e| CommentError::Internal(e.to_string()))?;

        let author = self
            .user_repo
            .find_by_id(comment.author_id)
            .await
            .map_err(|e| CommentError::Internal(e.to_string()))?
            .map(AuthorDto::from);

        let liked_by_viewer = viewer_id.map(|v| comment.is_liked_by(v)).unwrap_or(false);

        Ok(CommentDto {
            id: comment.id.to_string(),
            author,
            tweet_id: comment.tweet_id.map(|id| id.to_string()),
            text: comment.text,
            like_count: comment.likes.len() as i64,
            reply_count,
            liked_by_viewer,
            reply_to: comment.reply_to.map(|id| id.to_string()),
            created_at: comment.created_at.to_rfc3339(),
        })
    }

    async fn project_all(
        &self,
        comments: Vec<Comment>,
        viewer_id: Option<i64>,
    ) -> Result<Vec<CommentDto>, CommentError> {
        let mut dtos = Vec::with_capacity(comments.len());
        for comment in comments {
            dtos.push(self.project(comment, viewer_id).await?);
        }
        Ok(dtos)
    }
}

#[async_trait]
impl<C, T, U> CommentService for CommentServiceImpl<C, T, U>
where
    C: CommentRepository + 'static,
    T: TweetRepository + 'static,
    U: UserRepository + 'static,
{
    async fn create_comment(
        &self,
        author_id: i64,
        request: CreateCommentDto,
    ) -> Result<CommentDto, CommentError> {
        if request.tweet_id.is_none() && request.reply_to.is_none() {
            return Err(CommentError::MissingTarget);
        }

        if let Some(tweet_id) = request.tweet_id {
            self.tweet_repo
                .find_by_id(tweet_id)
                .await
                .map_err(|e| CommentError::Internal(e.to_string()))?
                .ok_or(CommentError::TweetNotFound)?;
        }

        if let Some(parent_id) = request.reply_to {
            self.require_comment(parent_id).await?;
        }

        let now = Utc::now();
        let comment = Comment {
            id: self.id_generator.generate(),
            author_id,
            tweet_id: request.tweet_id,
            text: request.text,
            likes: Vec::new(),
            reply_to: request.reply_to,
            created_at: now,
            updated_at: now,
        };

        let created = self
            .comment_repo
            .create(&comment)
            .await
            .map_err(|e| CommentError::Internal(e.to_string()))?;

        self.project(created, Some(author_id)).await
    }

    async fn get_comment(
        &self,
        comment_id: i64,
        viewer_id: Option<i64>,
    ) -> Result<CommentDto, CommentError> {
        let comment = self.require_comment(comment_id).await?;
        self.project(comment, viewer_id).await
    }

    async fn comments_for_tweet(
        &self,
        tweet_id: i64,
        viewer_id: Option<i64>,
    ) -> Result<Vec<CommentDto>, CommentError> {
        self.tweet_repo
            .find_by_id(tweet_id)
            .await
            .map_err(|e| CommentError::Internal(e.to_string()))?
            .ok_or(CommentError::TweetNotFound)?;

        let comments = self
            .comment_repo
            .find_by_tweet(tweet_id)
            .await
            .map_err(|e| CommentError::Internal(e.to_string()))?;

        self.project_all(comments, viewer_id).await
    }

    async fn replies(
        &self,
        comment_id: i64,
        viewer_id: Option<i64>,
    ) -> Result<Vec<CommentDto>, CommentError> {
        self.require_comment(comment_id).await?;

        let replies = self
            .comment_repo
            .find_replies(comment_id)
            .await
            .map_err(|e| CommentError::Internal(e.to_string()))?;

        self.project_all(replies, viewer_id).await
    }

    async fn update_comment(
        &self,
        comment_id: i64,
        actor: &User,
        text: &str,
    ) -> Result<CommentDto, CommentError> {
        let comment = self.require_comment(comment_id).await?;

        if !comment.is_author(actor.id) {
            return Err(CommentError::Forbidden);
        }

        let updated = self
            .comment_repo
            .update_text(comment_id, text)
            .await
            .map_err(|e| CommentError::Internal(e.to_string()))?;

        self.project(updated, Some(actor.id)).await
    }

    async fn delete_comment(&self, comment_id: i64, actor: &User) -> Result<(), CommentError> {
        let comment = self.require_comment(comment_id).await?;

        if !comment.is_author(actor.id) && !actor.is_admin() {
            return Err(CommentError::Forbidden);
        }

        self.comment_repo
            .delete(comment_id)
            .await
            .map_err(|e| CommentError::Internal(e.to_string()))?;

        tracing::info!(comment_id = comment_id, actor_id = actor.id, "Comment deleted");
        Ok(())
    }

    async fn like(&self, comment_id: i64, user_id: i64) -> Result<CommentDto, CommentError> {
        self.require_comment(comment_id).await?;

        let updated = self
            .comment_repo
            .add_like(comment_id, user_id)
            .await
            .map_err(|e| CommentError::Internal(e.to_string()))?;

        self.project(updated, Some(user_id)).await
    }

    async fn unlike(&self, comment_id: i64, user_id: i64) -> Result<CommentDto, CommentError> {
        self.require_comment(comment_id).await?;

        let updated = self
            .comment_repo
            .remove_like(comment_id, user_id)
            .await
            .map_err(|e| CommentError::Internal(e.to_string()))?;

        self.project(updated, Some(user_id)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::comment::MockCommentRepository;
    use crate::domain::entities::tweet::MockTweetRepository;
    use crate::domain::entities::user::MockUserRepository;
    use crate::domain::Tweet;

    fn service_with(
        comment_repo: MockCommentRepository,
        tweet_repo: MockTweetRepository,
        user_repo: MockUserRepository,
    ) -> CommentServiceImpl<MockCommentRepository, MockTweetRepository, MockUserRepository> {
        CommentServiceImpl::new(
            Arc::new(comment_repo),
            Arc::new(tweet_repo),
            Arc::new(user_repo),
            Arc::new(SnowflakeGenerator::new(1, 0)),
        )
    }

    #[tokio::test]
    async fn test_create_comment_without_target_rejected() {
        let service = service_with(
            MockCommentRepository::new(),
            MockTweetRepository::new(),
            MockUserRepository::new(),
        );

        let result = service
            .create_comment(
                1,
                CreateCommentDto {
                    text: "hi".into(),
                    tweet_id: None,
                    reply_to: None,
                },
            )
            .await;

        assert!(matches!(result, Err(CommentError::MissingTarget)));
    }

    #[tokio::test]
    async fn test_create_comment_on_missing_tweet_rejected() {
        let mut tweet_repo = MockTweetRepository::new();
        tweet_repo.expect_find_by_id().returning(|_| Ok(None));

        let service = service_with(
            MockCommentRepository::new(),
            tweet_repo,
            MockUserRepository::new(),
        );

        let result = service
            .create_comment(
                1,
                CreateCommentDto {
                    text: "hi".into(),
                    tweet_id: Some(2),
                    reply_to: None,
                },
            )
            .await;

        assert!(matches!(result, Err(CommentError::TweetNotFound)));
    }

    #[tokio::test]
    async fn test_create_comment_projects_counts() {
        let mut comment_repo = MockCommentRepository::new();
        let mut tweet_repo = MockTweetRepository::new();
        let mut user_repo = MockUserRepository::new();

        tweet_repo.expect_find_by_id().returning(|id| {
            let now = Utc::now();
            Ok(Some(Tweet {
                id,
                author_id: 5,
                text: "t".into(),
                likes: vec![],
                retweet_of: None,
                created_at: now,
                updated_at: now,
            }))
        });
        comment_repo
            .expect_create()
            .withf(|c: &Comment| c.tweet_id == Some(2) && c.reply_to.is_none())
            .times(1)
            .returning(|c| Ok(c.clone()));
        comment_repo.expect_count_replies().returning(|_| Ok(0));
        user_repo.expect_find_by_id().returning(|_| Ok(None));

        let service = service_with(comment_repo, tweet_repo, user_repo);

        let dto = service
            .create_comment(
                1,
                CreateCommentDto {
                    text: "hi".into(),
                    tweet_id: Some(2),
                    reply_to: None,
                },
            )
            .await
            .unwrap();

        assert_eq!(dto.reply_count, 0);
        assert_eq!(dto.like_count, 0);
        assert_eq!(dto.tweet_id.as_deref(), Some("2"));
    }

    #[tokio::test]
    async fn test_edit_by_non_author_forbidden() {
        let mut comment_repo = MockCommentRepository::new();
        comment_repo.expect_find_by_id().returning(|id| {
            let now = Utc::now();
            Ok(Some(Comment {
                id,
                author_id: 5,
                tweet_id: Some(1),
                text: "hi".into(),
                likes: vec![],
                reply_to: None,
                created_at: now,
                updated_at: now,
            }))
        });

        let service = service_with(
            comment_repo,
            MockTweetRepository::new(),
            MockUserRepository::new(),
        );

        let stranger = User { id: 99, ..Default::default() };
        let result = service.update_comment(1, &stranger, "edited").await;
        assert!(matches!(result, Err(CommentError::Forbidden)));
    }
}
