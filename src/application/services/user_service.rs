//! User Service
//!
//! Profile management, directory search, and the follow graph.

use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::{User, UserRepository};

/// User service trait
#[async_trait]
pub trait UserService: Send + Sync {
    /// Fetch a user profile, with follower data relative to the viewer
    async fn get_user(&self, user_id: i64, viewer_id: Option<i64>) -> Result<UserDto, UserError>;

    /// Search the directory by username or name prefix
    async fn search(&self, query: &str, limit: i64) -> Result<Vec<UserDto>, UserError>;

    /// Update the caller's own profile
    async fn update_profile(&self, user_id: i64, update: UpdateProfileDto) -> Result<UserDto, UserError>;

    /// Delete the caller's account
    async fn delete_account(&self, user_id: i64) -> Result<(), UserError>;

    /// Follow another user (idempotent)
    async fn follow(&self, target_id: i64, follower_id: i64) -> Result<UserDto, UserError>;

    /// Unfollow another user (idempotent)
    async fn unfollow(&self, target_id: i64, follower_id: i64) -> Result<UserDto, UserError>;

    /// Resolve a user's followers to profiles
    async fn followers(&self, user_id: i64) -> Result<Vec<UserDto>, UserError>;
}

/// Profile update request
#[derive(Debug, Clone, Default)]
pub struct UpdateProfileDto {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub username: Option<String>,
    pub avatar_url: Option<String>,
}

/// User data transfer object
#[derive(Debug, Clone)]
pub struct UserDto {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub username: String,
    pub email: String,
    pub role: String,
    pub active: bool,
    pub avatar_url: Option<String>,
    pub follower_count: i64,
    pub followed_by_viewer: bool,
    pub created_at: String,
}

impl UserDto {
    /// Project a domain user for a given viewer.
    pub fn from_user(user: User, viewer_id: Option<i64>) -> Self {
        let followed_by_viewer = viewer_id.map(|v| user.is_followed_by(v)).unwrap_or(false);
        Self {
            id: user.id.to_string(),
            first_name: user.first_name,
            last_name: user.last_name,
            username: user.username,
            email: user.email,
            role: user.role.as_str().to_string(),
            active: user.active,
            avatar_url: user.avatar_url,
            follower_count: user.followers.len() as i64,
            followed_by_viewer,
            created_at: user.created_at.to_rfc3339(),
        }
    }
}

/// User service errors
#[derive(Debug, thiserror::Error)]
pub enum UserError {
    #[error("User not found")]
    NotFound,

    #[error("Cannot follow yourself")]
    SelfFollow,

    #[error("Username already taken")]
    UsernameTaken,

    #[error("Internal error: {0}")]
    Internal(String),
}

/// UserService implementation
pub struct UserServiceImpl<U>
where
    U: UserRepository,
{
    user_repo: Arc<U>,
}

impl<U> UserServiceImpl<U>
where
    U: UserRepository,
{
    pub fn new(user_repo: Arc<U>) -> Self {
        Self { user_repo }
    }

    async fn require_user(&self, user_id: i64) -> Result<User, UserError> {
        self.user_repo
            .find_by_id(user_id)
            .await
            .map_err(|e| UserError::Internal(e.to_string()))?
            .ok_or(UserError::NotFound)
    }
}

#[async_trait]
impl<U> UserService for UserServiceImpl<U>
where
    U: UserRepository + 'static,
{
    async fn get_user(&self, user_id: i64, viewer_id: Option<i64>) -> Result<UserDto, UserError> {
        let user = self.require_user(user_id).await?;
        Ok(UserDto::from_user(user, viewer_id))
    }

    async fn search(&self, query: &str, limit: i64) -> Result<Vec<UserDto>, UserError> {
        let users = self
            .user_repo
            .search(query, limit)
            .await
            .map_err(|e| UserError::Internal(e.to_string()))?;

        Ok(users
            .into_iter()
            .map(|u| UserDto::from_user(u, None))
            .collect())
    }

    async fn update_profile(
        &self,
        user_id: i64,
        update: UpdateProfileDto,
    ) -> Result<UserDto, UserError> {
        let mut user = self.require_user(user_id).await?;

        if let Some(first_name) = update.first_name {
            user.first_name = first_name;
        }
        if let Some(last_name) = update.last_name {
            user.last_name = last_name;
        }
        if let Some(username) = update.username {
            user.username = username;
        }
        if let Some(avatar_url) = update.avatar_url {
            user.avatar_url = Some(avatar_url);
        }

        let updated = self.user_repo.update(&user).await.map_err(|e| match e {
            crate::shared::error::AppError::Conflict(_) => UserError::UsernameTaken,
            e => UserError::Internal(e.to_string()),
        })?;

        Ok(UserDto::from_user(updated, Some(user_id)))
    }

    async fn delete_account(&self, user_id: i64) -> Result<(), UserError> {
        self.user_repo.delete(user_id).await.map_err(|e| match e {
            crate::shared::error::AppError::NotFound(_) => UserError::NotFound,
            e => UserError::Internal(e.to_string()),
        })?;

        tracing::info!(user_id = user_id, "Account deleted");
        Ok(())
    }

    async fn follow(&self, target_id: i64, follower_id: i64) -> Result<UserDto, UserError> {
        if target_id == follower_id {
            return Err(UserError::SelfFollow);
        }

        // Target must exist before mutating its follower list
        self.require_user(target_id).await?;

        let updated = self
            .user_repo
            .add_follower(target_id, follower_id)
            .await
            .map_err(|e| UserError::Internal(e.to_string()))?;

        Ok(UserDto::from_user(updated, Some(follower_id)))
    }

    async fn unfollow(&self, target_id: i64, follower_id: i64) -> Result<UserDto, UserError> {
        if target_id == follower_id {
            return Err(UserError::SelfFollow);
        }

        self.require_user(target_id).await?;

        let updated = self
            .user_repo
            .remove_follower(target_id, follower_id)
            .await
            .map_err(|e| UserError::Internal(e.to_string()))?;

        Ok(UserDto::from_user(updated, Some(follower_id)))
    }

    async fn followers(&self, user_id: i64) -> Result<Vec<UserDto>, UserError> {
        let user = self.require_user(user_id).await?;

        if user.followers.is_empty() {
            return Ok(Vec::new());
        }

        let followers = self
            .user_repo
            .find_by_ids(&user.followers)
            .await
            .map_err(|e| UserError::Internal(e.to_string()))?;

        Ok(followers
            .into_iter()
            .map(|u| UserDto::from_user(u, None))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::user::MockUserRepository;
    use crate::domain::UserRole;

    fn user_with_id(id: i64) -> User {
        User {
            id,
            first_name: "Jack".into(),
            last_name: "Bourne".into(),
            username: format!("user{}", id),
            email: format!("user{}@example.com", id),
            active: true,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_get_user_reports_viewer_follow_state() {
        let mut user_repo = MockUserRepository::new();
        user_repo.expect_find_by_id().returning(|id| {
            let mut user = user_with_id(id);
            user.followers = vec![42];
            Ok(Some(user))
        });

        let service = UserServiceImpl::new(Arc::new(user_repo));

        let dto = service.get_user(1, Some(42)).await.unwrap();
        assert!(dto.followed_by_viewer);
        assert_eq!(dto.follower_count, 1);

        let dto = service.get_user(1, Some(99)).await.unwrap();
        assert!(!dto.followed_by_viewer);
    }

    #[tokio::test]
    async fn test_get_missing_user_is_not_found() {
        let mut user_repo = MockUserRepository::new();
        user_repo.expect_find_by_id().returning(|_| Ok(None));

        let service = UserServiceImpl::new(Arc::new(user_repo));
        assert!(matches!(service.get_user(1, None).await, Err(UserError::NotFound)));
    }

    #[tokio::test]
    async fn test_follow_self_rejected() {
        let service = UserServiceImpl::new(Arc::new(MockUserRepository::new()));
        assert!(matches!(service.follow(7, 7).await, Err(UserError::SelfFollow)));
    }

    #[tokio::test]
    async fn test_follow_adds_follower() {
        let mut user_repo = MockUserRepository::new();
        user_repo
            .expect_find_by_id()
            .returning(|id| Ok(Some(user_with_id(id))));
        user_repo
            .expect_add_follower()
            .withf(|target, follower| *target == 1 && *follower == 2)
            .times(1)
            .returning(|target, follower| {
                let mut user = user_with_id(target);
                user.followers = vec![follower];
                Ok(user)
            });

        let service = UserServiceImpl::new(Arc::new(user_repo));
        let dto = service.follow(1, 2).await.unwrap();

        assert!(dto.followed_by_viewer);
    }

    #[tokio::test]
    async fn test_followers_skips_lookup_for_empty_list() {
        let mut user_repo = MockUserRepository::new();
        user_repo
            .expect_find_by_id()
            .returning(|id| Ok(Some(user_with_id(id))));
        // No expectation for find_by_ids: calling it would panic.

        let service = UserServiceImpl::new(Arc::new(user_repo));
        assert!(service.followers(1).await.unwrap().is_empty());
    }

    #[test]
    fn test_dto_projects_role_string() {
        let mut user = user_with_id(3);
        user.role = UserRole::Admin;
        let dto = UserDto::from_user(user, None);
        assert_eq!(dto.role, "admin");
    }
}
