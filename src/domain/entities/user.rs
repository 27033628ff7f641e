//! User entity and repository trait.
//!
//! Maps to the `users` table in the database schema.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::shared::error::AppError;

/// User role enum matching database VARCHAR constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    #[default]
    User,
    Admin,
}

impl UserRole {
    /// Convert from database string representation.
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "admin" => Self::Admin,
            _ => Self::User,
        }
    }

    /// Convert to database string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Admin => "admin",
        }
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Represents a user account.
///
/// Maps to the `users` table:
/// - id: BIGINT PRIMARY KEY (Snowflake ID)
/// - first_name: VARCHAR(64) NOT NULL
/// - last_name: VARCHAR(64) NOT NULL
/// - username: VARCHAR(32) NOT NULL UNIQUE
/// - email: VARCHAR(255) NOT NULL UNIQUE
/// - password_hash: VARCHAR(255) NOT NULL
/// - role: VARCHAR(20) DEFAULT 'user'
/// - active: BOOLEAN NOT NULL DEFAULT FALSE
/// - followers: BIGINT[] NOT NULL DEFAULT '{}'
/// - avatar_url: TEXT NULL
/// - created_at: TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// - updated_at: TIMESTAMPTZ NOT NULL DEFAULT NOW()
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Snowflake ID (primary key)
    pub id: i64,

    /// First name
    pub first_name: String,

    /// Last name
    pub last_name: String,

    /// Username (2-32 characters, unique)
    pub username: String,

    /// Email address (unique)
    pub email: String,

    /// Argon2 password hash
    #[serde(skip_serializing)]
    pub password_hash: String,

    /// Account role
    #[serde(default)]
    pub role: UserRole,

    /// Whether the account has been activated via email confirmation
    pub active: bool,

    /// Ids of users following this account
    pub followers: Vec<i64>,

    /// URL to user's avatar image
    pub avatar_url: Option<String>,

    /// Account creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Full display name.
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// Whether this account may act on resources it does not own.
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }

    /// Whether `follower_id` is in this user's follower list.
    pub fn is_followed_by(&self, follower_id: i64) -> bool {
        self.followers.contains(&follower_id)
    }
}

impl Default for User {
    fn default() -> Self {
        let now = Utc::now();
        Self {
            id: 0,
            first_name: String::new(),
            last_name: String::new(),
            username: String::new(),
            email: String::new(),
            password_hash: String::new(),
            role: UserRole::default(),
            active: false,
            followers: Vec::new(),
            avatar_url: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Repository trait for User data access operations.
///
/// Implementations of this trait handle the actual database interactions.
/// The trait is defined in the domain layer to maintain dependency inversion.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Find a user by their Snowflake ID.
    async fn find_by_id(&self, id: i64) -> Result<Option<User>, AppError>;

    /// Find a user by their email address.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError>;

    /// Find a user by username.
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, AppError>;

    /// Resolve a login that may be either an email address or a username.
    async fn find_by_login(&self, login: &str) -> Result<Option<User>, AppError>;

    /// Search users by username or name prefix.
    async fn search(&self, query: &str, limit: i64) -> Result<Vec<User>, AppError>;

    /// Fetch several users by id, preserving no particular order.
    async fn find_by_ids(&self, ids: &[i64]) -> Result<Vec<User>, AppError>;

    /// Create a new user in the database.
    async fn create(&self, user: &User) -> Result<User, AppError>;

    /// Update an existing user's profile fields.
    async fn update(&self, user: &User) -> Result<User, AppError>;

    /// Delete a user by ID.
    async fn delete(&self, id: i64) -> Result<(), AppError>;

    /// Check if an email address is already registered.
    async fn email_exists(&self, email: &str) -> Result<bool, AppError>;

    /// Check if a username is already taken.
    async fn username_exists(&self, username: &str) -> Result<bool, AppError>;

    /// Mark an account as activated.
    async fn activate(&self, id: i64) -> Result<(), AppError>;

    /// Add a follower to a user's follower list (no-op if already present).
    async fn add_follower(&self, user_id: i64, follower_id: i64) -> Result<User, AppError>;

    /// Remove a follower from a user's follower list (no-op if absent).
    async fn remove_follower(&self, user_id: i64, follower_id: i64) -> Result<User, AppError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_user() -> User {
        User {
            id: 12345678901234567,
            first_name: "Jack".to_string(),
            last_name: "Bourne".to_string(),
            username: "jackb".to_string(),
            email: "jack@example.com".to_string(),
            password_hash: "hashed_password".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_user_role_default_is_user() {
        assert_eq!(UserRole::default(), UserRole::User);
    }

    #[test]
    fn test_user_role_from_str() {
        assert_eq!(UserRole::from_str("admin"), UserRole::Admin);
        assert_eq!(UserRole::from_str("ADMIN"), UserRole::Admin);
        assert_eq!(UserRole::from_str("user"), UserRole::User);
        assert_eq!(UserRole::from_str("unknown"), UserRole::User);
    }

    #[test]
    fn test_user_role_as_str_roundtrip() {
        for role in [UserRole::User, UserRole::Admin] {
            assert_eq!(UserRole::from_str(role.as_str()), role);
        }
    }

    #[test]
    fn test_user_default_is_inactive() {
        let user = User::default();
        assert!(!user.active);
        assert!(user.followers.is_empty());
        assert_eq!(user.role, UserRole::User);
    }

    #[test]
    fn test_full_name() {
        let user = create_test_user();
        assert_eq!(user.full_name(), "Jack Bourne");
    }

    #[test]
    fn test_is_followed_by() {
        let mut user = create_test_user();
        user.followers = vec![1, 2, 3];
        assert!(user.is_followed_by(2));
        assert!(!user.is_followed_by(4));
    }

    #[test]
    fn test_is_admin() {
        let mut user = create_test_user();
        assert!(!user.is_admin());
        user.role = UserRole::Admin;
        assert!(user.is_admin());
    }

    #[test]
    fn test_password_hash_not_serialized() {
        let user = create_test_user();
        let serialized = serde_json::to_string(&user).expect("Failed to serialize user");
        assert!(!serialized.contains("password_hash"));
        assert!(!serialized.contains("hashed_password"));
    }

    #[test]
    fn test_role_serializes_lowercase() {
        let mut user = create_test_user();
        user.role = UserRole::Admin;
        let serialized = serde_json::to_string(&user).expect("Failed to serialize user");
        assert!(serialized.contains("\"role\":\"admin\""));
    }
}
