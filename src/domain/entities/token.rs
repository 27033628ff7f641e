//! Purpose token entity and repository trait.
//!
//! Single-use, time-boxed credentials persisted in the `tokens` table.
//! Confirm-email tokens prove control of an address; the other types back
//! the password-reset and email-change flows.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::shared::error::AppError;

/// Token purpose, matching the database VARCHAR constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TokenType {
    ConfirmEmail,
    ResetPassword,
    ChangeEmail,
}

impl TokenType {
    /// Convert from database string representation.
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "confirm-email" => Some(Self::ConfirmEmail),
            "reset-password" => Some(Self::ResetPassword),
            "change-email" => Some(Self::ChangeEmail),
            _ => None,
        }
    }

    /// Convert to database string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ConfirmEmail => "confirm-email",
            Self::ResetPassword => "reset-password",
            Self::ChangeEmail => "change-email",
        }
    }

    /// Fixed lifetime for tokens of this type.
    pub fn lifetime(&self) -> Duration {
        match self {
            Self::ConfirmEmail => Duration::minutes(5),
            Self::ResetPassword => Duration::minutes(15),
            Self::ChangeEmail => Duration::minutes(15),
        }
    }
}

impl std::fmt::Display for TokenType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single-use purpose token.
///
/// Maps to the `tokens` table:
/// - id: BIGINT PRIMARY KEY (Snowflake ID)
/// - body: VARCHAR(64) NOT NULL UNIQUE (random, unguessable)
/// - user_id: BIGINT NOT NULL REFERENCES users(id) ON DELETE CASCADE
/// - token_type: VARCHAR(20) NOT NULL
/// - created_at: TIMESTAMPTZ NOT NULL DEFAULT NOW()
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Token {
    /// Snowflake ID (primary key)
    pub id: i64,

    /// Opaque random body handed to the user
    pub body: String,

    /// Owner of the token
    pub user_id: i64,

    /// What redeeming this token proves
    pub token_type: TokenType,

    /// Creation timestamp; expiry is `created_at + token_type.lifetime()`
    pub created_at: DateTime<Utc>,
}

impl Token {
    /// Whether the token's lifetime has elapsed.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now - self.created_at > self.token_type.lifetime()
    }
}

/// Repository trait for purpose-token data access operations.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TokenRepository: Send + Sync {
    /// Persist a new token.
    async fn create(&self, token: &Token) -> Result<Token, AppError>;

    /// Look up a token by (body, type).
    async fn find_by_body(
        &self,
        body: &str,
        token_type: TokenType,
    ) -> Result<Option<Token>, AppError>;

    /// Delete a token by id (redemption or cleanup).
    async fn delete(&self, id: i64) -> Result<(), AppError>;

    /// Delete all tokens owned by a user (user deletion).
    async fn delete_for_user(&self, user_id: i64) -> Result<u64, AppError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token_created_at(created_at: DateTime<Utc>) -> Token {
        Token {
            id: 1,
            body: "abc123".into(),
            user_id: 42,
            token_type: TokenType::ConfirmEmail,
            created_at,
        }
    }

    #[test]
    fn test_fresh_token_is_not_expired() {
        let now = Utc::now();
        let token = token_created_at(now);
        assert!(!token.is_expired(now));
    }

    #[test]
    fn test_token_within_lifetime_is_not_expired() {
        let now = Utc::now();
        let token = token_created_at(now - Duration::minutes(4));
        assert!(!token.is_expired(now));
    }

    #[test]
    fn test_token_past_lifetime_is_expired() {
        let now = Utc::now();
        let token = token_created_at(now - Duration::minutes(6));
        assert!(token.is_expired(now));
    }

    #[test]
    fn test_token_type_roundtrip() {
        for t in [
            TokenType::ConfirmEmail,
            TokenType::ResetPassword,
            TokenType::ChangeEmail,
        ] {
            assert_eq!(TokenType::from_str(t.as_str()), Some(t));
        }
        assert_eq!(TokenType::from_str("bogus"), None);
    }

    #[test]
    fn test_confirm_email_lifetime_is_five_minutes() {
        assert_eq!(TokenType::ConfirmEmail.lifetime(), Duration::minutes(5));
    }
}
