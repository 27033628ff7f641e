//! Request DTOs
//!
//! Data structures for API request bodies. Format validation runs here,
//! before any uniqueness check or store access.

use serde::Deserialize;
use validator::Validate;

use crate::shared::validation::validate_password_strength;

/// Sign-up request
#[derive(Debug, Deserialize, Validate)]
pub struct SignUpRequest {
    #[validate(length(min = 1, max = 64, message = "First name must be 1-64 characters"))]
    pub first_name: String,

    #[validate(length(min = 1, max = 64, message = "Last name must be 1-64 characters"))]
    pub last_name: String,

    #[validate(length(min = 2, max = 32, message = "Username must be 2-32 characters"))]
    pub username: String,

    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(
        length(min = 6, message = "Password must be at least 6 characters"),
        custom(function = validate_password_strength)
    )]
    pub password: String,
}

/// Sign-in request; login may be an email address or a username
#[derive(Debug, Deserialize, Validate)]
pub struct SignInRequest {
    #[validate(length(min = 1, message = "Login must not be empty"))]
    pub login: String,

    #[validate(length(min = 1, message = "Password must not be empty"))]
    pub password: String,
}

/// Update user profile request
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateUserRequest {
    #[validate(length(min = 1, max = 64, message = "First name must be 1-64 characters"))]
    pub first_name: Option<String>,

    #[validate(length(min = 1, max = 64, message = "Last name must be 1-64 characters"))]
    pub last_name: Option<String>,

    #[validate(length(min = 2, max = 32, message = "Username must be 2-32 characters"))]
    pub username: Option<String>,

    pub avatar_url: Option<String>,
}

/// User search query parameters
#[derive(Debug, Deserialize)]
pub struct UserSearchParams {
    pub q: Option<String>,
    pub limit: Option<i64>,
}

/// Create tweet request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateTweetRequest {
    #[validate(length(min = 1, max = 280, message = "Text must be 1-280 characters"))]
    pub text: String,
}

/// Update tweet request
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateTweetRequest {
    #[validate(length(min = 1, max = 280, message = "Text must be 1-280 characters"))]
    pub text: String,
}

/// Retweet request; the quote text is optional
#[derive(Debug, Deserialize, Validate)]
pub struct RetweetRequest {
    #[validate(length(max = 280, message = "Text must be at most 280 characters"))]
    #[serde(default)]
    pub text: String,
}

/// Feed query parameters
#[derive(Debug, Deserialize)]
pub struct FeedParams {
    pub limit: Option<i64>,
}

/// Create comment request; targets a tweet, a parent comment, or both
#[derive(Debug, Deserialize, Validate)]
pub struct CreateCommentRequest {
    #[validate(length(min = 1, max = 280, message = "Text must be 1-280 characters"))]
    pub text: String,

    pub tweet_id: Option<String>,
    pub reply_to: Option<String>,
}

/// Update comment request
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateCommentRequest {
    #[validate(length(min = 1, max = 280, message = "Text must be 1-280 characters"))]
    pub text: String,
}

/// Create room request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateRoomRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: String,

    pub is_public: bool,

    pub user_to_add: Option<String>,
}

/// Subscribe request; `user_id` is only meaningful for private rooms
#[derive(Debug, Deserialize, Default)]
pub struct SubscribeRequest {
    pub user_id: Option<String>,
}

/// Room message history query parameters
#[derive(Debug, Deserialize)]
pub struct MessagesParams {
    pub limit: Option<i64>,
}

/// File listing query parameters
#[derive(Debug, Deserialize)]
pub struct FileListParams {
    pub kind: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sign_up(email: &str, password: &str) -> SignUpRequest {
        SignUpRequest {
            first_name: "Jack".into(),
            last_name: "Bourne".into(),
            username: "jackb".into(),
            email: email.into(),
            password: password.into(),
        }
    }

    #[test]
    fn test_sign_up_accepts_valid_input() {
        assert!(sign_up("jack@example.com", "Passw0rd").validate().is_ok());
    }

    #[test]
    fn test_sign_up_rejects_bad_email() {
        assert!(sign_up("not-an-email", "Passw0rd").validate().is_err());
    }

    #[test]
    fn test_sign_up_rejects_short_password() {
        assert!(sign_up("jack@example.com", "Pw0").validate().is_err());
    }

    #[test]
    fn test_sign_up_rejects_weak_password() {
        assert!(sign_up("jack@example.com", "password1").validate().is_err());
        assert!(sign_up("jack@example.com", "PASSWORD1").validate().is_err());
        assert!(sign_up("jack@example.com", "Password").validate().is_err());
    }

    #[test]
    fn test_tweet_text_bounds() {
        assert!(CreateTweetRequest { text: "x".repeat(280) }.validate().is_ok());
        assert!(CreateTweetRequest { text: "x".repeat(281) }.validate().is_err());
        assert!(CreateTweetRequest { text: String::new() }.validate().is_err());
    }
}
