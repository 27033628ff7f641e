//! Response DTOs
//!
//! Data structures for API response bodies. Every success payload is
//! wrapped in the `ApiResponse` envelope; errors use the envelope shape in
//! `shared::error`.

use serde::Serialize;

use crate::application::services::{
    AuthTokens, AuthorDto, CommentDto, FileDto, RoomDto, RoomMessageDto, TweetDto, UserDto,
};

/// Success envelope wrapping every response payload
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub status: &'static str,
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            status: "success",
            data,
        }
    }
}

/// Authentication tokens response
#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: i64,
    pub token_type: String,
}

impl From<AuthTokens> for TokenResponse {
    fn from(tokens: AuthTokens) -> Self {
        Self {
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
            expires_in: tokens.expires_in,
            token_type: tokens.token_type,
        }
    }
}

/// User response
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub username: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub role: String,
    pub active: bool,
    pub avatar_url: Option<String>,
    pub follower_count: i64,
    pub followed_by_viewer: bool,
    pub created_at: String,
}

impl UserResponse {
    /// Project a user DTO; the email is only included for the user's own
    /// profile.
    pub fn from_dto(dto: UserDto, include_email: bool) -> Self {
        Self {
            id: dto.id,
            first_name: dto.first_name,
            last_name: dto.last_name,
            username: dto.username,
            email: if include_email { Some(dto.email) } else { None },
            role: dto.role,
            active: dto.active,
            avatar_url: dto.avatar_url,
            follower_count: dto.follower_count,
            followed_by_viewer: dto.followed_by_viewer,
            created_at: dto.created_at,
        }
    }
}

/// Author summary embedded in content responses
#[derive(Debug, Serialize)]
pub struct AuthorResponse {
    pub id: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub avatar_url: Option<String>,
}

impl From<AuthorDto> for AuthorResponse {
    fn from(dto: AuthorDto) -> Self {
        Self {
            id: dto.id,
            username: dto.username,
            first_name: dto.first_name,
            last_name: dto.last_name,
            avatar_url: dto.avatar_url,
        }
    }
}

/// Tweet response
#[derive(Debug, Serialize)]
pub struct TweetResponse {
    pub id: String,
    pub author: Option<AuthorResponse>,
    pub text: String,
    pub like_count: i64,
    pub retweet_count: i64,
    pub comment_count: i64,
    pub liked_by_viewer: bool,
    pub retweeted_by_viewer: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retweet_of: Option<String>,
    pub created_at: String,
}

impl From<TweetDto> for TweetResponse {
    fn from(dto: TweetDto) -> Self {
        Self {
            id: dto.id,
            author: dto.author.map(AuthorResponse::from),
            text: dto.text,
            like_count: dto.like_count,
            retweet_count: dto.retweet_count,
            comment_count: dto.comment_count,
            liked_by_viewer: dto.liked_by_viewer,
            retweeted_by_viewer: dto.retweeted_by_viewer,
            retweet_of: dto.retweet_of,
            created_at: dto.created_at,
        }
    }
}

/// Comment response
#[derive(Debug, Serialize)]
pub struct CommentResponse {
    pub id: String,
    pub author: Option<AuthorResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tweet_id: Option<String>,
    pub text: String,
    pub like_count: i64,
    pub reply_count: i64,
    pub liked_by_viewer: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_to: Option<String>,
    pub created_at: String,
}

impl From<CommentDto> for CommentResponse {
    fn from(dto: CommentDto) -> Self {
        Self {
            id: dto.id,
            author: dto.author.map(AuthorResponse::from),
            tweet_id: dto.tweet_id,
            text: dto.text,
            like_count: dto.like_count,
            reply_count: dto.reply_count,
            liked_by_viewer: dto.liked_by_viewer,
            reply_to: dto.reply_to,
            created_at: dto.created_at,
        }
    }
}

/// Room response
#[derive(Debug, Serialize)]
pub struct RoomResponse {
    pub id: String,
    pub name: String,
    pub is_public: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub creator_id: Option<String>,
    pub subscribers: Vec<String>,
    pub online: Vec<String>,
    pub created_at: String,
}

impl From<RoomDto> for RoomResponse {
    fn from(dto: RoomDto) -> Self {
        Self {
            id: dto.id,
            name: dto.name,
            is_public: dto.is_public,
            creator_id: dto.creator_id,
            subscribers: dto.subscribers,
            online: dto.online,
            created_at: dto.created_at,
        }
    }
}

/// Room message response
#[derive(Debug, Serialize)]
pub struct RoomMessageResponse {
    pub id: String,
    pub room_id: String,
    pub author: Option<AuthorResponse>,
    pub body: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub edited_at: Option<String>,
    pub created_at: String,
}

impl From<RoomMessageDto> for RoomMessageResponse {
    fn from(dto: RoomMessageDto) -> Self {
        Self {
            id: dto.id,
            room_id: dto.room_id,
            author: dto.author.map(AuthorResponse::from),
            body: dto.body,
            edited_at: dto.edited_at,
            created_at: dto.created_at,
        }
    }
}

/// Uploaded file response
#[derive(Debug, Serialize)]
pub struct FileResponse {
    pub id: String,
    pub original_name: String,
    pub kind: String,
    pub extension: String,
    pub created_at: String,
}

impl From<FileDto> for FileResponse {
    fn from(dto: FileDto) -> Self {
        Self {
            id: dto.id,
            original_name: dto.original_name,
            kind: dto.kind,
            extension: dto.extension,
            created_at: dto.created_at,
        }
    }
}
