//! Application Services
//!
//! Business logic services that coordinate domain operations.
//!
//! ## Available Services
//!
//! - **AuthService**: Sign-up, email confirmation, sign-in, token refresh
//! - **UserService**: Profiles, directory search, follow graph
//! - **TweetService**: Tweets, likes, retweets
//! - **CommentService**: Threaded comments
//! - **RoomService**: Room CRUD and membership over REST
//! - **ChatService**: Gateway-facing presence and messaging operations
//! - **UploadService**: File blobs and metadata

pub mod auth_service;
pub mod chat_service;
pub mod comment_service;
pub mod room_service;
pub mod tweet_service;
pub mod upload_service;
pub mod user_service;

pub use auth_service::{
    decode_access_token, AuthError, AuthService, AuthServiceImpl, AuthTokens, Claims, SignUpDto,
};
pub use chat_service::{ChatError, ChatService, ChatServiceImpl};
pub use comment_service::{
    CommentDto, CommentError, CommentService, CommentServiceImpl, CreateCommentDto,
};
pub use room_service::{
    CreateRoomDto, RoomDto, RoomError, RoomMessageDto, RoomService, RoomServiceImpl,
};
pub use tweet_service::{AuthorDto, TweetDto, TweetError, TweetService, TweetServiceImpl};
pub use upload_service::{FileDto, UploadError, UploadService, UploadServiceImpl};
pub use user_service::{UpdateProfileDto, UserDto, UserError, UserService, UserServiceImpl};
