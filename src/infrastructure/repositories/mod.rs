//! Repository Implementations
//!
//! PostgreSQL implementations of domain repository traits.
//!
//! This module provides concrete implementations of the repository traits
//! defined in the domain layer. Each repository handles data access for
//! a specific entity type.
//!
//! ## Available Repositories
//!
//! - **UserRepository** - User accounts and the follower graph
//! - **TokenRepository** - Single-use purpose tokens
//! - **SessionRepository** - Refresh-token sessions
//! - **RoomRepository** - Chat rooms with subscriber/presence lists
//! - **MessageRepository** - Chat messages
//! - **TweetRepository** - Tweets, likes, and retweet references
//! - **CommentRepository** - Threaded comments
//! - **FileRepository** - Uploaded file metadata

pub mod comment_repository;
pub mod file_repository;
pub mod message_repository;
pub mod room_repository;
pub mod session_repository;
pub mod token_repository;
pub mod tweet_repository;
pub mod user_repository;

pub use comment_repository::PgCommentRepository;
pub use file_repository::PgFileRepository;
pub use message_repository::PgMessageRepository;
pub use room_repository::PgRoomRepository;
pub use session_repository::PgSessionRepository;
pub use token_repository::PgTokenRepository;
pub use tweet_repository::PgTweetRepository;
pub use user_repository::PgUserRepository;
