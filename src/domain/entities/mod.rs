//! # Domain Entities
//!
//! Core domain entities representing the main business objects.
//! All entities map directly to their corresponding database tables.
//!
//! ## Core Entities
//!
//! - **User**: Account with credentials, role, and follower graph
//! - **Token**: Single-use purpose token (email confirmation etc.)
//! - **Session**: Refresh-token session
//! - **Room**: Chat room with subscriber and presence lists
//! - **ChatMessage**: A message sent in a room
//! - **Tweet**: A post with likes and retweet references
//! - **Comment**: A threaded comment on a tweet
//! - **StoredFile**: Metadata for an uploaded blob

pub mod comment;
pub mod message;
pub mod room;
pub mod session;
pub mod token;
pub mod tweet;
pub mod upload;
pub mod user;

pub use comment::{Comment, CommentRepository};
pub use message::{ChatMessage, MessageRepository};
pub use room::{Room, RoomRepository};
pub use session::{Session, SessionRepository};
pub use token::{Token, TokenRepository, TokenType};
pub use tweet::{Tweet, TweetRepository};
pub use upload::{FileKind, FileRepository, StoredFile};
pub use user::{User, UserRepository, UserRole};
