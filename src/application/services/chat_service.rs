//! Chat Service
//!
//! Domain operations behind the WebSocket gateway: presence enter/leave and
//! room-scoped message create/edit/delete. The gateway maps socket events
//! onto these calls and broadcasts what they return.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;

use crate::domain::{ChatMessage, MessageRepository, Room, RoomRepository, UserRepository};
use crate::shared::snowflake::SnowflakeGenerator;

use super::room_service::RoomMessageDto;
use super::tweet_service::AuthorDto;

/// Chat service trait
#[async_trait]
pub trait ChatService: Send + Sync {
    /// Validate that a connecting user exists, returning their summary
    async fn connect(&self, user_id: i64) -> Result<AuthorDto, ChatError>;

    /// Enter a room: subscriber check, presence add, updated online list
    async fn enter_room(&self, room_id: i64, user_id: i64) -> Result<Vec<AuthorDto>, ChatError>;

    /// Leave a room: presence remove, updated online list
    async fn leave_room(&self, room_id: i64, user_id: i64) -> Result<Vec<AuthorDto>, ChatError>;

    /// Persist a message in a room the author is subscribed to
    async fn new_message(
        &self,
        room_id: i64,
        user_id: i64,
        body: &str,
    ) -> Result<RoomMessageDto, ChatError>;

    /// Edit a message; only its author may do this
    async fn edit_message(
        &self,
        room_id: i64,
        user_id: i64,
        message_id: i64,
        body: &str,
    ) -> Result<RoomMessageDto, ChatError>;

    /// Delete a message; any subscriber of the room may do this
    async fn delete_message(
        &self,
        room_id: i64,
        user_id: i64,
        message_id: i64,
    ) -> Result<i64, ChatError>;
}

/// Chat service errors, each emitted as a `connect_error` event to the
/// originating connection only.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("Room not found")]
    RoomNotFound,

    #[error("User not found")]
    UserNotFound,

    #[error("Message not found")]
    MessageNotFound,

    #[error("Not a subscriber of this room")]
    NotSubscriber,

    #[error("Not the author of this message")]
    NotAuthor,

    #[error("Internal error: {0}")]
    Internal(String),
}

/// ChatService implementation
pub struct ChatServiceImpl<R, M, U>
where
    R: RoomRepository,
    M: MessageRepository,
    U: UserRepository,
{
    room_repo: Arc<R>,
    message_repo: Arc<M>,
    user_repo: Arc<U>,
    id_generator: Arc<SnowflakeGenerator>,
}

impl<R, M, U> ChatServiceImpl<R, M, U>
where
    R: RoomRepository,
    M: MessageRepository,
    U: UserRepository,
{
    pub fn new(
        room_repo: Arc<R>,
        message_repo: Arc<M>,
        user_repo: Arc<U>,
        id_generator: Arc<SnowflakeGenerator>,
    ) -> Self {
        Self {
            room_repo,
            message_repo,
            user_repo,
            id_generator,
        }
    }

    async fn require_room(&self, room_id: i64) -> Result<Room, ChatError> {
        self.room_repo
            .find_by_id(room_id)
            .await
            .map_err(|e| ChatError::Internal(e.to_string()))?
            .ok_or(ChatError::RoomNotFound)
    }

    async fn require_subscriber(&self, room_id: i64, user_id: i64) -> Result<Room, ChatError> {
        let room = self.require_room(room_id).await?;
        if !room.is_subscriber(user_id) {
            return Err(ChatError::NotSubscriber);
        }
        Ok(room)
    }

    async fn require_message(&self, room_id: i64, message_id: i64) -> Result<ChatMessage, ChatError> {
        let message = self
            .message_repo
            .find_by_id(message_id)
            .await
            .map_err(|e| ChatError::Internal(e.to_string()))?
            .ok_or(ChatError::MessageNotFound)?;

        if message.room_id != room_id {
            return Err(ChatError::MessageNotFound);
        }

        Ok(message)
    }

    /// Resolve a room's online id list to user summaries
    async fn online_users(&self, online: &[i64]) -> Result<Vec<AuthorDto>, ChatError> {
        if online.is_empty() {
            return Ok(Vec::new());
        }

        let users = self
            .user_repo
            .find_by_ids(online)
            .await
            .map_err(|e| ChatError::Internal(e.to_string()))?;

        Ok(users.into_iter().map(AuthorDto::from).collect())
    }

    async fn project_message(&self, message: ChatMessage) -> Result<RoomMessageDto, ChatError> {
        let author = self
            .user_repo
            .find_by_id(message.author_id)
            .await
            .map_err(|e| ChatError::Internal(e.to_string()))?
            .map(AuthorDto::from);

        Ok(RoomMessageDto {
            id: message.id.to_string(),
            room_id: message.room_id.to_string(),
            author,
            body: message.body,
            edited_at: message.edited_at.map(|t| t.to_rfc3339()),
            created_at: message.created_at.to_rfc3339(),
        })
    }
}

#[async_trait]
impl<R, M, U> ChatService for ChatServiceImpl<R, M, U>
where
    R: RoomRepository + 'static,
    M: MessageRepository + 'static,
    U: UserRepository + 'static,
{
    async fn connect(&self, user_id: i64) -> Result<AuthorDto, ChatError> {
        let user = self
            .user_repo
            .find_by_id(user_id)
            .await
            .map_err(|e| ChatError::Internal(e.to_string()))?
            .ok_or(ChatError::UserNotFound)?;

        Ok(AuthorDto::from(user))
    }

    async fn enter_room(&self, room_id: i64, user_id: i64) -> Result<Vec<AuthorDto>, ChatError> {
        self.user_repo
            .find_by_id(user_id)
            .await
            .map_err(|e| ChatError::Internal(e.to_string()))?
            .ok_or(ChatError::UserNotFound)?;

        self.require_subscriber(room_id, user_id).await?;

        let updated = self
            .room_repo
            .add_online(room_id, user_id)
            .await
            .map_err(|e| ChatError::Internal(e.to_string()))?;

        self.online_users(&updated.online).await
    }

    async fn leave_room(&self, room_id: i64, user_id: i64) -> Result<Vec<AuthorDto>, ChatError> {
        self.require_room(room_id).await?;

        let updated = self
            .room_repo
            .remove_online(room_id, user_id)
            .await
            .map_err(|e| ChatError::Internal(e.to_string()))?;

        self.online_users(&updated.online).await
    }

    async fn new_message(
        &self,
        room_id: i64,
        user_id: i64,
        body: &str,
    ) -> Result<RoomMessageDto, ChatError> {
        self.require_subscriber(room_id, user_id).await?;

        let message = ChatMessage {
            id: self.id_generator.generate(),
            room_id,
            author_id: user_id,
            body: body.to_string(),
            edited_at: None,
            created_at: Utc::now(),
        };

        let created = self
            .message_repo
            .create(&message)
            .await
            .map_err(|e| ChatError::Internal(e.to_string()))?;

        self.project_message(created).await
    }

    async fn edit_message(
        &self,
        room_id: i64,
        user_id: i64,
        message_id: i64,
        body: &str,
    ) -> Result<RoomMessageDto, ChatError> {
        self.require_subscriber(room_id, user_id).await?;

        let message = self.require_message(room_id, message_id).await?;
        if !message.is_author(user_id) {
            return Err(ChatError::NotAuthor);
        }

        let updated = self
            .message_repo
            .update_body(message_id, body)
            .await
            .map_err(|e| ChatError::Internal(e.to_string()))?;

        self.project_message(updated).await
    }

    async fn delete_message(
        &self,
        room_id: i64,
        user_id: i64,
        message_id: i64,
    ) -> Result<i64, ChatError> {
        self.require_subscriber(room_id, user_id).await?;
        self.require_message(room_id, message_id).await?;

        self.message_repo
            .delete(message_id)
            .await
            .map_err(|e| ChatError::Internal(e.to_string()))?;

        Ok(message_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::message::MockMessageRepository;
    use crate::domain::entities::room::MockRoomRepository;
    use crate::domain::entities::user::MockUserRepository;
    use crate::domain::User;

    fn room(subscribers: Vec<i64>, online: Vec<i64>) -> Room {
        let now = Utc::now();
        Room {
            id: 5,
            name: "den".into(),
            creator_id: None,
            subscribers,
            online,
            created_at: now,
            updated_at: now,
        }
    }

    fn service_with(
        room_repo: MockRoomRepository,
        message_repo: MockMessageRepository,
        user_repo: MockUserRepository,
    ) -> ChatServiceImpl<MockRoomRepository, MockMessageRepository, MockUserRepository> {
        ChatServiceImpl::new(
            Arc::new(room_repo),
            Arc::new(message_repo),
            Arc::new(user_repo),
            Arc::new(SnowflakeGenerator::new(1, 0)),
        )
    }

    #[tokio::test]
    async fn test_enter_room_rejects_non_subscriber_without_presence_write() {
        let mut room_repo = MockRoomRepository::new();
        let mut user_repo = MockUserRepository::new();

        user_repo
            .expect_find_by_id()
            .returning(|id| Ok(Some(User { id, active: true, ..Default::default() })));
        room_repo
            .expect_find_by_id()
            .returning(|_| Ok(Some(room(vec![1], vec![]))));
        // No expectation for add_online: reaching it would panic, so the
        // online list provably stays untouched.

        let service = service_with(room_repo, MockMessageRepository::new(), user_repo);
        let result = service.enter_room(5, 42).await;

        assert!(matches!(result, Err(ChatError::NotSubscriber)));
    }

    #[tokio::test]
    async fn test_enter_room_adds_presence_and_returns_online_users() {
        let mut room_repo = MockRoomRepository::new();
        let mut user_repo = MockUserRepository::new();

        user_repo
            .expect_find_by_id()
            .returning(|id| Ok(Some(User { id, active: true, ..Default::default() })));
        user_repo.expect_find_by_ids().returning(|ids| {
            Ok(ids
                .iter()
                .map(|id| User { id: *id, username: format!("u{}", id), ..Default::default() })
                .collect())
        });
        room_repo
            .expect_find_by_id()
            .returning(|_| Ok(Some(room(vec![1, 2], vec![1]))));
        room_repo
            .expect_add_online()
            .withf(|room_id, user_id| *room_id == 5 && *user_id == 2)
            .times(1)
            .returning(|_, user_id| Ok(room(vec![1, 2], vec![1, user_id])));

        let service = service_with(room_repo, MockMessageRepository::new(), user_repo);
        let online = service.enter_room(5, 2).await.unwrap();

        assert_eq!(online.len(), 2);
    }

    #[tokio::test]
    async fn test_connect_unknown_user_rejected() {
        let mut user_repo = MockUserRepository::new();
        user_repo.expect_find_by_id().returning(|_| Ok(None));

        let service = service_with(
            MockRoomRepository::new(),
            MockMessageRepository::new(),
            user_repo,
        );

        assert!(matches!(service.connect(42).await, Err(ChatError::UserNotFound)));
    }

    #[tokio::test]
    async fn test_new_message_requires_subscription() {
        let mut room_repo = MockRoomRepository::new();
        room_repo
            .expect_find_by_id()
            .returning(|_| Ok(Some(room(vec![1], vec![]))));

        let service = service_with(
            room_repo,
            MockMessageRepository::new(),
            MockUserRepository::new(),
        );

        assert!(matches!(
            service.new_message(5, 42, "hi").await,
            Err(ChatError::NotSubscriber)
        ));
    }

    #[tokio::test]
    async fn test_edit_message_requires_authorship() {
        let mut room_repo = MockRoomRepository::new();
        let mut message_repo = MockMessageRepository::new();

        room_repo
            .expect_find_by_id()
            .returning(|_| Ok(Some(room(vec![1, 2], vec![]))));
        message_repo.expect_find_by_id().returning(|id| {
            Ok(Some(ChatMessage {
                id,
                room_id: 5,
                author_id: 1,
                body: "hi".into(),
                edited_at: None,
                created_at: Utc::now(),
            }))
        });

        let service = service_with(room_repo, message_repo, MockUserRepository::new());

        assert!(matches!(
            service.edit_message(5, 2, 9, "edited").await,
            Err(ChatError::NotAuthor)
        ));
    }

    #[tokio::test]
    async fn test_delete_message_allows_any_subscriber() {
        let mut room_repo = MockRoomRepository::new();
        let mut message_repo = MockMessageRepository::new();

        room_repo
            .expect_find_by_id()
            .returning(|_| Ok(Some(room(vec![1, 2], vec![]))));
        message_repo.expect_find_by_id().returning(|id| {
            Ok(Some(ChatMessage {
                id,
                room_id: 5,
                author_id: 1,
                body: "hi".into(),
                edited_at: None,
                created_at: Utc::now(),
            }))
        });
        message_repo.expect_delete().times(1).returning(|_| Ok(()));

        let service = service_with(room_repo, message_repo, MockUserRepository::new());

        // User 2 is a subscriber but not the author; delete still succeeds
        assert_eq!(service.delete_message(5, 2, 9).await.unwrap(), 9);
    }

    #[tokio::test]
    async fn test_message_in_wrong_room_is_not_found() {
        let mut room_repo = MockRoomRepository::new();
        let mut message_repo = MockMessageRepository::new();

        room_repo
            .expect_find_by_id()
            .returning(|_| Ok(Some(room(vec![1], vec![]))));
        message_repo.expect_find_by_id().returning(|id| {
            Ok(Some(ChatMessage {
                id,
                room_id: 777,
                author_id: 1,
                body: "hi".into(),
                edited_at: None,
                created_at: Utc::now(),
            }))
        });

        let service = service_with(room_repo, message_repo, MockUserRepository::new());

        assert!(matches!(
            service.delete_message(5, 1, 9).await,
            Err(ChatError::MessageNotFound)
        ));
    }
}
