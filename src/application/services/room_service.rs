//! Room Service
//!
//! Room CRUD and membership over REST. Creating a private room performs a
//! synchronous enter-on-create: creator and invitee are subscribed and
//! marked online before any client connects. Creation, subscription, and
//! presence are independent writes with no shared transaction.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;

use crate::domain::{MessageRepository, Room, RoomRepository, User, UserRepository};
use crate::shared::snowflake::SnowflakeGenerator;

use super::tweet_service::AuthorDto;

/// Room service trait
#[async_trait]
pub trait RoomService: Send + Sync {
    /// Create a room. A private room may name an invitee to add on create.
    async fn create_room(
        &self,
        creator: &User,
        request: CreateRoomDto,
    ) -> Result<RoomDto, RoomError>;

    /// Rooms visible to the viewer: public rooms plus subscriptions
    async fn list_rooms(&self, viewer_id: i64) -> Result<Vec<RoomDto>, RoomError>;

    /// Fetch a room the viewer may see
    async fn get_room(&self, room_id: i64, viewer_id: i64) -> Result<RoomDto, RoomError>;

    /// Delete a room; only its creator may do this
    async fn delete_room(&self, room_id: i64, actor: &User) -> Result<(), RoomError>;

    /// Join a public room, or (creator only) add a user to a private room
    async fn subscribe(
        &self,
        room_id: i64,
        actor: &User,
        user_to_add: Option<i64>,
    ) -> Result<RoomDto, RoomError>;

    /// Remove the caller from the room; a no-op when already absent
    async fn unsubscribe(&self, room_id: i64, actor_id: i64) -> Result<RoomDto, RoomError>;

    /// Message history of a room (subscribers only)
    async fn messages(
        &self,
        room_id: i64,
        viewer_id: i64,
        limit: i64,
    ) -> Result<Vec<RoomMessageDto>, RoomError>;
}

/// Create room request
#[derive(Debug, Clone)]
pub struct CreateRoomDto {
    pub name: String,
    pub is_public: bool,
    pub user_to_add: Option<i64>,
}

/// Room data transfer object
#[derive(Debug, Clone)]
pub struct RoomDto {
    pub id: String,
    pub name: String,
    pub is_public: bool,
    pub creator_id: Option<String>,
    pub subscribers: Vec<String>,
    pub online: Vec<String>,
    pub created_at: String,
}

impl From<Room> for RoomDto {
    fn from(room: Room) -> Self {
        Self {
            id: room.id.to_string(),
            name: room.name,
            is_public: room.creator_id.is_none(),
            creator_id: room.creator_id.map(|id| id.to_string()),
            subscribers: room.subscribers.iter().map(|id| id.to_string()).collect(),
            online: room.online.iter().map(|id| id.to_string()).collect(),
            created_at: room.created_at.to_rfc3339(),
        }
    }
}

/// Message projection for room history
#[derive(Debug, Clone)]
pub struct RoomMessageDto {
    pub id: String,
    pub room_id: String,
    pub author: Option<AuthorDto>,
    pub body: String,
    pub edited_at: Option<String>,
    pub created_at: String,
}

/// Room service errors
#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    #[error("Room not found")]
    NotFound,

    #[error("User not found")]
    UserNotFound,

    #[error("Not allowed to manage this room")]
    Forbidden,

    #[error("Not a subscriber of this room")]
    NotSubscriber,

    #[error("Internal error: {0}")]
    Internal(String),
}

/// RoomService implementation
pub struct RoomServiceImpl<R, M, U>
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

impl<R, M, U> RoomServiceImpl<R, M, U>
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

    async fn require_room(&self, room_id: i64) -> Result<Room, RoomError> {
        self.room_repo
            .find_by_id(room_id)
            .await
            .map_err(|e| RoomError::Internal(e.to_string()))?
            .ok_or(RoomError::NotFound)
    }
}

#[async_trait]
impl<R, M, U> RoomService for RoomServiceImpl<R, M, U>
where
    R: RoomRepository + 'static,
    M: MessageRepository + 'static,
    U: UserRepository + 'static,
{
    async fn create_room(
        &self,
        creator: &User,
        request: CreateRoomDto,
    ) -> Result<RoomDto, RoomError> {
        if let Some(user_to_add) = request.user_to_add {
            self.user_repo
                .find_by_id(user_to_add)
                .await
                .map_err(|e| RoomError::Internal(e.to_string()))?
                .ok_or(RoomError::UserNotFound)?;
        }

        let now = Utc::now();
        let room = Room {
            id: self.id_generator.generate(),
            name: request.name,
            creator_id: if request.is_public { None } else { Some(creator.id) },
            subscribers: Vec::new(),
            online: Vec::new(),
            created_at: now,
            updated_at: now,
        };

        // Create, subscribe, and presence-enter are separate writes; a
        // crash in between leaves partial state.
        let room = self
            .room_repo
            .create(&room)
            .await
            .map_err(|e| RoomError::Internal(e.to_string()))?;

        let mut updated = self
            .room_repo
            .add_subscriber(room.id, creator.id)
            .await
            .map_err(|e| RoomError::Internal(e.to_string()))?;

        if !request.is_public {
            if let Some(user_to_add) = request.user_to_add {
                self.room_repo
                    .add_subscriber(room.id, user_to_add)
                    .await
                    .map_err(|e| RoomError::Internal(e.to_string()))?;

                self.room_repo
                    .add_online(room.id, user_to_add)
                    .await
                    .map_err(|e| RoomError::Internal(e.to_string()))?;
            }

            // Enter-on-create: the creator is online before any socket joins
            updated = self
                .room_repo
                .add_online(room.id, creator.id)
                .await
                .map_err(|e| RoomError::Internal(e.to_string()))?;
        }

        tracing::info!(room_id = room.id, creator_id = creator.id, "Room created");

        Ok(RoomDto::from(updated))
    }

    async fn list_rooms(&self, viewer_id: i64) -> Result<Vec<RoomDto>, RoomError> {
        let rooms = self
            .room_repo
            .find_visible_to(viewer_id)
            .await
            .map_err(|e| RoomError::Internal(e.to_string()))?;

        Ok(rooms.into_iter().map(RoomDto::from).collect())
    }

    async fn get_room(&self, room_id: i64, viewer_id: i64) -> Result<RoomDto, RoomError> {
        let room = self.require_room(room_id).await?;

        if !room.is_public() && !room.is_subscriber(viewer_id) && !room.is_creator(viewer_id) {
            return Err(RoomError::Forbidden);
        }

        Ok(RoomDto::from(room))
    }

    async fn delete_room(&self, room_id: i64, actor: &User) -> Result<(), RoomError> {
        let room = self.require_room(room_id).await?;

        if !room.is_creator(actor.id) {
            return Err(RoomError::Forbidden);
        }

        self.room_repo
            .delete(room_id)
            .await
            .map_err(|e| RoomError::Internal(e.to_string()))?;

        tracing::info!(room_id = room_id, actor_id = actor.id, "Room deleted");
        Ok(())
    }

    async fn subscribe(
        &self,
        room_id: i64,
        actor: &User,
        user_to_add: Option<i64>,
    ) -> Result<RoomDto, RoomError> {
        let room = self.require_room(room_id).await?;

        let target = match (room.is_public(), user_to_add) {
            // Anyone joins a public room themselves
            (true, None) => actor.id,
            // Adding someone else to a public room is not a thing
            (true, Some(_)) => return Err(RoomError::Forbidden),
            // Only the creator manages a private room's membership
            (false, target) => {
                if !room.is_creator(actor.id) {
                    return Err(RoomError::Forbidden);
                }
                target.unwrap_or(actor.id)
            }
        };

        self.user_repo
            .find_by_id(target)
            .await
            .map_err(|e| RoomError::Internal(e.to_string()))?
            .ok_or(RoomError::UserNotFound)?;

        let updated = self
            .room_repo
            .add_subscriber(room_id, target)
            .await
            .map_err(|e| RoomError::Internal(e.to_string()))?;

        Ok(RoomDto::from(updated))
    }

    async fn unsubscribe(&self, room_id: i64, actor_id: i64) -> Result<RoomDto, RoomError> {
        // Removing an absent user is a no-op that returns the room unchanged
        self.require_room(room_id).await?;

        self.room_repo
            .remove_online(room_id, actor_id)
            .await
            .map_err(|e| RoomError::Internal(e.to_string()))?;

        let updated = self
            .room_repo
            .remove_subscriber(room_id, actor_id)
            .await
            .map_err(|e| RoomError::Internal(e.to_string()))?;

        Ok(RoomDto::from(updated))
    }

    async fn messages(
        &self,
        room_id: i64,
        viewer_id: i64,
        limit: i64,
    ) -> Result<Vec<RoomMessageDto>, RoomError> {
        let room = self.require_room(room_id).await?;

        if !room.is_subscriber(viewer_id) {
            return Err(RoomError::NotSubscriber);
        }

        let messages = self
            .message_repo
            .find_by_room(room_id, limit)
            .await
            .map_err(|e| RoomError::Internal(e.to_string()))?;

        // One author lookup per message
        let mut dtos = Vec::with_capacity(messages.len());
        for message in messages {
            let author = self
                .user_repo
                .find_by_id(message.author_id)
                .await
                .map_err(|e| RoomError::Internal(e.to_string()))?
                .map(AuthorDto::from);

            dtos.push(RoomMessageDto {
                id: message.id.to_string(),
                room_id: message.room_id.to_string(),
                author,
                body: message.body,
                edited_at: message.edited_at.map(|t| t.to_rfc3339()),
                created_at: message.created_at.to_rfc3339(),
            });
        }

        Ok(dtos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::message::MockMessageRepository;
    use crate::domain::entities::room::MockRoomRepository;
    use crate::domain::entities::user::MockUserRepository;
    use std::sync::Mutex;

    fn creator() -> User {
        User { id: 1, username: "creator".into(), active: true, ..Default::default() }
    }

    fn empty_room(id: i64, creator_id: Option<i64>) -> Room {
        let now = Utc::now();
        Room {
            id,
            name: "den".into(),
            creator_id,
            subscribers: Vec::new(),
            online: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Room repository mock backed by a single shared room value, so the
    /// subscribe/online writes of enter-on-create accumulate.
    fn accumulating_room_repo(creator_id: Option<i64>) -> MockRoomRepository {
        let state = Arc::new(Mutex::new(empty_room(0, creator_id)));
        let mut repo = MockRoomRepository::new();

        {
            let state = state.clone();
            repo.expect_create().returning(move |room| {
                let mut guard = state.lock().unwrap();
                *guard = room.clone();
                Ok(guard.clone())
            });
        }
        {
            let state = state.clone();
            repo.expect_add_subscriber().returning(move |_, user_id| {
                let mut guard = state.lock().unwrap();
                if !guard.subscribers.contains(&user_id) {
                    guard.subscribers.push(user_id);
                }
                Ok(guard.clone())
            });
        }
        {
            let state = state.clone();
            repo.expect_add_online().returning(move |_, user_id| {
                let mut guard = state.lock().unwrap();
                if !guard.online.contains(&user_id) {
                    guard.online.push(user_id);
                }
                Ok(guard.clone())
            });
        }

        repo
    }

    fn service_with(
        room_repo: MockRoomRepository,
        message_repo: MockMessageRepository,
        user_repo: MockUserRepository,
    ) -> RoomServiceImpl<MockRoomRepository, MockMessageRepository, MockUserRepository> {
        RoomServiceImpl::new(
            Arc::new(room_repo),
            Arc::new(message_repo),
            Arc::new(user_repo),
            Arc::new(SnowflakeGenerator::new(1, 0)),
        )
    }

    #[tokio::test]
    async fn test_private_room_create_subscribes_and_enters_both_users() {
        let room_repo = accumulating_room_repo(Some(1));
        let mut user_repo = MockUserRepository::new();
        user_repo
            .expect_find_by_id()
            .returning(|id| Ok(Some(User { id, active: true, ..Default::default() })));

        let service = service_with(room_repo, MockMessageRepository::new(), user_repo);

        let dto = service
            .create_room(
                &creator(),
                CreateRoomDto {
                    name: "den".into(),
                    is_public: false,
                    user_to_add: Some(2),
                },
            )
            .await
            .unwrap();

        assert!(!dto.is_public);
        assert!(dto.subscribers.contains(&"1".to_string()));
        assert!(dto.subscribers.contains(&"2".to_string()));
        assert!(dto.online.contains(&"1".to_string()));
        assert!(dto.online.contains(&"2".to_string()));
    }

    #[tokio::test]
    async fn test_public_room_create_subscribes_creator_only() {
        let room_repo = accumulating_room_repo(None);

        let service = service_with(
            room_repo,
            MockMessageRepository::new(),
            MockUserRepository::new(),
        );

        let dto = service
            .create_room(
                &creator(),
                CreateRoomDto {
                    name: "lobby".into(),
                    is_public: true,
                    user_to_add: None,
                },
            )
            .await
            .unwrap();

        assert!(dto.is_public);
        assert_eq!(dto.subscribers, vec!["1".to_string()]);
        assert!(dto.online.is_empty());
    }

    #[tokio::test]
    async fn test_delete_room_by_non_creator_forbidden() {
        let mut room_repo = MockRoomRepository::new();
        room_repo
            .expect_find_by_id()
            .returning(|id| Ok(Some(empty_room(id, Some(1)))));

        let service = service_with(
            room_repo,
            MockMessageRepository::new(),
            MockUserRepository::new(),
        );

        let stranger = User { id: 99, ..Default::default() };
        assert!(matches!(
            service.delete_room(5, &stranger).await,
            Err(RoomError::Forbidden)
        ));
    }

    #[tokio::test]
    async fn test_public_room_has_no_deletable_creator() {
        let mut room_repo = MockRoomRepository::new();
        room_repo
            .expect_find_by_id()
            .returning(|id| Ok(Some(empty_room(id, None))));

        let service = service_with(
            room_repo,
            MockMessageRepository::new(),
            MockUserRepository::new(),
        );

        assert!(matches!(
            service.delete_room(5, &creator()).await,
            Err(RoomError::Forbidden)
        ));
    }

    #[tokio::test]
    async fn test_private_subscribe_by_non_creator_forbidden() {
        let mut room_repo = MockRoomRepository::new();
        room_repo
            .expect_find_by_id()
            .returning(|id| Ok(Some(empty_room(id, Some(1)))));

        let service = service_with(
            room_repo,
            MockMessageRepository::new(),
            MockUserRepository::new(),
        );

        let stranger = User { id: 99, ..Default::default() };
        assert!(matches!(
            service.subscribe(5, &stranger, Some(2)).await,
            Err(RoomError::Forbidden)
        ));
    }

    #[tokio::test]
    async fn test_unsubscribe_absent_user_is_noop() {
        let mut room_repo = MockRoomRepository::new();
        room_repo.expect_find_by_id().returning(|id| {
            let mut room = empty_room(id, None);
            room.subscribers = vec![1];
            Ok(Some(room))
        });
        room_repo
            .expect_remove_online()
            .returning(|id, _| Ok(empty_room(id, None)));
        room_repo.expect_remove_subscriber().returning(|id, _| {
            let mut room = empty_room(id, None);
            room.subscribers = vec![1];
            Ok(room)
        });

        let service = service_with(
            room_repo,
            MockMessageRepository::new(),
            MockUserRepository::new(),
        );

        // User 42 was never subscribed; the room comes back unchanged
        let dto = service.unsubscribe(5, 42).await.unwrap();
        assert_eq!(dto.subscribers, vec!["1".to_string()]);
    }

    #[tokio::test]
    async fn test_messages_require_subscription() {
        let mut room_repo = MockRoomRepository::new();
        room_repo.expect_find_by_id().returning(|id| {
            let mut room = empty_room(id, None);
            room.subscribers = vec![1];
            Ok(Some(room))
        });

        let service = service_with(
            room_repo,
            MockMessageRepository::new(),
            MockUserRepository::new(),
        );

        assert!(matches!(
            service.messages(5, 42, 50).await,
            Err(RoomError::NotSubscriber)
        ));
    }
}
