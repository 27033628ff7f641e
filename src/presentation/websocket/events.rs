//! WebSocket Event Types
//!
//! Named-event wire format: `{"event": "ROOM:ENTER", "data": {...}}`.
//! Ids travel as strings, matching the REST responses.

use serde::{Deserialize, Serialize};

use crate::application::services::{AuthorDto, RoomMessageDto};

/// Events accepted from clients
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum ClientEvent {
    #[serde(rename = "USER:CONNECT")]
    UserConnect { user_id: String },

    #[serde(rename = "ROOM:ENTER")]
    RoomEnter { room_id: String, user_id: String },

    #[serde(rename = "ROOM:LEAVE")]
    RoomLeave { room_id: String, user_id: String },

    #[serde(rename = "MESSAGE:NEW")]
    MessageNew {
        room_id: String,
        user_id: String,
        body: String,
    },

    #[serde(rename = "MESSAGE:DELETE")]
    MessageDelete {
        room_id: String,
        user_id: String,
        message_id: String,
    },

    #[serde(rename = "MESSAGE:EDIT")]
    MessageEdit {
        room_id: String,
        user_id: String,
        message_id: String,
        body: String,
    },
}

impl ClientEvent {
    /// Event name for logging and metrics
    pub fn name(&self) -> &'static str {
        match self {
            ClientEvent::UserConnect { .. } => "USER:CONNECT",
            ClientEvent::RoomEnter { .. } => "ROOM:ENTER",
            ClientEvent::RoomLeave { .. } => "ROOM:LEAVE",
            ClientEvent::MessageNew { .. } => "MESSAGE:NEW",
            ClientEvent::MessageDelete { .. } => "MESSAGE:DELETE",
            ClientEvent::MessageEdit { .. } => "MESSAGE:EDIT",
        }
    }
}

/// User summary broadcast in presence lists
#[derive(Debug, Clone, Serialize)]
pub struct OnlineUser {
    pub id: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

impl From<AuthorDto> for OnlineUser {
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

/// Message payload broadcast to a room
#[derive(Debug, Clone, Serialize)]
pub struct GatewayMessage {
    pub id: String,
    pub room_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<OnlineUser>,
    pub body: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub edited_at: Option<String>,
    pub created_at: String,
}

impl From<RoomMessageDto> for GatewayMessage {
    fn from(dto: RoomMessageDto) -> Self {
        Self {
            id: dto.id,
            room_id: dto.room_id,
            author: dto.author.map(OnlineUser::from),
            body: dto.body,
            edited_at: dto.edited_at,
            created_at: dto.created_at,
        }
    }
}

/// Events emitted to clients
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", content = "data")]
pub enum ServerEvent {
    #[serde(rename = "ROOM:SET_USERS")]
    RoomSetUsers {
        room_id: String,
        users: Vec<OnlineUser>,
    },

    #[serde(rename = "ROOM:NEW_MESSAGE")]
    RoomNewMessage(GatewayMessage),

    #[serde(rename = "ROOM:DELETE_MESSAGE")]
    RoomDeleteMessage {
        room_id: String,
        message_id: String,
    },

    #[serde(rename = "ROOM:EDIT_MESSAGE")]
    RoomEditMessage(GatewayMessage),

    #[serde(rename = "connect_error")]
    ConnectError { message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_event_parses_named_wire_format() {
        let raw = r#"{"event":"ROOM:ENTER","data":{"room_id":"5","user_id":"42"}}"#;
        let event: ClientEvent = serde_json::from_str(raw).unwrap();

        match event {
            ClientEvent::RoomEnter { room_id, user_id } => {
                assert_eq!(room_id, "5");
                assert_eq!(user_id, "42");
            }
            other => panic!("Unexpected event: {:?}", other),
        }
    }

    #[test]
    fn test_unknown_event_is_rejected() {
        let raw = r#"{"event":"ROOM:EXPLODE","data":{}}"#;
        assert!(serde_json::from_str::<ClientEvent>(raw).is_err());
    }

    #[test]
    fn test_server_event_serializes_named_wire_format() {
        let event = ServerEvent::ConnectError {
            message: "Room not found".into(),
        };
        let raw = serde_json::to_string(&event).unwrap();

        assert!(raw.contains(r#""event":"connect_error""#));
        assert!(raw.contains(r#""message":"Room not found""#));
    }

    #[test]
    fn test_set_users_event_shape() {
        let event = ServerEvent::RoomSetUsers {
            room_id: "5".into(),
            users: vec![OnlineUser {
                id: "42".into(),
                username: "jackb".into(),
                first_name: "Jack".into(),
                last_name: "Bourne".into(),
                avatar_url: None,
            }],
        };
        let raw = serde_json::to_string(&event).unwrap();

        assert!(raw.contains(r#""event":"ROOM:SET_USERS""#));
        assert!(raw.contains(r#""room_id":"5""#));
        assert!(!raw.contains("avatar_url"));
    }
}
