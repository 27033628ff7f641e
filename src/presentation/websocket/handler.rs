//! WebSocket Connection Handler
//!
//! Handles one WebSocket connection: parses named client events, maps them
//! to chat-service operations, and broadcasts the results to room groups.
//! Validation failures go back to the originating connection only, as
//! `connect_error` events.

use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use uuid::Uuid;

use super::events::{ClientEvent, GatewayMessage, OnlineUser, ServerEvent};
use super::gateway::Gateway;
use super::session::ConnectionState;
use crate::application::services::{ChatService, ChatServiceImpl};
use crate::infrastructure::metrics;
use crate::infrastructure::repositories::{
    PgMessageRepository, PgRoomRepository, PgUserRepository,
};
use crate::startup::AppState;

type PgChatService = ChatServiceImpl<PgRoomRepository, PgMessageRepository, PgUserRepository>;

/// WebSocket upgrade handler
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Handle an individual WebSocket connection
async fn handle_socket(socket: WebSocket, state: AppState) {
    let connection_id = Uuid::new_v4().to_string();
    let mut connection = ConnectionState::new(connection_id.clone());

    tracing::debug!(connection_id = %connection_id, "New WebSocket connection");
    metrics::WEBSOCKET_CONNECTIONS_ACTIVE.inc();

    let chat = ChatServiceImpl::new(
        Arc::new(PgRoomRepository::new(state.db.clone())),
        Arc::new(PgMessageRepository::new(state.db.clone())),
        Arc::new(PgUserRepository::new(state.db.clone())),
        state.snowflake.clone(),
    );

    // Split socket for concurrent read/write
    let (mut sender, mut receiver) = socket.split();

    // Channel for outgoing events
    let (tx, mut rx) = mpsc::unbounded_channel::<ServerEvent>();

    // Forward events from the channel to the socket
    let sender_task = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            let text = match serde_json::to_string(&event) {
                Ok(t) => t,
                Err(e) => {
                    tracing::error!("Failed to serialize event: {}", e);
                    continue;
                }
            };
            if sender.send(Message::Text(text.into())).await.is_err() {
                break;
            }
        }
    });

    // Main event loop
    while let Some(msg) = receiver.next().await {
        match msg {
            Ok(Message::Text(text)) => {
                if let Err(message) = handle_text(
                    &text,
                    &mut connection,
                    &chat,
                    &state.gateway,
                    &tx,
                )
                .await
                {
                    tracing::debug!(
                        connection_id = %connection.connection_id,
                        error = %message,
                        "Event rejected"
                    );
                    let _ = tx.send(ServerEvent::ConnectError { message });
                }
            }
            Ok(Message::Close(_)) => {
                tracing::debug!(connection_id = %connection.connection_id, "Connection closed");
                break;
            }
            Ok(_) => {
                // Pings are answered by axum; binary frames are ignored
            }
            Err(e) => {
                tracing::debug!(
                    connection_id = %connection.connection_id,
                    error = %e,
                    "WebSocket error"
                );
                break;
            }
        }
    }

    // Disconnect: run the leave-room cleanup for every entered room
    cleanup(&connection, &chat, &state.gateway).await;
    sender_task.abort();
    metrics::WEBSOCKET_CONNECTIONS_ACTIVE.dec();

    tracing::info!(
        connection_id = %connection.connection_id,
        user_id = ?connection.user_id,
        "Connection finished"
    );
}

/// Parse and dispatch one inbound text frame
async fn handle_text(
    text: &str,
    connection: &mut ConnectionState,
    chat: &PgChatService,
    gateway: &Arc<Gateway>,
    tx: &mpsc::UnboundedSender<ServerEvent>,
) -> Result<(), String> {
    let event: ClientEvent =
        serde_json::from_str(text).map_err(|e| format!("Invalid event: {}", e))?;

    metrics::GATEWAY_EVENTS_TOTAL
        .with_label_values(&[event.name()])
        .inc();

    match event {
        ClientEvent::UserConnect { user_id } => {
            let user_id = parse_id(&user_id)?;
            chat.connect(user_id).await.map_err(|e| e.to_string())?;

            gateway.register(connection.connection_id.clone(), user_id, tx.clone());
            connection.user_id = Some(user_id);
        }

        ClientEvent::RoomEnter { room_id, user_id } => {
            let room_id = parse_id(&room_id)?;
            let user_id = parse_id(&user_id)?;

            let online = chat
                .enter_room(room_id, user_id)
                .await
                .map_err(|e| e.to_string())?;

            gateway.join_room(&connection.connection_id, room_id);
            connection.enter_room(room_id);

            gateway.broadcast_to_room(room_id, set_users_event(room_id, online));
        }

        ClientEvent::RoomLeave { room_id, user_id } => {
            let room_id = parse_id(&room_id)?;
            let user_id = parse_id(&user_id)?;

            let online = chat
                .leave_room(room_id, user_id)
                .await
                .map_err(|e| e.to_string())?;

            gateway.leave_room(&connection.connection_id, room_id);
            connection.leave_room(room_id);

            gateway.broadcast_to_room(room_id, set_users_event(room_id, online));
        }

        ClientEvent::MessageNew {
            room_id,
            user_id,
            body,
        } => {
            let room_id = parse_id(&room_id)?;
            let user_id = parse_id(&user_id)?;

            let message = chat
                .new_message(room_id, user_id, &body)
                .await
                .map_err(|e| e.to_string())?;

            gateway.broadcast_to_room(
                room_id,
                ServerEvent::RoomNewMessage(GatewayMessage::from(message)),
            );
        }

        ClientEvent::MessageDelete {
            room_id,
            user_id,
            message_id,
        } => {
            let room_id = parse_id(&room_id)?;
            let user_id = parse_id(&user_id)?;
            let message_id = parse_id(&message_id)?;

            let deleted = chat
                .delete_message(room_id, user_id, message_id)
                .await
                .map_err(|e| e.to_string())?;

            gateway.broadcast_to_room(
                room_id,
                ServerEvent::RoomDeleteMessage {
                    room_id: room_id.to_string(),
                    message_id: deleted.to_string(),
                },
            );
        }

        ClientEvent::MessageEdit {
            room_id,
            user_id,
            message_id,
            body,
        } => {
            let room_id = parse_id(&room_id)?;
            let user_id = parse_id(&user_id)?;
            let message_id = parse_id(&message_id)?;

            let message = chat
                .edit_message(room_id, user_id, message_id, &body)
                .await
                .map_err(|e| e.to_string())?;

            gateway.broadcast_to_room(
                room_id,
                ServerEvent::RoomEditMessage(GatewayMessage::from(message)),
            );
        }
    }

    Ok(())
}

/// Leave every entered room and drop the connection from the registry.
/// The user is resolved by connection id. A dropped transport never
/// reaches this, so presence can drift; the next explicit leave or enter
/// rewrites the list.
async fn cleanup(connection: &ConnectionState, chat: &PgChatService, gateway: &Arc<Gateway>) {
    if let Some(user_id) = gateway.resolve_user(&connection.connection_id) {
        for room_id in &connection.rooms {
            match chat.leave_room(*room_id, user_id).await {
                Ok(online) => {
                    gateway.leave_room(&connection.connection_id, *room_id);
                    gateway.broadcast_to_room(*room_id, set_users_event(*room_id, online));
                }
                Err(e) => {
                    tracing::warn!(
                        room_id = room_id,
                        user_id = user_id,
                        error = %e,
                        "Presence cleanup failed"
                    );
                }
            }
        }
    }

    gateway.unregister(&connection.connection_id);
}

fn set_users_event(room_id: i64, online: Vec<crate::application::services::AuthorDto>) -> ServerEvent {
    ServerEvent::RoomSetUsers {
        room_id: room_id.to_string(),
        users: online.into_iter().map(OnlineUser::from).collect(),
    }
}

fn parse_id(raw: &str) -> Result<i64, String> {
    raw.parse::<i64>().map_err(|_| format!("Invalid id: {}", raw))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_id_accepts_snowflakes() {
        assert_eq!(parse_id("12345678901234567").unwrap(), 12345678901234567);
    }

    #[test]
    fn test_parse_id_rejects_garbage() {
        assert!(parse_id("abc").is_err());
        assert!(parse_id("").is_err());
    }
}
