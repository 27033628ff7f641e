//! WebSocket Gateway
//!
//! The in-process registry of live connections: connection-id to user
//! mapping, per-connection outbound channels, and room broadcast groups.
//! This is the only shared mutable state outside the database pool.

use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::mpsc;

use super::events::ServerEvent;

/// A registered connection with its outbound channel
pub struct ConnectedClient {
    pub connection_id: String,
    pub user_id: i64,
    pub sender: mpsc::UnboundedSender<ServerEvent>,
}

/// Gateway managing all live connections and room groups
pub struct Gateway {
    /// Active connections by connection id
    clients: DashMap<String, Arc<ConnectedClient>>,
    /// User id to connection ids (one user can have multiple connections)
    user_connections: DashMap<i64, Vec<String>>,
    /// Room id to member connection ids (broadcast groups)
    room_groups: DashMap<i64, Vec<String>>,
}

impl Gateway {
    pub fn new() -> Self {
        Self {
            clients: DashMap::new(),
            user_connections: DashMap::new(),
            room_groups: DashMap::new(),
        }
    }

    /// Register a connection for a validated user
    pub fn register(
        &self,
        connection_id: String,
        user_id: i64,
        sender: mpsc::UnboundedSender<ServerEvent>,
    ) {
        let client = Arc::new(ConnectedClient {
            connection_id: connection_id.clone(),
            user_id,
            sender,
        });

        self.clients.insert(connection_id.clone(), client);
        self.user_connections
            .entry(user_id)
            .or_default()
            .push(connection_id.clone());

        tracing::info!(user_id = user_id, connection_id = %connection_id, "Connection registered");
    }

    /// Drop a connection from the registry and every room group.
    /// Returns the rooms it was joined to, for presence cleanup.
    pub fn unregister(&self, connection_id: &str) -> Vec<i64> {
        let mut joined_rooms = Vec::new();

        for mut entry in self.room_groups.iter_mut() {
            if entry.value().iter().any(|c| c == connection_id) {
                joined_rooms.push(*entry.key());
                entry.value_mut().retain(|c| c != connection_id);
            }
        }

        if let Some((_, client)) = self.clients.remove(connection_id) {
            if let Some(mut connections) = self.user_connections.get_mut(&client.user_id) {
                connections.retain(|c| c != connection_id);
            }

            tracing::info!(
                user_id = client.user_id,
                connection_id = %connection_id,
                "Connection unregistered"
            );
        }

        joined_rooms
    }

    /// Resolve the user behind a connection id
    pub fn resolve_user(&self, connection_id: &str) -> Option<i64> {
        self.clients.get(connection_id).map(|c| c.user_id)
    }

    /// Join a connection to a room's broadcast group
    pub fn join_room(&self, connection_id: &str, room_id: i64) {
        let mut group = self.room_groups.entry(room_id).or_default();
        if !group.iter().any(|c| c == connection_id) {
            group.push(connection_id.to_string());
        }
    }

    /// Remove a connection from a room's broadcast group
    pub fn leave_room(&self, connection_id: &str, room_id: i64) {
        if let Some(mut group) = self.room_groups.get_mut(&room_id) {
            group.retain(|c| c != connection_id);
        }
    }

    /// Send an event to every connection in a room's broadcast group
    pub fn broadcast_to_room(&self, room_id: i64, event: ServerEvent) {
        if let Some(group) = self.room_groups.get(&room_id) {
            for connection_id in group.value() {
                if let Some(client) = self.clients.get(connection_id) {
                    let _ = client.sender.send(event.clone());
                }
            }
        }
    }

    /// Send an event to a single connection
    pub fn send_to_connection(&self, connection_id: &str, event: ServerEvent) -> bool {
        if let Some(client) = self.clients.get(connection_id) {
            client.sender.send(event).is_ok()
        } else {
            false
        }
    }

    /// Number of live connections
    pub fn connection_count(&self) -> usize {
        self.clients.len()
    }
}

impl Default for Gateway {
    fn default() -> Self {
        Self::new()
    }
}
