//! WebSocket Connection State
//!
//! Per-connection state tracked by the socket handler: the identified
//! user and the rooms this connection has entered.

/// State of a single WebSocket connection
#[derive(Debug)]
pub struct ConnectionState {
    pub connection_id: String,
    pub user_id: Option<i64>,
    pub rooms: Vec<i64>,
}

impl ConnectionState {
    pub fn new(connection_id: String) -> Self {
        Self {
            connection_id,
            user_id: None,
            rooms: Vec::new(),
        }
    }

    /// Whether `USER:CONNECT` has been processed
    pub fn is_connected(&self) -> bool {
        self.user_id.is_some()
    }

    pub fn enter_room(&mut self, room_id: i64) {
        if !self.rooms.contains(&room_id) {
            self.rooms.push(room_id);
        }
    }

    pub fn leave_room(&mut self, room_id: i64) {
        self.rooms.retain(|id| *id != room_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_connection_is_unidentified() {
        let state = ConnectionState::new("c1".into());
        assert!(!state.is_connected());
        assert!(state.rooms.is_empty());
    }

    #[test]
    fn test_enter_room_deduplicates() {
        let mut state = ConnectionState::new("c1".into());
        state.enter_room(5);
        state.enter_room(5);
        assert_eq!(state.rooms, vec![5]);
    }

    #[test]
    fn test_leave_room_removes() {
        let mut state = ConnectionState::new("c1".into());
        state.enter_room(5);
        state.enter_room(6);
        state.leave_room(5);
        assert_eq!(state.rooms, vec![6]);
    }
}
