use dashmap::DashMap;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::shared::AppError;

/// Messages buffered per connection before delivery starts timing out
pub const CONNECTION_BUFFER_SIZE: usize = 16;

pub type ConnectionId = Uuid;

/// Identifies one registered connection; returned by `register`, consumed by `unregister`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConnectionHandle {
    pub room_id: String,
    pub id: ConnectionId,
}

/// Why a message could not be handed to a connection
#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    #[error("connection closed")]
    Closed,

    #[error("delivery timed out after {0:?}")]
    TimedOut(Duration),
}

/// Outbound side of a registered connection
#[derive(Debug, Clone)]
pub struct ConnectionSender {
    pub id: ConnectionId,
    sender: mpsc::Sender<String>,
}

impl ConnectionSender {
    /// Queues a message for the connection, waiting at most `timeout` for buffer space
    pub async fn deliver(&self, message: String, timeout: Duration) -> Result<(), DeliveryError> {
        self.sender
            .send_timeout(message, timeout)
            .await
            .map_err(|e| match e {
                mpsc::error::SendTimeoutError::Timeout(_) => DeliveryError::TimedOut(timeout),
                mpsc::error::SendTimeoutError::Closed(_) => DeliveryError::Closed,
            })
    }
}

/// Point-in-time view of one room's connections
#[derive(Debug, Clone)]
pub struct RoomSnapshot {
    pub room_id: String,
    pub connections: Vec<ConnectionSender>,
    pub count: usize,
}

/// Tracks live connections per room
pub trait ConnectionRegistry: Send + Sync {
    /// Adds a connection to the room's set
    fn register(
        &self,
        room_id: &str,
        sender: mpsc::Sender<String>,
    ) -> Result<ConnectionHandle, AppError>;

    /// Removes a connection; returns false if it was already gone
    fn unregister(&self, handle: &ConnectionHandle) -> bool;

    fn snapshot(&self, room_id: &str) -> RoomSnapshot;

    /// Rooms that currently have at least one connection
    fn active_rooms(&self) -> Vec<String>;

    fn count(&self, room_id: &str) -> usize;

    /// Whether another connection would be accepted for the room right now
    fn has_capacity(&self, room_id: &str) -> bool;
}

/// Registry backed by a sharded map, so unrelated rooms never contend on one lock
pub struct InMemoryConnectionRegistry {
    // room_id -> connection id -> sender
    rooms: DashMap<String, HashMap<ConnectionId, mpsc::Sender<String>>>,
    max_per_room: Option<usize>,
}

impl Default for InMemoryConnectionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryConnectionRegistry {
    pub fn new() -> Self {
        Self {
            rooms: DashMap::new(),
            max_per_room: None,
        }
    }

    /// Registry that refuses connections beyond `max_per_room` in any single room
    pub fn with_room_limit(max_per_room: usize) -> Self {
        Self {
            rooms: DashMap::new(),
            max_per_room: Some(max_per_room),
        }
    }
}

impl ConnectionRegistry for InMemoryConnectionRegistry {
    fn register(
        &self,
        room_id: &str,
        sender: mpsc::Sender<String>,
    ) -> Result<ConnectionHandle, AppError> {
        let mut connections = self.rooms.entry(room_id.to_string()).or_default();

        if let Some(max) = self.max_per_room {
            if connections.len() >= max {
                let empty = connections.is_empty();
                drop(connections);
                if empty {
                    self.rooms.remove_if(room_id, |_, c| c.is_empty());
                }
                return Err(AppError::ResourceExhausted(format!(
                    "room {} already has {} connections",
                    room_id, max
                )));
            }
        }

        let id = Uuid::new_v4();
        connections.insert(id, sender);
        let count = connections.len();
        drop(connections);

        info!(
            room_id = %room_id,
            connection_id = %id,
            count = count,
            "Registered connection"
        );

        Ok(ConnectionHandle {
            room_id: room_id.to_string(),
            id,
        })
    }

    fn unregister(&self, handle: &ConnectionHandle) -> bool {
        let removed = match self.rooms.get_mut(&handle.room_id) {
            Some(mut connections) => connections.remove(&handle.id).is_some(),
            None => false,
        };

        // Clean up empty rooms
        self.rooms
            .remove_if(&handle.room_id, |_, connections| connections.is_empty());

        if removed {
            info!(
                room_id = %handle.room_id,
                connection_id = %handle.id,
                "Unregistered connection"
            );
        } else {
            debug!(
                room_id = %handle.room_id,
                connection_id = %handle.id,
                "Connection already unregistered"
            );
        }

        removed
    }

    fn snapshot(&self, room_id: &str) -> RoomSnapshot {
        let connections: Vec<ConnectionSender> = self
            .rooms
            .get(room_id)
            .map(|connections| {
                connections
                    .iter()
                    .map(|(id, sender)| ConnectionSender {
                        id: *id,
                        sender: sender.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default();

        RoomSnapshot {
            room_id: room_id.to_string(),
            count: connections.len(),
            connections,
        }
    }

    fn active_rooms(&self) -> Vec<String> {
        self.rooms
            .iter()
            .filter(|entry| !entry.value().is_empty())
            .map(|entry| entry.key().clone())
            .collect()
    }

    fn count(&self, room_id: &str) -> usize {
        self.rooms
            .get(room_id)
            .map(|connections| connections.len())
            .unwrap_or(0)
    }

    fn has_capacity(&self, room_id: &str) -> bool {
        match self.max_per_room {
            Some(max) => self.count(room_id) < max,
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn channel() -> (mpsc::Sender<String>, mpsc::Receiver<String>) {
        mpsc::channel(CONNECTION_BUFFER_SIZE)
    }

    #[test]
    fn test_register_then_unregister_leaves_no_trace() {
        let registry = InMemoryConnectionRegistry::new();
        let (existing, _rx1) = channel();
        registry.register("101", existing).unwrap();
        let before = registry.snapshot("101").count;

        let (sender, _rx2) = channel();
        let handle = registry.register("101", sender).unwrap();
        assert_eq!(registry.count("101"), before + 1);

        assert!(registry.unregister(&handle));
        assert_eq!(registry.snapshot("101").count, before);
    }

    #[test]
    fn test_unregister_is_idempotent() {
        let registry = InMemoryConnectionRegistry::new();
        let (sender, _rx) = channel();
        let handle = registry.register("101", sender).unwrap();

        assert!(registry.unregister(&handle));
        assert!(!registry.unregister(&handle));
        assert_eq!(registry.count("101"), 0);
    }

    #[test]
    fn test_empty_rooms_are_not_active() {
        let registry = InMemoryConnectionRegistry::new();
        let (sender, _rx) = channel();
        let handle = registry.register("101", sender).unwrap();
        assert_eq!(registry.active_rooms(), vec!["101".to_string()]);

        registry.unregister(&handle);

        assert!(registry.active_rooms().is_empty());
        assert!(registry.snapshot("101").connections.is_empty());
    }

    #[test]
    fn test_rooms_are_partitioned() {
        let registry = InMemoryConnectionRegistry::new();
        let (a, _rx_a) = channel();
        let (b, _rx_b) = channel();
        let (c, _rx_c) = channel();
        registry.register("101", a).unwrap();
        registry.register("101", b).unwrap();
        registry.register("202", c).unwrap();

        let mut rooms = registry.active_rooms();
        rooms.sort();
        assert_eq!(rooms, vec!["101".to_string(), "202".to_string()]);
        assert_eq!(registry.snapshot("101").count, 2);
        assert_eq!(registry.snapshot("202").count, 1);
        assert_eq!(registry.snapshot("303").count, 0);
    }

    #[test]
    fn test_each_registration_gets_a_distinct_handle() {
        let registry = InMemoryConnectionRegistry::new();
        let (a, _rx_a) = channel();
        let (b, _rx_b) = channel();

        let first = registry.register("101", a).unwrap();
        let second = registry.register("101", b).unwrap();

        assert_ne!(first, second);
        let snapshot = registry.snapshot("101");
        assert!(snapshot.connections.iter().any(|c| c.id == first.id));
        assert!(snapshot.connections.iter().any(|c| c.id == second.id));
    }

    #[test]
    fn test_room_limit_reports_resource_exhaustion() {
        let registry = InMemoryConnectionRegistry::with_room_limit(1);
        let (a, _rx_a) = channel();
        let (b, _rx_b) = channel();
        let (c, _rx_c) = channel();

        registry.register("101", a).unwrap();
        assert!(!registry.has_capacity("101"));
        let result = registry.register("101", b);

        assert!(matches!(result, Err(AppError::ResourceExhausted(_))));
        assert_eq!(registry.count("101"), 1);
        assert!(registry.register("202", c).is_ok());
    }

    #[tokio::test]
    async fn test_deliver_reports_closed_connection() {
        let registry = InMemoryConnectionRegistry::new();
        let (sender, receiver) = channel();
        registry.register("101", sender).unwrap();
        drop(receiver);

        let snapshot = registry.snapshot("101");
        let result = snapshot.connections[0]
            .deliver("hello".to_string(), Duration::from_millis(50))
            .await;

        assert!(matches!(result, Err(DeliveryError::Closed)));
    }

    #[tokio::test]
    async fn test_deliver_times_out_when_buffer_is_full() {
        let registry = InMemoryConnectionRegistry::new();
        let (sender, _receiver) = mpsc::channel(1);
        registry.register("101", sender).unwrap();
        let connection = registry.snapshot("101").connections.remove(0);

        connection
            .deliver("first".to_string(), Duration::from_millis(50))
            .await
            .unwrap();
        let result = connection
            .deliver("second".to_string(), Duration::from_millis(50))
            .await;

        assert!(matches!(result, Err(DeliveryError::TimedOut(_))));
    }
}
