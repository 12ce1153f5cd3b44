use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Envelope version; bump only for breaking changes to existing fields
pub const PROTOCOL_VERSION: u32 = 1;

/// Message types pushed to display clients
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MessageType {
    PresenceCount,
}

/// Metadata for presence messages
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PresenceMessageMeta {
    pub timestamp: DateTime<Utc>,
    /// Broadcaster tick that produced the message; 0 for the greeting sent on connect
    pub tick: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PresenceCountPayload {
    #[serde(rename = "roomID")]
    pub room_id: String,
    pub count: usize,
}

/// Versioned envelope for everything sent over the presence socket
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PresenceMessage {
    pub version: u32,
    #[serde(rename = "type")]
    pub message_type: MessageType,
    pub payload: serde_json::Value,
    pub meta: Option<PresenceMessageMeta>,
}

impl PresenceMessage {
    pub fn new(message_type: MessageType, payload: serde_json::Value, tick: u64) -> Self {
        Self {
            version: PROTOCOL_VERSION,
            message_type,
            payload,
            meta: Some(PresenceMessageMeta {
                timestamp: Utc::now(),
                tick,
            }),
        }
    }

    /// Create a PRESENCE_COUNT message
    pub fn presence_count(
        room_id: &str,
        count: usize,
        tick: u64,
    ) -> Result<Self, serde_json::Error> {
        let payload = serde_json::to_value(PresenceCountPayload {
            room_id: room_id.to_string(),
            count,
        })?;
        Ok(Self::new(MessageType::PresenceCount, payload, tick))
    }

    /// Serialized form sent on the socket
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Typed payload of a PRESENCE_COUNT message
    pub fn count_payload(&self) -> Option<PresenceCountPayload> {
        match self.message_type {
            MessageType::PresenceCount => serde_json::from_value(self.payload.clone()).ok(),
        }
    }
}
