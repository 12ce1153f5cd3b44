use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Title given to bookings made without one at the display
pub const DEFAULT_EVENT_TITLE: &str = "Book Now Meeting";

/// A calendar entry as returned by the calendar service
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    /// Identifier assigned by the calendar service
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub title: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    /// Provider fields we pass through untouched
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Request payload for booking a room
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EventRequest {
    #[serde(default)]
    pub title: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl EventRequest {
    pub fn new(title: impl Into<String>, start_time: DateTime<Utc>, end_time: DateTime<Utc>) -> Self {
        Self {
            title: title.into(),
            start_time,
            end_time,
            extra: Map::new(),
        }
    }

    /// Event the request describes, before any id is assigned
    pub fn to_event(&self) -> Event {
        Event {
            id: None,
            title: self.title.clone(),
            start_time: self.start_time,
            end_time: self.end_time,
            extra: self.extra.clone(),
        }
    }
}
