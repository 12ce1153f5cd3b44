use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::Path;

use crate::shared::AppError;

/// Configuration of the room this display belongs to
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RoomConfig {
    #[serde(rename = "roomID")]
    pub room_id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_zone: Option<String>,
    #[serde(default = "help_enabled_default")]
    pub help_enabled: bool,
    /// Display settings the UI understands and we don't
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn help_enabled_default() -> bool {
    true
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            room_id: String::new(),
            name: "Conference Room".to_string(),
            time_zone: None,
            help_enabled: true,
            extra: Map::new(),
        }
    }
}

impl RoomConfig {
    /// Reads a JSON room configuration file
    pub fn load(path: &Path) -> Result<Self, AppError> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("cannot read room config {}: {}", path.display(), e))
        })?;

        serde_json::from_str(&raw).map_err(|e| {
            AppError::Config(format!("invalid room config {}: {}", path.display(), e))
        })
    }
}

/// Request payload for asking the help desk to come to a room
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HelpRequest {
    #[serde(rename = "roomID")]
    pub room_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}
