use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

use crate::events::CalendarProvider;
use crate::logging::LogControl;
use crate::presence::{BroadcastConfig, ConnectionRegistry};
use crate::room::{HelpDesk, RoomConfig};

/// Shared application state containing all dependencies
#[derive(Clone)]
pub struct AppState {
    pub calendar: Arc<dyn CalendarProvider + Send + Sync>,
    pub registry: Arc<dyn ConnectionRegistry>,
    pub help_desk: Arc<dyn HelpDesk + Send + Sync>,
    pub room_config: Arc<RoomConfig>,
    pub log_control: LogControl,
    pub presence: BroadcastConfig,
    pub web_root: PathBuf,
    pub static_root: PathBuf,
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Upstream service unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("Upstream service rejected the request ({status}): {message}")]
    UpstreamRejected { status: u16, message: String },

    #[error("Resource exhausted: {0}")]
    ResourceExhausted(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal server error")]
    Internal,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::InvalidRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::UpstreamUnavailable(msg) => (StatusCode::BAD_GATEWAY, msg),
            AppError::UpstreamRejected { status, message } => {
                // Only client errors are passed through; anything else is a gateway failure
                let status = StatusCode::from_u16(status)
                    .ok()
                    .filter(|s| s.is_client_error())
                    .unwrap_or(StatusCode::BAD_GATEWAY);
                (status, message)
            }
            AppError::ResourceExhausted(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg),
            AppError::Config(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Configuration error: {}", msg),
            ),
            AppError::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
        };

        let body = Json(json!({
            "error": error_message
        }));

        (status, body).into_response()
    }
}
