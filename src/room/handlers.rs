use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use tracing::{info, instrument};

use super::types::{HelpRequest, RoomConfig};
use crate::shared::{AppError, AppState};

/// HTTP handler for the display's room configuration
///
/// GET /config
pub async fn get_config(State(state): State<AppState>) -> Json<RoomConfig> {
    Json(state.room_config.as_ref().clone())
}

/// HTTP handler for forwarding a help request
///
/// POST /help
#[instrument(name = "send_help_request", skip(state, payload))]
pub async fn send_help_request(
    State(state): State<AppState>,
    payload: Result<Json<HelpRequest>, JsonRejection>,
) -> Result<&'static str, AppError> {
    let Json(request) = payload.map_err(|e| AppError::InvalidRequest(e.body_text()))?;

    if request.room_id.trim().is_empty() {
        return Err(AppError::InvalidRequest("roomID must not be empty".to_string()));
    }

    info!(room_id = %request.room_id, "Help requested");
    state.help_desk.request_help(&request).await?;

    Ok("Help request sent")
}
