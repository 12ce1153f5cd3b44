use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;
use tracing::{info, instrument};

use super::{
    service::EventService,
    types::{Event, EventRequest},
};
use crate::shared::{AppError, AppState};

/// HTTP handler for listing a room's events
///
/// GET /:room_id/events
#[instrument(name = "get_events", skip(state))]
pub async fn get_events(
    State(state): State<AppState>,
    Path(room_id): Path<String>,
) -> Result<Json<Vec<Event>>, AppError> {
    let service = EventService::new(Arc::clone(&state.calendar));
    let events = service.list_events(&room_id).await?;

    info!(room_id = %room_id, event_count = events.len(), "Events listed successfully");

    Ok(Json(events))
}

/// HTTP handler for booking a room
///
/// POST /:room_id/events
/// Returns 201 with the event as stored by the calendar
#[instrument(name = "create_event", skip(state, payload))]
pub async fn create_event(
    State(state): State<AppState>,
    Path(room_id): Path<String>,
    payload: Result<Json<EventRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Event>), AppError> {
    let Json(request) = payload.map_err(|e| AppError::InvalidRequest(e.body_text()))?;

    let service = EventService::new(Arc::clone(&state.calendar));
    let event = service.create_event(&room_id, request).await?;

    Ok((StatusCode::CREATED, Json(event)))
}
