use std::sync::Arc;
use tracing::{debug, info, instrument};

use super::{
    provider::CalendarProvider,
    types::{Event, EventRequest, DEFAULT_EVENT_TITLE},
};
use crate::shared::AppError;

/// Event gateway for one request: no caching, no retries
pub struct EventService {
    calendar: Arc<dyn CalendarProvider + Send + Sync>,
}

impl EventService {
    pub fn new(calendar: Arc<dyn CalendarProvider + Send + Sync>) -> Self {
        Self { calendar }
    }

    /// Lists a room's events straight from the calendar
    #[instrument(skip(self))]
    pub async fn list_events(&self, room_id: &str) -> Result<Vec<Event>, AppError> {
        validate_room_id(room_id)?;

        let events = self.calendar.list_events(room_id).await?;
        debug!(room_id = %room_id, event_count = events.len(), "Events listed");

        Ok(events)
    }

    /// Validates the booking and forwards it to the calendar
    #[instrument(skip(self, request))]
    pub async fn create_event(
        &self,
        room_id: &str,
        mut request: EventRequest,
    ) -> Result<Event, AppError> {
        validate_room_id(room_id)?;

        if request.start_time >= request.end_time {
            return Err(AppError::InvalidRequest(
                "event start time must be before its end time".to_string(),
            ));
        }

        if request.title.trim().is_empty() {
            request.title = DEFAULT_EVENT_TITLE.to_string();
        }

        let event = self.calendar.create_event(room_id, &request).await?;

        info!(
            room_id = %room_id,
            event_id = ?event.id,
            title = %event.title,
            "Event created"
        );

        Ok(event)
    }
}

fn validate_room_id(room_id: &str) -> Result<(), AppError> {
    if room_id.trim().is_empty() {
        return Err(AppError::InvalidRequest("room id must not be empty".to_string()));
    }
    Ok(())
}
