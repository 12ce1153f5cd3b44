use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use super::types::{Event, EventRequest};
use crate::shared::AppError;

/// Upstream source of truth for room calendars
#[async_trait]
pub trait CalendarProvider {
    /// Events for the room, in provider order
    async fn list_events(&self, room_id: &str) -> Result<Vec<Event>, AppError>;

    /// Books the room; the returned event carries any provider-assigned id
    async fn create_event(&self, room_id: &str, request: &EventRequest) -> Result<Event, AppError>;
}

/// Calendar service reached over HTTP
///
/// `GET {base}/rooms/{room_id}/events` lists, `POST` to the same path creates.
pub struct HttpCalendarProvider {
    client: Client,
    base_url: Url,
}

impl HttpCalendarProvider {
    pub fn new(base_url: Url, timeout: Duration) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Config(format!("failed to build calendar client: {}", e)))?;

        Ok(Self { client, base_url })
    }

    fn events_url(&self, room_id: &str) -> Result<Url, AppError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| AppError::Config(format!("calendar url {} cannot be a base", self.base_url)))?
            .pop_if_empty()
            .extend(["rooms", room_id, "events"]);
        Ok(url)
    }
}

/// Maps a calendar response to an error unless it succeeded
pub(crate) async fn check_upstream(response: reqwest::Response) -> Result<reqwest::Response, AppError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = if body.is_empty() {
        status.canonical_reason().unwrap_or("upstream error").to_string()
    } else {
        body
    };

    if status.is_client_error() {
        warn!(status = status.as_u16(), message = %message, "Upstream rejected request");
        Err(AppError::UpstreamRejected {
            status: status.as_u16(),
            message,
        })
    } else {
        warn!(status = status.as_u16(), message = %message, "Upstream failed");
        Err(AppError::UpstreamUnavailable(format!(
            "upstream returned {}: {}",
            status, message
        )))
    }
}

pub(crate) fn transport_error(e: reqwest::Error) -> AppError {
    if e.is_timeout() {
        AppError::UpstreamUnavailable(format!("request timed out: {}", e))
    } else {
        AppError::UpstreamUnavailable(e.to_string())
    }
}

#[async_trait]
impl CalendarProvider for HttpCalendarProvider {
    #[instrument(skip(self))]
    async fn list_events(&self, room_id: &str) -> Result<Vec<Event>, AppError> {
        let url = self.events_url(room_id)?;
        debug!(url = %url, "Fetching events from calendar service");

        let response = self.client.get(url).send().await.map_err(transport_error)?;
        let events: Vec<Event> = check_upstream(response)
            .await?
            .json()
            .await
            .map_err(|e| AppError::UpstreamUnavailable(format!("invalid event list: {}", e)))?;

        debug!(room_id = %room_id, event_count = events.len(), "Fetched events");
        Ok(events)
    }

    #[instrument(skip(self, request))]
    async fn create_event(&self, room_id: &str, request: &EventRequest) -> Result<Event, AppError> {
        let url = self.events_url(room_id)?;
        debug!(url = %url, title = %request.title, "Creating event in calendar service");

        let response = self
            .client
            .post(url)
            .json(request)
            .send()
            .await
            .map_err(transport_error)?;
        let response = check_upstream(response).await?;

        // Some calendars answer 204 with no body; echo the request back then
        if response.status() == StatusCode::NO_CONTENT {
            return Ok(request.to_event());
        }

        response
            .json()
            .await
            .map_err(|e| AppError::UpstreamUnavailable(format!("invalid created event: {}", e)))
    }
}

/// In-memory calendar for development without a calendar service
pub struct InMemoryCalendarProvider {
    events: Mutex<HashMap<String, Vec<Event>>>,
}

impl Default for InMemoryCalendarProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryCalendarProvider {
    pub fn new() -> Self {
        Self {
            events: Mutex::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl CalendarProvider for InMemoryCalendarProvider {
    async fn list_events(&self, room_id: &str) -> Result<Vec<Event>, AppError> {
        let events = self.events.lock().map_err(|_| AppError::Internal)?;
        Ok(events.get(room_id).cloned().unwrap_or_default())
    }

    async fn create_event(&self, room_id: &str, request: &EventRequest) -> Result<Event, AppError> {
        let mut event = request.to_event();
        event.id = Some(Uuid::new_v4().to_string());

        let mut events = self.events.lock().map_err(|_| AppError::Internal)?;
        let room_events = events.entry(room_id.to_string()).or_default();
        room_events.push(event.clone());
        room_events.sort_by_key(|e| e.start_time);

        debug!(room_id = %room_id, event_count = room_events.len(), "Event stored in memory");
        Ok(event)
    }
}
