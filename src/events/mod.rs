// Public API - what other modules can use
pub use handlers::{create_event, get_events};
pub use provider::{CalendarProvider, HttpCalendarProvider, InMemoryCalendarProvider};
pub use service::EventService;
pub use types::{Event, EventRequest, DEFAULT_EVENT_TITLE};

pub(crate) use provider::{check_upstream, transport_error};

// Internal modules
mod handlers;
mod provider;
mod service;
mod types;
