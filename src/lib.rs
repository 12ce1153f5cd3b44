// Library crate for the room display backend
// This file exposes the public API for the binary and integration tests

pub mod config;
pub mod events;
pub mod logging;
pub mod presence;
pub mod room;
pub mod routes;
pub mod shared;

// Re-export commonly used types for easier access in tests
pub use events::{CalendarProvider, Event, EventRequest, EventService};
pub use logging::{LogControl, LogLevel};
pub use presence::{
    BroadcastConfig, ConnectionRegistry, InMemoryConnectionRegistry, PresenceBroadcaster,
    PresenceMessage,
};
pub use routes::app;
pub use shared::{AppError, AppState};
