// Public API - what other modules can use
pub use handlers::{get_config, send_help_request};
pub use help::{HelpDesk, LoggingHelpDesk, WebhookHelpDesk};
pub use types::{HelpRequest, RoomConfig};

// Internal modules
mod handlers;
mod help;
mod types;
