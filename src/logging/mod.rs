// Public API
pub use control::{init_tracing, LevelSink, LogControl, LogLevel};
pub use handlers::{set_log_level, status};

// Internal modules
mod control;
mod handlers;
