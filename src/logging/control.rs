use std::fmt;
use std::sync::{Arc, Mutex};
use tracing::info;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{layer::SubscriberExt, reload, util::SubscriberInitExt, Layer};

use crate::shared::AppError;

/// Process verbosity as exposed on the CLI and `/log/:level`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
    Panic,
}

impl LogLevel {
    /// Numeric form used on the wire (1..=5)
    pub fn as_number(self) -> i64 {
        match self {
            LogLevel::Debug => 1,
            LogLevel::Info => 2,
            LogLevel::Warn => 3,
            LogLevel::Error => 4,
            LogLevel::Panic => 5,
        }
    }

    /// Tracing filter for this level. Nothing ranks above error, so panic keeps only errors
    /// and fatal startup causes stay visible.
    pub fn filter(self) -> LevelFilter {
        match self {
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Error => LevelFilter::ERROR,
            LogLevel::Panic => LevelFilter::ERROR,
        }
    }
}

impl TryFrom<i64> for LogLevel {
    type Error = AppError;

    fn try_from(value: i64) -> Result<Self, AppError> {
        match value {
            1 => Ok(LogLevel::Debug),
            2 => Ok(LogLevel::Info),
            3 => Ok(LogLevel::Warn),
            4 => Ok(LogLevel::Error),
            5 => Ok(LogLevel::Panic),
            _ => Err(AppError::InvalidRequest(
                "invalid log level: must be [1-5]".to_string(),
            )),
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
            LogLevel::Panic => "panic",
        };
        f.write_str(name)
    }
}

/// Destination for verbosity changes
pub trait LevelSink: Send + Sync {
    fn apply(&self, filter: LevelFilter) -> Result<(), AppError>;
}

impl<S: 'static> LevelSink for reload::Handle<LevelFilter, S> {
    fn apply(&self, filter: LevelFilter) -> Result<(), AppError> {
        self.reload(filter)
            .map_err(|e| AppError::Config(format!("failed to reload log filter: {}", e)))
    }
}

/// Sink for tests and tools that run without a global subscriber
struct DetachedSink;

impl LevelSink for DetachedSink {
    fn apply(&self, _filter: LevelFilter) -> Result<(), AppError> {
        Ok(())
    }
}

/// Shared handle on the process-wide log level
///
/// Writers are serialized by one lock, so concurrent changes resolve last-write-wins
/// and `current()` always reports the filter that is actually installed.
#[derive(Clone)]
pub struct LogControl {
    current: Arc<Mutex<LogLevel>>,
    sink: Arc<dyn LevelSink>,
}

impl LogControl {
    pub fn new(initial: LogLevel, sink: Arc<dyn LevelSink>) -> Self {
        Self {
            current: Arc::new(Mutex::new(initial)),
            sink,
        }
    }

    /// A control that records levels without touching any subscriber
    pub fn detached() -> Self {
        Self::new(LogLevel::Info, Arc::new(DetachedSink))
    }

    pub fn current(&self) -> LogLevel {
        *self.current.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn set_level(&self, level: LogLevel) -> Result<(), AppError> {
        let mut current = self
            .current
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        self.sink.apply(level.filter())?;
        *current = level;
        drop(current);

        info!(level = %level, "Log level changed");
        Ok(())
    }
}

/// Installs the global subscriber and returns the control for its verbosity cell.
///
/// `RUST_LOG` still narrows output per target; the control caps everything.
pub fn init_tracing(initial: LogLevel) -> LogControl {
    let (level_layer, handle) = reload::Layer::new(initial.filter());

    tracing_subscriber::registry()
        .with(level_layer)
        .with(
            tracing_subscriber::fmt::layer().with_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "scheduler=trace,tower_http=debug".into()),
            ),
        )
        .init();

    LogControl::new(initial, Arc::new(handle))
}
