use axum::extract::{Path, State};
use tracing::instrument;

use super::control::LogLevel;
use crate::shared::{AppError, AppState};

/// Load balancer liveness probe
///
/// GET /status
pub async fn status() -> &'static str {
    "healthy"
}

/// HTTP handler for changing the process log verbosity
///
/// GET /log/:level
/// Level 1-5 maps to debug/info/warn/error/panic
#[instrument(name = "set_log_level", skip(state))]
pub async fn set_log_level(
    State(state): State<AppState>,
    Path(level): Path<String>,
) -> Result<String, AppError> {
    let number: i64 = level
        .parse()
        .map_err(|e: std::num::ParseIntError| AppError::InvalidRequest(e.to_string()))?;
    let level = LogLevel::try_from(number)?;

    state.log_control.set_level(level)?;

    Ok(format!("Set log level to {}", number))
}
