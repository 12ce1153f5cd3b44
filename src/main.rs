use clap::Parser;
use std::net::SocketAddr;
use std::process::ExitCode;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use scheduler::{
    config::Args,
    events::{CalendarProvider, HttpCalendarProvider, InMemoryCalendarProvider},
    logging::{init_tracing, LogControl, LogLevel},
    presence::{start_presence_broadcaster, ConnectionRegistry, InMemoryConnectionRegistry},
    room::{HelpDesk, LoggingHelpDesk, RoomConfig, WebhookHelpDesk},
    AppError, AppState,
};

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    // Start at info so a bad initial level can still be reported
    let log_control = init_tracing(LogLevel::Info);

    match run(args, log_control).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "Scheduler failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args, log_control: LogControl) -> Result<(), AppError> {
    let level = LogLevel::try_from(args.log_level).map_err(|e| {
        AppError::Config(format!("unable to set log level (got {}): {}", args.log_level, e))
    })?;
    log_control.set_level(level)?;

    info!("Starting room scheduling server");

    let calendar: Arc<dyn CalendarProvider + Send + Sync> = match &args.calendar_url {
        Some(url) => {
            info!(calendar_url = %url, "Using calendar service");
            Arc::new(HttpCalendarProvider::new(url.clone(), args.upstream_timeout())?)
        }
        None => {
            warn!("No calendar service configured, events are kept in memory");
            Arc::new(InMemoryCalendarProvider::new())
        }
    };

    let help_desk: Arc<dyn HelpDesk + Send + Sync> = match &args.help_url {
        Some(url) => Arc::new(WebhookHelpDesk::new(url.clone(), args.upstream_timeout())?),
        None => Arc::new(LoggingHelpDesk),
    };

    let room_config = match &args.room_config {
        Some(path) => RoomConfig::load(path)?,
        None => RoomConfig::default(),
    };

    let registry: Arc<dyn ConnectionRegistry> = match args.max_connections_per_room {
        Some(max) => Arc::new(InMemoryConnectionRegistry::with_room_limit(max)),
        None => Arc::new(InMemoryConnectionRegistry::new()),
    };

    let presence = args.broadcast_config();
    let app_state = AppState {
        calendar,
        registry: Arc::clone(&registry),
        help_desk,
        room_config: Arc::new(room_config),
        log_control,
        presence: presence.clone(),
        web_root: args.web_root.clone(),
        static_root: args.static_root.clone(),
    };

    let cancel = CancellationToken::new();
    let broadcaster = start_presence_broadcaster(registry, presence, cancel.clone());

    let addr = SocketAddr::from(([0, 0, 0, 0], args.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| AppError::Config(format!("failed to bind {}: {}", addr, e)))?;
    info!(addr = %addr, "Server listening");

    let served = axum::serve(listener, scheduler::app(app_state))
        .with_graceful_shutdown(shutdown_signal())
        .await;

    cancel.cancel();
    if let Err(e) = broadcaster.await {
        warn!(error = %e, "Presence broadcaster ended abnormally");
    }

    served.map_err(|e| {
        error!(error = %e, "Server error");
        AppError::Internal
    })?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
