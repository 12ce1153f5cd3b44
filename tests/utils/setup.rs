use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

use scheduler::{
    events::InMemoryCalendarProvider,
    presence::{BroadcastConfig, ConnectionRegistry, InMemoryConnectionRegistry, PresenceBroadcaster},
    room::{LoggingHelpDesk, RoomConfig},
    AppState, LogControl,
};

use super::viewer::Viewer;

// ============================================================================
// Test Server Infrastructure
// ============================================================================

pub struct TestServer {
    pub addr: SocketAddr,
    pub registry: Arc<InMemoryConnectionRegistry>,
    pub broadcaster: PresenceBroadcaster,
    pub log_control: LogControl,
    pub config: BroadcastConfig,
    _server: JoinHandle<()>,
}

pub struct TestServerBuilder {
    room_limit: Option<usize>,
    config: BroadcastConfig,
}

impl TestServerBuilder {
    pub fn new() -> Self {
        Self {
            room_limit: None,
            config: BroadcastConfig {
                interval: Duration::from_millis(50),
                send_timeout: Duration::from_millis(200),
            },
        }
    }

    pub fn with_room_limit(mut self, max: usize) -> Self {
        self.room_limit = Some(max);
        self
    }

    pub async fn build(self) -> TestServer {
        let registry = Arc::new(match self.room_limit {
            Some(max) => InMemoryConnectionRegistry::with_room_limit(max),
            None => InMemoryConnectionRegistry::new(),
        });
        let log_control = LogControl::detached();

        let app_state = AppState {
            calendar: Arc::new(InMemoryCalendarProvider::new()),
            registry: registry.clone(),
            help_desk: Arc::new(LoggingHelpDesk),
            room_config: Arc::new(RoomConfig::default()),
            log_control: log_control.clone(),
            presence: self.config.clone(),
            web_root: PathBuf::from("web-dist"),
            static_root: PathBuf::from("web-dist/static"),
        };

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(async move {
            axum::serve(listener, scheduler::app(app_state)).await.unwrap();
        });

        // Ticks are driven by the tests, not by a background loop
        let broadcaster = PresenceBroadcaster::new(registry.clone(), self.config.clone());

        TestServer {
            addr,
            registry,
            broadcaster,
            log_control,
            config: self.config,
            _server: server,
        }
    }
}

impl TestServer {
    pub fn http_url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub fn ws_url(&self, room_id: &str) -> String {
        format!("ws://{}/{}/ws", self.addr, room_id)
    }

    /// Opens a display connection and consumes its greeting
    pub async fn connect(&self, room_id: &str) -> Viewer {
        let mut viewer = Viewer::connect(&self.ws_url(room_id)).await;
        viewer.next_presence().await;
        viewer
    }

    /// Waits until the registry reports `expected` viewers for the room
    pub async fn wait_for_count(&self, room_id: &str, expected: usize) {
        let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
        while self.registry.count(room_id) != expected {
            assert!(
                tokio::time::Instant::now() < deadline,
                "room {} never reached {} viewers (has {})",
                room_id,
                expected,
                self.registry.count(room_id)
            );
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }
}
