use futures::StreamExt;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};

use scheduler::presence::{PresenceCountPayload, PresenceMessage};

// ============================================================================
// WebSocket Client for Tests
// ============================================================================

/// A browser display subscribed to one room's presence pushes
pub struct Viewer {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl Viewer {
    pub async fn connect(url: &str) -> Self {
        let (stream, _response) = connect_async(url)
            .await
            .unwrap_or_else(|e| panic!("failed to connect to {}: {}", url, e));
        Self { stream }
    }

    /// Next presence envelope, failing the test if none arrives within a second
    pub async fn next_message(&mut self) -> PresenceMessage {
        loop {
            let frame = tokio::time::timeout(Duration::from_secs(1), self.stream.next())
                .await
                .expect("timed out waiting for a presence message")
                .expect("connection closed while waiting for a presence message")
                .expect("websocket error while waiting for a presence message");

            if let Message::Text(_) = frame {
                let text = frame.to_text().unwrap();
                return serde_json::from_str(text).unwrap();
            }
        }
    }

    pub async fn next_presence(&mut self) -> PresenceCountPayload {
        self.next_message()
            .await
            .count_payload()
            .expect("message should carry a presence count")
    }

    /// True if nothing arrives within `wait`
    pub async fn stays_quiet(&mut self, wait: Duration) -> bool {
        tokio::time::timeout(wait, self.stream.next()).await.is_err()
    }

    pub async fn close(mut self) {
        let _ = self.stream.close(None).await;
    }
}
