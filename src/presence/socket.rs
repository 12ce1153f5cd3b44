use async_trait::async_trait;
use axum::extract::ws::{Message, WebSocket};
use futures::StreamExt;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::debug;

/// Simple WebSocket abstraction - all we care about is send/receive
#[async_trait]
pub trait SocketWrapper: Send {
    /// Send a text message to the client
    async fn send_message(&mut self, message: String) -> Result<(), SocketError>;

    /// Receive the next frame from the client
    async fn receive_message(&mut self) -> Result<Inbound, SocketError>;

    /// Close the connection
    async fn close(&mut self) -> Result<(), SocketError>;
}

/// What the client sent us
#[derive(Debug, PartialEq)]
pub enum Inbound {
    Text(String),
    /// Binary, ping and pong frames
    Other,
    Closed,
}

#[derive(Debug, thiserror::Error)]
pub enum SocketError {
    #[error("send failed: {0}")]
    SendFailed(String),

    #[error("send timed out after {0:?}")]
    SendTimedOut(Duration),

    #[error("receive failed: {0}")]
    ReceiveFailed(String),
}

/// Direct implementation on axum's WebSocket
#[async_trait]
impl SocketWrapper for WebSocket {
    async fn send_message(&mut self, message: String) -> Result<(), SocketError> {
        self.send(Message::Text(message))
            .await
            .map_err(|e| SocketError::SendFailed(e.to_string()))
    }

    async fn receive_message(&mut self) -> Result<Inbound, SocketError> {
        match self.next().await {
            Some(Ok(Message::Text(text))) => Ok(Inbound::Text(text)),
            Some(Ok(Message::Close(_))) => Ok(Inbound::Closed),
            Some(Ok(_)) => Ok(Inbound::Other),
            Some(Err(e)) => Err(SocketError::ReceiveFailed(e.to_string())),
            None => Ok(Inbound::Closed),
        }
    }

    async fn close(&mut self) -> Result<(), SocketError> {
        self.send(Message::Close(None))
            .await
            .map_err(|e| SocketError::SendFailed(e.to_string()))
    }
}

/// A display client's socket, bound to one room
///
/// Messages queued by the registry arrive on `outbound_receiver` and are written to the
/// socket. When the registry drops its sender (eviction) the loop ends and the socket is closed.
pub struct Connection {
    pub room_id: String,
    socket: Box<dyn SocketWrapper>,
    outbound_receiver: mpsc::Receiver<String>,
    send_timeout: Duration,
}

impl Connection {
    pub fn new(
        room_id: String,
        socket: Box<dyn SocketWrapper>,
        outbound_receiver: mpsc::Receiver<String>,
        send_timeout: Duration,
    ) -> Self {
        Self {
            room_id,
            socket,
            outbound_receiver,
            send_timeout,
        }
    }

    /// Run the connection - handles both sending and receiving until disconnect
    pub async fn run(mut self) -> Result<(), SocketError> {
        loop {
            tokio::select! {
                // Handle outbound messages (from our app to client)
                msg = self.outbound_receiver.recv() => {
                    match msg {
                        Some(message) => {
                            let send = self.socket.send_message(message);
                            match tokio::time::timeout(self.send_timeout, send).await {
                                Ok(result) => result?,
                                Err(_) => return Err(SocketError::SendTimedOut(self.send_timeout)),
                            }
                        }
                        None => break, // Evicted from the registry
                    }
                }

                // Displays only listen; inbound frames matter only for disconnect
                msg = self.socket.receive_message() => {
                    match msg? {
                        Inbound::Text(text) => {
                            debug!(
                                room_id = %self.room_id,
                                message = %text,
                                "Ignoring client message"
                            );
                        }
                        Inbound::Other => {}
                        Inbound::Closed => break,
                    }
                }
            }
        }

        // Clean disconnect
        let _ = self.socket.close().await;
        Ok(())
    }
}
