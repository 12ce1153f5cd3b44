use axum::{
    extract::{ws::WebSocket, Path, State, WebSocketUpgrade},
    response::Response,
};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::messages::PresenceMessage;
use super::registry::CONNECTION_BUFFER_SIZE;
use super::socket::Connection;
use crate::shared::{AppError, AppState};

/// WebSocket endpoint for a room display's live viewer count
/// GET /:room_id/ws
pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    Path(room_id): Path<String>,
    State(app_state): State<AppState>,
) -> Result<Response, AppError> {
    info!(room_id = %room_id, "WebSocket connection requested");

    if room_id.trim().is_empty() {
        return Err(AppError::InvalidRequest("room id must not be empty".to_string()));
    }

    if !app_state.registry.has_capacity(&room_id) {
        warn!(room_id = %room_id, "Room is full, rejecting WebSocket connection");
        return Err(AppError::ResourceExhausted(format!(
            "room {} has no free connection slots",
            room_id
        )));
    }

    Ok(ws.on_upgrade(move |socket| handle_websocket_connection(socket, room_id, app_state)))
}

/// Handle the upgraded WebSocket connection
async fn handle_websocket_connection(socket: WebSocket, room_id: String, app_state: AppState) {
    // Create the outbound channel (registry -> client)
    let (outbound_sender, outbound_receiver) = mpsc::channel::<String>(CONNECTION_BUFFER_SIZE);

    let handle = match app_state.registry.register(&room_id, outbound_sender.clone()) {
        Ok(handle) => handle,
        Err(e) => {
            warn!(room_id = %room_id, error = %e, "Could not register connection, closing");
            let _ = socket.close().await;
            return;
        }
    };

    info!(
        room_id = %room_id,
        connection_id = %handle.id,
        "WebSocket connection established"
    );

    // Greet the new viewer with the current count instead of making it wait a full tick
    let count = app_state.registry.count(&room_id);
    match PresenceMessage::presence_count(&room_id, count, 0).and_then(|m| m.to_json()) {
        Ok(message_json) => {
            if outbound_sender.try_send(message_json).is_ok() {
                debug!(room_id = %room_id, count = count, "Sent initial presence count");
            }
        }
        Err(e) => warn!(room_id = %room_id, error = %e, "Failed to serialize initial count"),
    }
    // Only the registry may keep the connection alive from here on
    drop(outbound_sender);

    let connection = Connection::new(
        room_id.clone(),
        Box::new(socket),
        outbound_receiver,
        app_state.presence.send_timeout,
    );

    // Run the connection until disconnect or eviction
    match connection.run().await {
        Ok(()) => {
            info!(
                room_id = %room_id,
                connection_id = %handle.id,
                "WebSocket connection closed cleanly"
            );
        }
        Err(e) => {
            warn!(
                room_id = %room_id,
                connection_id = %handle.id,
                error = %e,
                "WebSocket connection error"
            );
        }
    }

    app_state.registry.unregister(&handle);
}
