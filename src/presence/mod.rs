// Public API
pub use broadcaster::{start_presence_broadcaster, BroadcastConfig, PresenceBroadcaster, TickReport};
pub use handler::websocket_handler;
pub use messages::{MessageType, PresenceCountPayload, PresenceMessage, PROTOCOL_VERSION};
pub use registry::{
    ConnectionHandle, ConnectionId, ConnectionRegistry, ConnectionSender, DeliveryError,
    InMemoryConnectionRegistry, RoomSnapshot, CONNECTION_BUFFER_SIZE,
};
pub use socket::{Connection, Inbound, SocketError, SocketWrapper};

// Internal modules
mod broadcaster;
mod handler;
mod messages;
mod registry;
mod socket;
