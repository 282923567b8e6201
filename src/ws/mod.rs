pub mod actor;
pub mod broadcast;
pub mod handler;
pub mod protocol;

use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::hub::ConnectionId;

/// Type alias for the sender half of a WebSocket connection's channel.
/// The broadcast gateway clones this to push frames to a specific client.
pub type ConnectionSender = mpsc::UnboundedSender<axum::extract::ws::Message>;

/// Sender map: one writer channel per live connection, keyed by the id the
/// hub allocated for it. Holds no presence state — that lives in the hub.
pub type SenderMap = Arc<DashMap<ConnectionId, ConnectionSender>>;

/// Create a new empty sender map.
pub fn new_sender_map() -> SenderMap {
    Arc::new(DashMap::new())
}
