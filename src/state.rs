use crate::hub::SharedHub;
use crate::ws::SenderMap;

/// Shared application state passed to all handlers via axum State extractor.
#[derive(Clone)]
pub struct AppState {
    /// The presence hub behind its serialization lock
    pub hub: SharedHub,
    /// Writer channels for all live WebSocket connections
    pub senders: SenderMap,
}
