//! The presence hub: connection registry, room directory, and the
//! coordinator that mutates both in response to lifecycle events.
//!
//! All hub state is owned by [`Hub`] and shared behind a single mutex.
//! Transitions run under the lock and return outbound broadcast
//! instructions; delivery happens after the lock is released.

pub mod coordinator;
pub mod directory;
pub mod events;
pub mod registry;

pub use coordinator::Hub;
pub use registry::ConnectionId;

use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by hub transitions. A failing event leaves state
/// untouched and emits nothing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HubError {
    /// The transport forwarded an event for a connection id that was never
    /// registered (or already removed). Indicates a transport adapter bug:
    /// adapters must register before forwarding events.
    #[error("unknown connection {0}")]
    UnknownConnection(ConnectionId),

    /// Empty, whitespace-only, or over-length room name.
    #[error("invalid room name {0:?}")]
    InvalidRoomName(String),

    /// Empty, whitespace-only, or over-length display name.
    #[error("invalid display name {0:?}")]
    InvalidDisplayName(String),
}

/// The hub serialization point: every transition takes this lock, so no two
/// transitions ever interleave their reads and writes of registry/directory.
pub type SharedHub = Arc<Mutex<Hub>>;

pub fn new_shared(hub: Hub) -> SharedHub {
    Arc::new(Mutex::new(hub))
}
