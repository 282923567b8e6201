//! Outbound broadcast instructions produced by hub transitions.
//!
//! Transitions never touch the network: they return a batch of [`Outbound`]
//! instructions that the transport's broadcast gateway delivers after the
//! hub lock is released. Tests assert on these batches directly.

use crate::ws::protocol::ServerFrame;

use super::registry::ConnectionId;

/// Delivery address for one outbound frame. Room recipients are resolved to
/// member ids by the coordinator (it owns the directory; the gateway stays
/// stateless), keeping the room name alongside for logging and tests.
#[derive(Debug, Clone, PartialEq)]
pub enum Recipients {
    /// Unicast to one connection.
    Connection(ConnectionId),
    /// All members of one room, as of the instant of the transition.
    Room {
        name: String,
        members: Vec<ConnectionId>,
    },
    /// Every live connection.
    All,
}

/// One addressed frame, emitted fire-and-forget.
#[derive(Debug, Clone, PartialEq)]
pub struct Outbound {
    pub to: Recipients,
    pub frame: ServerFrame,
}

impl Outbound {
    pub fn to_connection(id: ConnectionId, frame: ServerFrame) -> Self {
        Self {
            to: Recipients::Connection(id),
            frame,
        }
    }

    pub fn to_room(name: impl Into<String>, members: Vec<ConnectionId>, frame: ServerFrame) -> Self {
        Self {
            to: Recipients::Room {
                name: name.into(),
                members,
            },
            frame,
        }
    }

    pub fn to_all(frame: ServerFrame) -> Self {
        Self {
            to: Recipients::All,
            frame,
        }
    }
}
