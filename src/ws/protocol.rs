//! JSON wire protocol: `{"event": <name>, "data": <payload>}` frames in both
//! directions. Event names and payload shapes match what chat clients
//! already speak: `join`, `leave-room`, `chat message`, `create room`
//! inbound; `active rooms`, `new room`, `room closed`, `active users`,
//! `chat message` outbound.

use serde::{Deserialize, Serialize};

use crate::hub::directory::UserInfo;

/// Client-to-server frames. Also the tagged event type consumed by the hub's
/// transition function — the transport decodes a frame and hands it over
/// unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum ClientFrame {
    /// Join a room under a display name, implicitly leaving any prior room.
    #[serde(rename = "join")]
    Join { name: String, room: String },

    /// Explicitly leave a room. Payload is the bare room name.
    #[serde(rename = "leave-room")]
    LeaveRoom(String),

    /// Room-scoped text message; relayed to the room's members including
    /// the sender.
    #[serde(rename = "chat message")]
    Chat { room: String, text: String },

    /// Create a room without joining it. Payload is the bare room name.
    #[serde(rename = "create room")]
    CreateRoom(String),
}

/// Server-to-client frames.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", content = "data")]
pub enum ServerFrame {
    /// Snapshot of all active room names; unicast to a freshly connected
    /// client.
    #[serde(rename = "active rooms")]
    ActiveRooms(Vec<String>),

    /// A room came into existence (first join or explicit create).
    /// `id` duplicates the name for client-side keying.
    #[serde(rename = "new room")]
    NewRoom { id: String, name: String },

    /// A non-permanent room lost its last member and was deleted.
    /// Payload is the bare room name.
    #[serde(rename = "room closed")]
    RoomClosed(String),

    /// Full membership of one room after a change; sent to that room.
    #[serde(rename = "active users")]
    ActiveUsers { room: String, users: Vec<UserInfo> },

    /// A relayed chat message with server-attached sender metadata.
    #[serde(rename = "chat message")]
    Chat {
        room: String,
        text: String,
        sender: UserInfo,
        sent_at: i64,
    },
}
