//! Connection registry: identity and current-room tracking per live
//! connection. Owned exclusively by the coordinator.

use std::collections::HashMap;
use std::fmt;

use serde::Serialize;
use uuid::Uuid;

use super::HubError;

/// Opaque per-connection identifier, allocated once per transport connect.
/// Serialized as the UUID string in wire payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    pub(crate) fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// One live connection. Created anonymous on transport connect; name and
/// room are populated by join and cleared by leave.
#[derive(Debug, Clone, Default)]
pub struct Connection {
    /// Display name, set at join time. Mutable only by rejoining.
    pub name: Option<String>,
    /// Current room, at most one at a time.
    pub room: Option<String>,
}

/// Mapping from connection id to connection. Entries are removed on
/// disconnect.
#[derive(Debug, Default)]
pub struct Registry {
    connections: HashMap<ConnectionId, Connection>,
}

impl Registry {
    /// Allocate and store a fresh id with empty name/room. Never fails.
    pub fn register(&mut self) -> ConnectionId {
        let id = ConnectionId::new();
        self.connections.insert(id, Connection::default());
        id
    }

    /// Set the display name for an existing connection.
    pub fn set_identity(&mut self, id: ConnectionId, name: &str) -> Result<(), HubError> {
        let conn = self
            .connections
            .get_mut(&id)
            .ok_or(HubError::UnknownConnection(id))?;
        conn.name = Some(name.to_string());
        Ok(())
    }

    /// Update the current-room pointer for an existing connection.
    pub fn set_room(&mut self, id: ConnectionId, room: Option<String>) -> Result<(), HubError> {
        let conn = self
            .connections
            .get_mut(&id)
            .ok_or(HubError::UnknownConnection(id))?;
        conn.room = room;
        Ok(())
    }

    /// Delete the entry. No-op if already absent, so disconnect cleanup is
    /// idempotent under races with an in-flight explicit leave.
    pub fn remove(&mut self, id: ConnectionId) {
        self.connections.remove(&id);
    }

    /// Lookup, no side effects.
    pub fn get(&self, id: ConnectionId) -> Option<&Connection> {
        self.connections.get(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (ConnectionId, &Connection)> {
        self.connections.iter().map(|(id, conn)| (*id, conn))
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }
}
