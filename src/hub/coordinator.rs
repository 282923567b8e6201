//! The presence coordinator: the single choke point through which every
//! registry/directory mutation flows.
//!
//! Each transition implements one row of the lifecycle table: validate,
//! mutate registry and directory together, and return the broadcast
//! instructions the change calls for. Room creation and closure are derived
//! here from membership transitions, never commanded from outside.

use chrono::Utc;

use super::directory::{Directory, RoomSummary, UserInfo};
use super::events::Outbound;
use super::registry::{Connection, ConnectionId, Registry};
use super::HubError;
use crate::ws::protocol::{ClientFrame, ServerFrame};

pub struct Hub {
    registry: Registry,
    directory: Directory,
    /// Upper bound on room and display name length, in bytes.
    max_name_length: usize,
}

impl Hub {
    /// Build a hub with the permanent rooms already seeded, before any
    /// connection is accepted.
    pub fn new<I>(permanent_rooms: I, max_name_length: usize) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        Self {
            registry: Registry::default(),
            directory: Directory::with_permanent_rooms(permanent_rooms),
            max_name_length,
        }
    }

    /// Transport connect: register the connection and greet it with the
    /// active-rooms snapshot. Never fails.
    pub fn connect(&mut self) -> (ConnectionId, Vec<Outbound>) {
        let id = self.registry.register();
        let frame = ServerFrame::ActiveRooms(self.directory.room_names());
        (id, vec![Outbound::to_connection(id, frame)])
    }

    /// Apply one client event. On error, no state was mutated and nothing
    /// is emitted.
    pub fn apply(
        &mut self,
        id: ConnectionId,
        frame: ClientFrame,
    ) -> Result<Vec<Outbound>, HubError> {
        match frame {
            ClientFrame::Join { name, room } => self.join(id, &name, &room),
            ClientFrame::LeaveRoom(room) => self.leave(id, &room),
            ClientFrame::Chat { room, text } => self.chat(id, room, text),
            ClientFrame::CreateRoom(name) => self.create_room(id, &name),
        }
    }

    /// Transport disconnect: implicit leave of the current room, then
    /// registry removal. Idempotent — a second disconnect (or one racing an
    /// explicit leave) observes absent state and does nothing.
    pub fn disconnect(&mut self, id: ConnectionId) -> Vec<Outbound> {
        let mut out = Vec::new();
        if let Some(room) = self.registry.get(id).and_then(|c| c.room.clone()) {
            self.depart(id, &room, &mut out);
        }
        self.registry.remove(id);
        out
    }

    fn join(&mut self, id: ConnectionId, name: &str, room: &str) -> Result<Vec<Outbound>, HubError> {
        self.check_room_name(room)?;
        self.check_display_name(name)?;
        let prior = self
            .registry
            .get(id)
            .ok_or(HubError::UnknownConnection(id))?
            .room
            .clone();

        let mut out = Vec::new();
        // Implicit leave first: a connection is a member of at most one
        // room, and switching rooms must not leave stale membership behind.
        if let Some(old) = prior {
            self.depart(id, &old, &mut out);
        }

        self.registry.set_identity(id, name)?;
        self.registry.set_room(id, Some(room.to_string()))?;
        let created = self.directory.add_member(room, id, name);

        if created {
            out.push(Outbound::to_all(ServerFrame::NewRoom {
                id: room.to_string(),
                name: room.to_string(),
            }));
        }
        out.push(self.active_users(room));

        tracing::info!(conn_id = %id, name = %name, room = %room, "Joined room");
        Ok(out)
    }

    fn leave(&mut self, id: ConnectionId, room: &str) -> Result<Vec<Outbound>, HubError> {
        // A leave overlapping disconnect cleanup observes already-absent
        // state and takes the no-op path; it never errors or
        // double-decrements membership.
        let Some(conn) = self.registry.get(id) else {
            return Ok(Vec::new());
        };
        // Leaving a room the connection is not in is a silent no-op.
        if conn.room.as_deref() != Some(room) {
            return Ok(Vec::new());
        }

        self.registry.set_room(id, None)?;
        let mut out = Vec::new();
        self.depart(id, room, &mut out);
        Ok(out)
    }

    /// Shared leave effect for explicit leave, implicit leave-on-join, and
    /// disconnect: drop membership, then either close the emptied room or
    /// announce the shrunken member list.
    fn depart(&mut self, id: ConnectionId, room: &str, out: &mut Vec<Outbound>) {
        let (_, exists) = self.directory.remove_member(room, id);
        if !exists {
            return;
        }
        if self.directory.delete_if_empty_and_not_permanent(room) {
            tracing::info!(room = %room, "Room closed");
            out.push(Outbound::to_all(ServerFrame::RoomClosed(room.to_string())));
        } else {
            out.push(self.active_users(room));
        }
    }

    /// Pure relay: no membership check on the sender, delivery to the
    /// room's current members (echoed to the sender if it is one). A room
    /// with no members means delivery to nobody, not an error.
    fn chat(
        &mut self,
        id: ConnectionId,
        room: String,
        text: String,
    ) -> Result<Vec<Outbound>, HubError> {
        let sender = self
            .registry
            .get(id)
            .ok_or(HubError::UnknownConnection(id))?;
        let sender = UserInfo {
            id,
            name: sender.name.clone().unwrap_or_default(),
        };

        let members = self.directory.member_ids(&room);
        if members.is_empty() {
            return Ok(Vec::new());
        }

        let frame = ServerFrame::Chat {
            room: room.clone(),
            text,
            sender,
            sent_at: Utc::now().timestamp_millis(),
        };
        Ok(vec![Outbound::to_room(room, members, frame)])
    }

    fn create_room(&mut self, id: ConnectionId, name: &str) -> Result<Vec<Outbound>, HubError> {
        self.check_room_name(name)?;
        if self.registry.get(id).is_none() {
            return Err(HubError::UnknownConnection(id));
        }
        // Creating a room that already exists is a silent no-op: no
        // duplicate announcement.
        if !self.directory.ensure_room(name) {
            return Ok(Vec::new());
        }

        tracing::info!(room = %name, "Room created");
        Ok(vec![Outbound::to_all(ServerFrame::NewRoom {
            id: name.to_string(),
            name: name.to_string(),
        })])
    }

    fn active_users(&self, room: &str) -> Outbound {
        let users = self.directory.members(room);
        let members = users.iter().map(|u| u.id).collect();
        Outbound::to_room(
            room,
            members,
            ServerFrame::ActiveUsers {
                room: room.to_string(),
                users,
            },
        )
    }

    fn check_room_name(&self, name: &str) -> Result<(), HubError> {
        if name.trim().is_empty() || name.len() > self.max_name_length {
            return Err(HubError::InvalidRoomName(name.to_string()));
        }
        Ok(())
    }

    fn check_display_name(&self, name: &str) -> Result<(), HubError> {
        if name.trim().is_empty() || name.len() > self.max_name_length {
            return Err(HubError::InvalidDisplayName(name.to_string()));
        }
        Ok(())
    }

    // --- Read-only snapshots (REST endpoint and tests) ---

    pub fn room_names(&self) -> Vec<String> {
        self.directory.room_names()
    }

    pub fn members(&self, room: &str) -> Vec<UserInfo> {
        self.directory.members(room)
    }

    pub fn rooms_snapshot(&self) -> Vec<RoomSummary> {
        self.directory.summaries()
    }

    pub fn connection(&self, id: ConnectionId) -> Option<&Connection> {
        self.registry.get(id)
    }

    pub fn connection_count(&self) -> usize {
        self.registry.len()
    }

    /// Registry/directory bidirectional consistency check, used by tests:
    /// every membership entry must belong to a registered connection whose
    /// current room agrees, every connection's current room must contain
    /// it, and no once-occupied non-permanent room may sit empty.
    pub fn is_consistent(&self) -> bool {
        if !self.directory.lifecycle_invariant_holds() {
            return false;
        }
        for summary in self.rooms_snapshot() {
            for member in self.members(&summary.name) {
                match self.connection(member.id) {
                    Some(conn) if conn.room.as_deref() == Some(summary.name.as_str()) => {}
                    _ => return false,
                }
            }
        }
        self.registry.iter().all(|(id, conn)| match &conn.room {
            None => true,
            Some(room) => self.directory.members(room).iter().any(|u| u.id == id),
        })
    }
}
