//! Room directory: the set of rooms that exist and their membership.
//! Owned exclusively by the coordinator.
//!
//! Lifecycle invariant: a permanent room always exists, even with zero
//! members; a non-permanent room with zero members never exists.

use std::collections::BTreeMap;

use serde::Serialize;

use super::registry::ConnectionId;

/// One room member as it appears in broadcast payloads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserInfo {
    pub id: ConnectionId,
    pub name: String,
}

/// Read-only room summary for the REST snapshot endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct RoomSummary {
    pub name: String,
    pub members: usize,
    pub permanent: bool,
}

#[derive(Debug, Default)]
struct Room {
    // Ordered map so membership snapshots are deterministic.
    members: BTreeMap<ConnectionId, String>,
    permanent: bool,
    // An explicitly created room sits empty until its first join; only
    // once occupied does emptiness mean the room must be gone.
    ever_occupied: bool,
}

/// Mapping from room name (case-sensitive) to room. Keys are exactly the
/// set of active rooms advertised to clients.
#[derive(Debug, Default)]
pub struct Directory {
    rooms: BTreeMap<String, Room>,
}

impl Directory {
    /// Build a directory pre-seeded with the permanent rooms. Called at
    /// startup, before any connection is accepted.
    pub fn with_permanent_rooms<I>(names: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        let rooms = names
            .into_iter()
            .map(|name| {
                (
                    name,
                    Room {
                        permanent: true,
                        ..Room::default()
                    },
                )
            })
            .collect();
        Self { rooms }
    }

    /// Create the room with empty membership if absent. Returns whether it
    /// was newly created. Idempotent.
    pub fn ensure_room(&mut self, name: &str) -> bool {
        if self.rooms.contains_key(name) {
            return false;
        }
        self.rooms.insert(name.to_string(), Room::default());
        true
    }

    /// Add a member, creating the room first if needed. Returns whether the
    /// room was newly created (the coordinator announces new rooms).
    /// Idempotent under duplicate add.
    pub fn add_member(&mut self, room: &str, id: ConnectionId, name: &str) -> bool {
        let created = self.ensure_room(room);
        if let Some(entry) = self.rooms.get_mut(room) {
            entry.members.insert(id, name.to_string());
            entry.ever_occupied = true;
        }
        created
    }

    /// Remove a member if present (no-op otherwise). Returns the member
    /// count after removal and whether the room exists at all.
    pub fn remove_member(&mut self, room: &str, id: ConnectionId) -> (usize, bool) {
        match self.rooms.get_mut(room) {
            Some(entry) => {
                entry.members.remove(&id);
                (entry.members.len(), true)
            }
            None => (0, false),
        }
    }

    /// Delete the room entry when membership is empty and it is not
    /// permanent. Returns whether deletion occurred.
    pub fn delete_if_empty_and_not_permanent(&mut self, room: &str) -> bool {
        let deletable = self
            .rooms
            .get(room)
            .is_some_and(|r| r.members.is_empty() && !r.permanent);
        if deletable {
            self.rooms.remove(room);
        }
        deletable
    }

    pub fn contains(&self, room: &str) -> bool {
        self.rooms.contains_key(room)
    }

    /// Names of all active rooms.
    pub fn room_names(&self) -> Vec<String> {
        self.rooms.keys().cloned().collect()
    }

    /// Owned membership snapshot for broadcast payloads. Reflects
    /// membership at the instant of the call and is never mutated after
    /// return, so callers may serialize it as-is.
    pub fn members(&self, room: &str) -> Vec<UserInfo> {
        self.rooms
            .get(room)
            .map(|r| {
                r.members
                    .iter()
                    .map(|(id, name)| UserInfo {
                        id: *id,
                        name: name.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Member ids only, for addressing a room broadcast.
    pub fn member_ids(&self, room: &str) -> Vec<ConnectionId> {
        self.rooms
            .get(room)
            .map(|r| r.members.keys().copied().collect())
            .unwrap_or_default()
    }

    /// Room lifecycle invariant: once a non-permanent room has been
    /// occupied, it must never be observed empty — emptiness deletes it.
    pub fn lifecycle_invariant_holds(&self) -> bool {
        self.rooms
            .values()
            .all(|r| r.permanent || !r.ever_occupied || !r.members.is_empty())
    }

    pub fn summaries(&self) -> Vec<RoomSummary> {
        self.rooms
            .iter()
            .map(|(name, room)| RoomSummary {
                name: name.clone(),
                members: room.members.len(),
                permanent: room.permanent,
            })
            .collect()
    }

}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded() -> Directory {
        Directory::with_permanent_rooms(["General".to_string(), "Random".to_string()])
    }

    #[test]
    fn permanent_rooms_exist_empty_at_startup() {
        let dir = seeded();
        assert_eq!(dir.room_names(), vec!["General", "Random"]);
        assert!(dir.members("General").is_empty());
    }

    #[test]
    fn ensure_room_is_idempotent() {
        let mut dir = seeded();
        assert!(dir.ensure_room("Lobby"));
        assert!(!dir.ensure_room("Lobby"));
        assert!(!dir.ensure_room("General"));
    }

    #[test]
    fn add_member_reports_room_creation() {
        let mut dir = seeded();
        let id = ConnectionId::new();

        assert!(dir.add_member("Lobby", id, "Ann"));
        assert!(!dir.add_member("Lobby", id, "Ann"));
        assert_eq!(
            dir.members("Lobby"),
            vec![UserInfo {
                id,
                name: "Ann".to_string()
            }]
        );
    }

    #[test]
    fn duplicate_add_keeps_single_membership_entry() {
        let mut dir = seeded();
        let id = ConnectionId::new();
        dir.add_member("Lobby", id, "Ann");
        dir.add_member("Lobby", id, "Annie");

        let members = dir.members("Lobby");
        assert_eq!(members.len(), 1);
        assert_eq!(members[0].name, "Annie");
    }

    #[test]
    fn remove_member_reports_remaining_count() {
        let mut dir = seeded();
        let a = ConnectionId::new();
        let b = ConnectionId::new();
        dir.add_member("Lobby", a, "Ann");
        dir.add_member("Lobby", b, "Ben");

        assert_eq!(dir.remove_member("Lobby", a), (1, true));
        assert_eq!(dir.remove_member("Lobby", a), (1, true));
        assert_eq!(dir.remove_member("Nowhere", a), (0, false));
    }

    #[test]
    fn delete_if_empty_spares_permanent_rooms() {
        let mut dir = seeded();
        assert!(!dir.delete_if_empty_and_not_permanent("General"));
        assert!(dir.contains("General"));

        let id = ConnectionId::new();
        dir.add_member("Lobby", id, "Ann");
        // Not empty yet.
        assert!(!dir.delete_if_empty_and_not_permanent("Lobby"));

        dir.remove_member("Lobby", id);
        assert!(dir.delete_if_empty_and_not_permanent("Lobby"));
        assert!(!dir.contains("Lobby"));
    }

    #[test]
    fn explicitly_created_room_may_sit_empty_until_first_join() {
        let mut dir = seeded();
        dir.ensure_room("Den");
        assert!(dir.lifecycle_invariant_holds());

        // Once occupied, emptiness without deletion violates the invariant.
        let id = ConnectionId::new();
        dir.add_member("Den", id, "Ann");
        dir.remove_member("Den", id);
        assert!(!dir.lifecycle_invariant_holds());

        assert!(dir.delete_if_empty_and_not_permanent("Den"));
        assert!(dir.lifecycle_invariant_holds());
    }

    #[test]
    fn membership_snapshot_is_isolated_from_later_mutation() {
        let mut dir = seeded();
        let id = ConnectionId::new();
        dir.add_member("Lobby", id, "Ann");

        let snapshot = dir.members("Lobby");
        dir.remove_member("Lobby", id);
        assert_eq!(snapshot.len(), 1);
        assert!(dir.members("Lobby").is_empty());
    }
}
