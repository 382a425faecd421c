//! Connection registry
//!
//! Maps room keys to rooms. Every key present maps to a non-empty room:
//! a room is created on first join and removed as soon as its last member
//! leaves. The registry has no locking of its own; it is owned by the
//! `RelayServer` actor, which serializes every call.

use std::collections::HashMap;

use tracing::debug;

use crate::room::Room;
use crate::types::{ConnectionId, RoomKey};

#[derive(Debug, Default)]
pub struct Registry {
    rooms: HashMap<RoomKey, Room>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the room for `key`, creating an empty one if absent
    ///
    /// Callers must add a member before handing control back, or the
    /// non-empty invariant is broken. `add_member` is the only caller.
    pub(crate) fn ensure_room(&mut self, key: &RoomKey) -> &mut Room {
        self.rooms.entry(key.clone()).or_insert_with(|| {
            debug!("Room {} created", key);
            Room::new(key.clone())
        })
    }

    /// Add `id` to the room, creating the room if needed
    ///
    /// Returns the member count after the insert. Adding an existing member
    /// changes nothing.
    pub fn add_member(&mut self, key: &RoomKey, id: ConnectionId) -> usize {
        let room = self.ensure_room(key);
        room.add_member(id);
        room.member_count()
    }

    /// Remove `id` from the room, deleting the room once it is empty
    ///
    /// Returns the remaining member count, or `None` if the room does not
    /// exist.
    pub fn remove_member(&mut self, key: &RoomKey, id: ConnectionId) -> Option<usize> {
        let room = self.rooms.get_mut(key)?;
        room.remove_member(id);
        let remaining = room.member_count();

        if room.is_empty() {
            if let Some(room) = self.rooms.remove(key) {
                debug!(
                    "Room {} deleted (empty) after {:?}",
                    room.key,
                    room.created_at.elapsed()
                );
            }
        }

        Some(remaining)
    }

    /// Members of the room other than `exclude` for which `is_open` holds
    ///
    /// The iterator is lazy and `Clone`, so it can be walked more than once.
    /// A missing room yields nothing.
    pub fn members_except<'a, F>(
        &'a self,
        key: &RoomKey,
        exclude: ConnectionId,
        is_open: F,
    ) -> impl Iterator<Item = ConnectionId> + Clone + 'a
    where
        F: Fn(ConnectionId) -> bool + Clone + 'a,
    {
        self.rooms
            .get(key)
            .into_iter()
            .flat_map(|room| room.members.iter().copied())
            .filter(move |id| *id != exclude && is_open(*id))
    }

    pub fn contains_room(&self, key: &RoomKey) -> bool {
        self.rooms.contains_key(key)
    }

    /// Member count of a room, `None` if it does not exist
    pub fn member_count(&self, key: &RoomKey) -> Option<usize> {
        self.rooms.get(key).map(Room::member_count)
    }

    /// Whether `id` is a member of the room
    pub fn is_member(&self, key: &RoomKey, id: ConnectionId) -> bool {
        self.rooms.get(key).is_some_and(|room| room.contains(id))
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }
}
