//! Room struct definition
//!
//! A named set of connection handles.

use std::collections::HashSet;
use std::time::Instant;

use crate::types::{ConnectionId, RoomKey};

/// Signaling room
///
/// Holds connection IDs only; there is no host and no capacity limit.
#[derive(Debug)]
pub struct Room {
    /// Room key for identification
    pub key: RoomKey,
    /// Current members
    pub members: HashSet<ConnectionId>,
    /// Room creation time
    pub created_at: Instant,
}

impl Room {
    /// Create a new, empty room
    pub fn new(key: RoomKey) -> Self {
        Self {
            key,
            members: HashSet::new(),
            created_at: Instant::now(),
        }
    }

    /// Add a member. Returns false if it was already present.
    pub fn add_member(&mut self, id: ConnectionId) -> bool {
        self.members.insert(id)
    }

    /// Remove a member. Returns false if it was not present.
    pub fn remove_member(&mut self, id: ConnectionId) -> bool {
        self.members.remove(&id)
    }

    pub fn contains(&self, id: ConnectionId) -> bool {
        self.members.contains(&id)
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Get the number of members in the room
    pub fn member_count(&self) -> usize {
        self.members.len()
    }
}
