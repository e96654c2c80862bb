//! Room struct definition
//!
//! Represents a bounded chat group. The room is the authoritative owner of
//! membership; sessions only hold a back-reference to the room id.

use crate::types::{RoomId, SessionId};

/// Bounded chat room
///
/// Members are kept in join order. A room never holds more than
/// `capacity` sessions.
#[derive(Debug)]
pub struct Room {
    /// Room number, fixed at registry creation
    pub id: RoomId,
    /// Current members, in join order
    members: Vec<SessionId>,
    /// Maximum number of members
    capacity: usize,
}

impl Room {
    /// Create an empty room
    pub fn new(id: RoomId, capacity: usize) -> Self {
        Self {
            id,
            members: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Check if room is at capacity
    pub fn is_full(&self) -> bool {
        self.members.len() >= self.capacity
    }

    /// Check if room has no members
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Check if a session is in this room
    pub fn contains(&self, session_id: SessionId) -> bool {
        self.members.contains(&session_id)
    }

    /// Add a member
    ///
    /// Returns false if the room is full or the session is already a member.
    pub fn add_member(&mut self, session_id: SessionId) -> bool {
        if self.is_full() || self.contains(session_id) {
            return false;
        }
        self.members.push(session_id);
        true
    }

    /// Remove a member
    ///
    /// Returns true if the session was a member.
    pub fn remove_member(&mut self, session_id: SessionId) -> bool {
        let before = self.members.len();
        self.members.retain(|id| *id != session_id);
        self.members.len() != before
    }

    /// Current members, in join order
    pub fn members(&self) -> &[SessionId] {
        &self.members
    }

    /// Get the number of members in the room
    pub fn member_count(&self) -> usize {
        self.members.len()
    }
}
