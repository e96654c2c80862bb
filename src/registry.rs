//! Room registry
//!
//! A fixed arena of rooms created once at startup. Rooms are addressed by
//! `RoomId` and only ever mutated in place through the registry.

use crate::error::AppError;
use crate::room::Room;
use crate::types::{RoomId, SessionId};

#[derive(Debug)]
pub struct RoomRegistry {
    /// Rooms in id order; `rooms[i].id == RoomId(i + 1)`
    rooms: Vec<Room>,
}

impl RoomRegistry {
    /// Create `room_count` empty rooms numbered `1..=room_count`
    pub fn new(room_count: usize, room_capacity: usize) -> Self {
        let rooms = (1..=room_count)
            .map(|id| Room::new(RoomId(id), room_capacity))
            .collect();
        Self { rooms }
    }

    /// Lowest-numbered room with free capacity
    pub fn allocate(&self) -> Result<RoomId, AppError> {
        self.rooms
            .iter()
            .find(|room| !room.is_full())
            .map(|room| room.id)
            .ok_or(AppError::NoCapacity)
    }

    /// Add a session to a room
    ///
    /// Name uniqueness is the caller's concern. Returns false if the room
    /// does not exist, is full, or already holds the session.
    pub fn join(&mut self, room_id: RoomId, session_id: SessionId) -> bool {
        self.room_mut(room_id)
            .map(|room| room.add_member(session_id))
            .unwrap_or(false)
    }

    /// Remove a session from a room; no-op if absent
    pub fn leave(&mut self, room_id: RoomId, session_id: SessionId) -> bool {
        self.room_mut(room_id)
            .map(|room| room.remove_member(session_id))
            .unwrap_or(false)
    }

    /// Look up a room by id
    pub fn room(&self, room_id: RoomId) -> Option<&Room> {
        room_id
            .0
            .checked_sub(1)
            .and_then(|index| self.rooms.get(index))
    }

    fn room_mut(&mut self, room_id: RoomId) -> Option<&mut Room> {
        room_id
            .0
            .checked_sub(1)
            .and_then(|index| self.rooms.get_mut(index))
    }

    /// Room currently holding `session_id`, from room membership
    pub fn room_of(&self, session_id: SessionId) -> Option<RoomId> {
        self.rooms
            .iter()
            .find(|room| room.contains(session_id))
            .map(|room| room.id)
    }

    /// Members of one room, empty if the room does not exist
    pub fn members(&self, room_id: RoomId) -> &[SessionId] {
        self.room(room_id).map(Room::members).unwrap_or(&[])
    }

    /// Every member of every room, in room order
    pub fn all_members(&self) -> impl Iterator<Item = SessionId> + '_ {
        self.rooms.iter().flat_map(|room| room.members().iter().copied())
    }

    /// All rooms in id order
    pub fn rooms(&self) -> &[Room] {
        &self.rooms
    }

    /// Number of rooms
    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }
}
