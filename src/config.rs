//! Server configuration
//!
//! Room sizing, bind address and per-session buffer limits.

use crate::error::AppError;

/// Default bind address
pub const DEFAULT_ADDR: &str = "0.0.0.0:5000";

/// Default number of sessions a room can hold
pub const ROOM_MAX_USER: usize = 5;

/// Default number of rooms in the registry
pub const ROOM_MAX_COUNT: usize = 50;

/// Default outbox depth per session
pub const OUTBOX_CAPACITY: usize = 64;

/// Default longest accepted inbound line, in bytes
pub const MAX_FRAME_LENGTH: usize = 4096;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address the listener binds
    pub addr: String,
    /// Capacity of every room
    pub room_max_user: usize,
    /// Number of rooms created at startup
    pub room_max_count: usize,
    /// Queued outbound messages per session before deliveries are dropped
    pub outbox_capacity: usize,
    /// Longest inbound frame before the session is closed
    pub max_frame_length: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: DEFAULT_ADDR.to_string(),
            room_max_user: ROOM_MAX_USER,
            room_max_count: ROOM_MAX_COUNT,
            outbox_capacity: OUTBOX_CAPACITY,
            max_frame_length: MAX_FRAME_LENGTH,
        }
    }
}

impl ServerConfig {
    /// Reject sizes the registry and channels cannot work with
    pub fn validate(&self) -> Result<(), AppError> {
        if self.room_max_user == 0 {
            return Err(AppError::InvalidConfig(
                "room_max_user must be at least 1".to_string(),
            ));
        }
        if self.room_max_count == 0 {
            return Err(AppError::InvalidConfig(
                "room_max_count must be at least 1".to_string(),
            ));
        }
        if self.max_frame_length == 0 {
            return Err(AppError::InvalidConfig(
                "max_frame_length must be at least 1".to_string(),
            ));
        }
        if self.outbox_capacity == 0 {
            return Err(AppError::InvalidConfig(
                "outbox_capacity must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Total sessions the server can hold at once
    pub fn capacity(&self) -> usize {
        self.room_max_user * self.room_max_count
    }
}
