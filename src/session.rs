//! Session struct definition
//!
//! Server-side record of a connected client: identity, lifecycle state,
//! room back-reference and the outbox drained by the connection's write task.

use tokio::sync::mpsc;

use crate::error::DeliveryError;
use crate::message::ServerMessage;
use crate::types::{RoomId, SessionId};

/// Session lifecycle
///
/// `Connected → AwaitingLogin → Active → Closing`; any state may move to
/// `Closing`, which is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Connected,
    AwaitingLogin,
    Active,
    Closing,
}

/// Connected session information
#[derive(Debug)]
pub struct Session {
    /// Unique identifier for this session
    pub id: SessionId,
    /// Display name (None before login)
    pub name: Option<String>,
    /// Room holding this session (None before login)
    pub room: Option<RoomId>,
    /// Lifecycle state
    pub state: SessionState,
    /// Server → Client message channel
    outbox: mpsc::Sender<ServerMessage>,
}

impl Session {
    /// Create a session that is waiting for its login frame
    pub fn new(id: SessionId, outbox: mpsc::Sender<ServerMessage>) -> Self {
        Self {
            id,
            name: None,
            room: None,
            state: SessionState::AwaitingLogin,
            outbox,
        }
    }

    /// Queue a message for this session's connection
    ///
    /// Never waits: a full outbox means the peer is not keeping up and the
    /// message is dropped for this recipient only.
    pub fn deliver(&self, msg: ServerMessage) -> Result<(), DeliveryError> {
        self.outbox.try_send(msg).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => DeliveryError::OutboxFull,
            mpsc::error::TrySendError::Closed(_) => DeliveryError::OutboxClosed,
        })
    }

    /// Get the display name for this session
    ///
    /// Returns the name if set, otherwise "unknown".
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("unknown")
    }

    pub fn is_active(&self) -> bool {
        self.state == SessionState::Active
    }

    /// Record a successful login
    pub fn activate(&mut self, name: String, room: RoomId) {
        self.name = Some(name);
        self.room = Some(room);
        self.state = SessionState::Active;
    }
}
