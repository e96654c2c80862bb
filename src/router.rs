//! Message routing
//!
//! Resolves the recipient set for a chat message by delivery mode, then
//! fans the formatted message out to each recipient's outbox.

use std::collections::HashMap;

use tracing::{debug, warn};

use crate::directory::Directory;
use crate::error::AppError;
use crate::message::{ChatMode, ServerMessage};
use crate::registry::RoomRegistry;
use crate::session::Session;
use crate::types::{RoomId, SessionId};

/// Recipients of a message from a sender in `sender_room`
///
/// - Global: every member of every room, sender included
/// - Room: every member of the sender's room, sender included
/// - Whisper: the named session only; `TargetNotFound` if nobody holds the name
pub fn resolve(
    mode: &ChatMode,
    sender_room: Option<RoomId>,
    registry: &RoomRegistry,
    directory: &Directory,
) -> Result<Vec<SessionId>, AppError> {
    match mode {
        ChatMode::Global { .. } => Ok(registry.all_members().collect()),
        ChatMode::Room { .. } => Ok(sender_room
            .map(|room| registry.members(room).to_vec())
            .unwrap_or_default()),
        ChatMode::Whisper { target, .. } => {
            if target.is_empty() {
                return Err(AppError::TargetNotFound(String::new()));
            }
            directory.lookup(target).map(|id| vec![id])
        }
    }
}

/// Text carried by a chat mode
pub fn text_of(mode: &ChatMode) -> &str {
    match mode {
        ChatMode::Global { text } | ChatMode::Room { text } | ChatMode::Whisper { text, .. } => {
            text
        }
    }
}

/// Queue `msg` on every recipient's outbox
///
/// Per-recipient failures are logged and skipped. Returns the number of
/// successful deliveries.
pub fn deliver(
    sessions: &HashMap<SessionId, Session>,
    recipients: &[SessionId],
    msg: &ServerMessage,
) -> usize {
    let mut delivered = 0;
    for recipient in recipients {
        let Some(session) = sessions.get(recipient) else {
            debug!("Recipient {} already gone, skipping", recipient);
            continue;
        };
        match session.deliver(msg.clone()) {
            Ok(()) => delivered += 1,
            Err(e) => warn!(
                "Delivery to {} ({}) failed: {}",
                session.display_name(),
                recipient,
                e
            ),
        }
    }
    delivered
}
