//! ChatServer Actor implementation
//!
//! The central actor that owns all shared state: the session table, the
//! room registry and the name directory. Connection handlers talk to it
//! through `ServerCommand`s; each command runs to completion before the
//! next, so every command is a single critical section.

use std::collections::HashMap;

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::config::ServerConfig;
use crate::directory::Directory;
use crate::error::AppError;
use crate::message::{ChatMode, ServerMessage};
use crate::registry::RoomRegistry;
use crate::router;
use crate::session::{Session, SessionState};
use crate::types::{RoomId, SessionId};

/// Commands sent from handlers to the ChatServer actor
#[derive(Debug)]
pub enum ServerCommand {
    /// New connection accepted
    Connect {
        session_id: SessionId,
        outbox: mpsc::Sender<ServerMessage>,
    },
    /// Login frame received; replies with the assigned room
    Login {
        session_id: SessionId,
        name: String,
        reply: oneshot::Sender<Result<RoomId, AppError>>,
    },
    /// Chat frame received
    Chat {
        session_id: SessionId,
        body: String,
    },
    /// Connection closed; idempotent
    Disconnect {
        session_id: SessionId,
    },
    /// Snapshot of occupancy
    Stats {
        reply: oneshot::Sender<ServerStats>,
    },
}

/// Occupancy snapshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerStats {
    /// Connected sessions, logged in or not
    pub sessions: usize,
    /// Registered display names
    pub names: usize,
    /// Member count of each room, in room order
    pub room_members: Vec<usize>,
}

/// The main ChatServer actor
pub struct ChatServer {
    /// All connected sessions: SessionId -> Session
    sessions: HashMap<SessionId, Session>,
    /// Fixed pool of rooms
    registry: RoomRegistry,
    /// Display name -> SessionId
    directory: Directory,
    /// Command receiver channel
    receiver: mpsc::Receiver<ServerCommand>,
}

impl ChatServer {
    /// Create a new ChatServer with rooms sized by `config`
    pub fn new(config: &ServerConfig, receiver: mpsc::Receiver<ServerCommand>) -> Self {
        Self {
            sessions: HashMap::new(),
            registry: RoomRegistry::new(config.room_max_count, config.room_max_user),
            directory: Directory::new(),
            receiver,
        }
    }

    /// Run the ChatServer event loop
    ///
    /// Continuously receives and processes commands until all senders are dropped.
    pub async fn run(mut self) {
        info!(
            "ChatServer started with {} rooms",
            self.registry.len()
        );

        while let Some(cmd) = self.receiver.recv().await {
            self.handle_command(cmd);
        }

        info!("ChatServer shutting down");
    }

    /// Process a single command
    fn handle_command(&mut self, cmd: ServerCommand) {
        match cmd {
            ServerCommand::Connect { session_id, outbox } => {
                self.handle_connect(session_id, outbox);
            }
            ServerCommand::Login {
                session_id,
                name,
                reply,
            } => {
                let result = self.handle_login(session_id, name);
                if reply.send(result).is_err() {
                    debug!("Login reply for {} dropped, handler gone", session_id);
                }
            }
            ServerCommand::Chat { session_id, body } => {
                self.handle_chat(session_id, &body);
            }
            ServerCommand::Disconnect { session_id } => {
                self.handle_disconnect(session_id);
            }
            ServerCommand::Stats { reply } => {
                let _ = reply.send(self.stats());
            }
        }
    }

    /// Handle new connection
    fn handle_connect(&mut self, session_id: SessionId, outbox: mpsc::Sender<ServerMessage>) {
        self.sessions
            .insert(session_id, Session::new(session_id, outbox));
        debug!(
            "Total sessions: {}, active names: {}",
            self.sessions.len(),
            self.directory.len()
        );
    }

    /// Handle login: uniqueness check, room allocation and join in one step
    ///
    /// On rejection the session receives an explanatory notice and stays
    /// out of every room and the directory.
    fn handle_login(&mut self, session_id: SessionId, name: String) -> Result<RoomId, AppError> {
        let Some(session) = self.sessions.get(&session_id) else {
            return Err(AppError::ServerClosed);
        };

        let result = self.admit(session, &name);
        match result {
            Ok(room) => {
                self.directory.register(&name, session_id)?;
                self.registry.join(room, session_id);
                if let Some(session) = self.sessions.get_mut(&session_id) {
                    session.activate(name.clone(), room);
                    if let Err(e) = session.deliver(ServerMessage::welcome(&name, room)) {
                        warn!("Welcome to {} failed: {}", name, e);
                    }
                }
                info!("hello = {}, your room number is = {}", name, room);
                Ok(room)
            }
            Err(e) => {
                info!("Login as '{}' rejected for {}: {}", name, session_id, e);
                if let Some(session) = self.sessions.get(&session_id) {
                    if let Err(delivery) = session.deliver(ServerMessage::from(&e)) {
                        warn!("Rejection notice to {} failed: {}", session_id, delivery);
                    }
                }
                Err(e)
            }
        }
    }

    /// Decide whether `session` may log in as `name`, and where
    fn admit(&self, session: &Session, name: &str) -> Result<RoomId, AppError> {
        if session.state != SessionState::AwaitingLogin {
            return Err(AppError::MalformedFrame("already logged in".to_string()));
        }
        if name.is_empty() {
            return Err(AppError::InvalidName);
        }
        self.directory.check(name, session.id)?;
        self.registry.allocate()
    }

    /// Handle chat message
    fn handle_chat(&mut self, session_id: SessionId, body: &str) {
        let Some(sender) = self.sessions.get(&session_id) else {
            return;
        };

        if !sender.is_active() {
            debug!("Chat from {} before login, dropped", session_id);
            return;
        }

        let mode = ChatMode::classify(body);
        let sender_room = self.registry.room_of(session_id);
        let recipients =
            match router::resolve(&mode, sender_room, &self.registry, &self.directory) {
                Ok(recipients) => recipients,
                Err(e) => {
                    debug!("{} -> {}", sender.display_name(), e);
                    if let Err(e) = sender.deliver(e.into()) {
                        warn!("Notice to {} failed: {}", sender.display_name(), e);
                    }
                    return;
                }
            };

        let msg = ServerMessage::Chat {
            from: sender.display_name().to_string(),
            text: router::text_of(&mode).to_string(),
        };
        let delivered = router::deliver(&self.sessions, &recipients, &msg);
        debug!(
            "{:?} from {} delivered to {}/{}",
            mode,
            sender.display_name(),
            delivered,
            recipients.len()
        );
    }

    /// Handle disconnection
    ///
    /// Removes the session from its room and the directory. Unknown
    /// sessions are ignored, so repeated disconnects clean up once.
    fn handle_disconnect(&mut self, session_id: SessionId) {
        let Some(mut session) = self.sessions.remove(&session_id) else {
            debug!("Session {} already cleaned up", session_id);
            return;
        };
        session.state = SessionState::Closing;

        if let Some(room) = self.registry.room_of(session_id) {
            self.registry.leave(room, session_id);
        }
        if let Some(name) = &session.name {
            self.directory.unregister(name, session_id);
        }

        info!(
            "Session {} ({}) disconnected",
            session_id,
            session.display_name()
        );
        debug!(
            "Total sessions: {}, active names: {}",
            self.sessions.len(),
            self.directory.len()
        );
    }

    fn stats(&self) -> ServerStats {
        ServerStats {
            sessions: self.sessions.len(),
            names: self.directory.len(),
            room_members: self
                .registry
                .rooms()
                .iter()
                .map(|room| room.member_count())
                .collect(),
        }
    }
}
