//! Room Chat Server Library
//!
//! A line-oriented TCP chat server. Clients log in with a display name,
//! are packed into fixed-size rooms, and chat in three delivery modes:
//! global broadcast, room broadcast and direct whisper.
//!
//! # Protocol
//! - `1|<name>` logs in (must be the first frame)
//! - `2|<body>` chats; `[R]` prefix for room, `[W] <target> <text>` for
//!   whisper, untagged for global
//! - deliveries arrive as `[<sender>] <text>`
//!
//! # Architecture
//! Uses the Actor pattern with `mpsc` channels:
//! - `ChatServer` is the central actor owning sessions, rooms and names
//! - Each connection has a `handler` task reading frames and a write task
//!   draining that session's outbox
//! - No locks needed - all state access goes through message passing
//!
//! # Example
//! ```ignore
//! use room_chat::{serve, ConnectionListener, ServerConfig};
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), room_chat::AppError> {
//!     let config = ServerConfig::default();
//!     let listener = ConnectionListener::bind(&config.addr, CancellationToken::new()).await?;
//!     serve(listener, config).await
//! }
//! ```

pub mod config;
pub mod directory;
pub mod error;
pub mod handler;
pub mod listener;
pub mod message;
pub mod registry;
pub mod room;
pub mod router;
pub mod server;
pub mod session;
pub mod types;

// Re-export main types for convenience
pub use config::ServerConfig;
pub use directory::Directory;
pub use error::{AppError, DeliveryError};
pub use handler::handle_connection;
pub use listener::{serve, ConnectionListener};
pub use message::{ChatMode, ClientFrame, ServerMessage};
pub use registry::RoomRegistry;
pub use room::Room;
pub use server::{ChatServer, ServerCommand, ServerStats};
pub use session::{Session, SessionState};
pub use types::{RoomId, SessionId};
