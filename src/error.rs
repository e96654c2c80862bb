//! Error types for the chat server
//!
//! Defines application-level errors and per-recipient delivery errors.
//! Uses thiserror for ergonomic error definitions.

use thiserror::Error;

/// Application-level errors
///
/// Covers fatal errors (listener or session termination) and
/// business errors (reported to the client as a notice).
#[derive(Debug, Error)]
pub enum AppError {
    /// IO error (fatal)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The listener stopped accepting connections (fatal, stops accept loop)
    #[error("Listener closed")]
    ListenerClosed,

    /// Reading from the session's connection failed (IO, oversized line, invalid UTF-8)
    #[error("Read error: {0}")]
    ReadError(String),

    /// Frame could not be parsed or arrived in the wrong session state
    #[error("Malformed frame: {0}")]
    MalformedFrame(String),

    /// Display name already held by an active session
    #[error("Duplicate name: {0}")]
    DuplicateName(String),

    /// Display name is empty after trimming
    #[error("Invalid name")]
    InvalidName,

    /// Every room is at capacity
    #[error("No room capacity")]
    NoCapacity,

    /// Whisper target is not an active session
    #[error("Target not found: {0}")]
    TargetNotFound(String),

    /// The ChatServer actor is gone (internal channel broken)
    #[error("Server closed")]
    ServerClosed,

    /// Configuration rejected at startup
    #[error("Invalid config: {0}")]
    InvalidConfig(String),
}

/// Per-recipient delivery errors during fan-out
///
/// Logged and skipped; never propagated to the sender.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DeliveryError {
    /// The recipient's outbox is full (slow reader)
    #[error("Outbox full")]
    OutboxFull,

    /// The recipient's write task has ended (peer disconnected)
    #[error("Outbox closed")]
    OutboxClosed,
}
