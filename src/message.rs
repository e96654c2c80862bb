//! Message protocol definitions
//!
//! Line-oriented protocol: each inbound frame is `<type>|<payload>`, where
//! type `1` is login and type `2` is chat. Chat bodies carry an optional
//! delivery-mode tag (`[R]` room, `[W]` whisper, untagged global).
//! Outbound lines are `[<sender>] <text>`.

use crate::error::AppError;

/// Frame type of a login frame
pub const LOGIN: &str = "1";

/// Frame type of a chat frame
pub const CHAT: &str = "2";

/// Tag selecting room delivery
pub const ROOM_TAG: &str = "[R]";

/// Tag selecting whisper delivery
pub const WHISPER_TAG: &str = "[W]";

/// Sender name used for server-originated notices
pub const SERVER_NAME: &str = "server";

/// Client → Server frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientFrame {
    /// `1|<name>`, name trimmed of surrounding whitespace
    Login { name: String },
    /// `2|<body>`, body kept verbatim
    Chat { body: String },
}

impl ClientFrame {
    /// Parse one line (without its `\n` terminator)
    ///
    /// Splits on the first `|` only, so chat bodies may contain `|`.
    pub fn parse(line: &str) -> Result<Self, AppError> {
        let line = line.strip_suffix('\r').unwrap_or(line);
        let Some((kind, payload)) = line.split_once('|') else {
            return Err(AppError::MalformedFrame(format!(
                "missing '|' separator in {:?}",
                line
            )));
        };

        match kind {
            LOGIN => Ok(ClientFrame::Login {
                name: payload.trim().to_string(),
            }),
            CHAT => Ok(ClientFrame::Chat {
                body: payload.to_string(),
            }),
            other => Err(AppError::MalformedFrame(format!(
                "unknown frame type {:?}",
                other
            ))),
        }
    }
}

/// Delivery mode of a chat body, with the text to deliver
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatMode {
    /// Every active session, sender included
    Global { text: String },
    /// Every member of the sender's room, sender included
    Room { text: String },
    /// Exactly one named session
    Whisper { target: String, text: String },
}

impl ChatMode {
    /// Classify a chat body by its leading tag
    ///
    /// Whisper shape is `[W] <target> <text>`: the target is the first
    /// whitespace-delimited token, the text is everything after the
    /// separator that follows it.
    pub fn classify(body: &str) -> Self {
        if let Some(rest) = body.strip_prefix(ROOM_TAG) {
            return ChatMode::Room {
                text: rest.trim_start().to_string(),
            };
        }

        if let Some(rest) = body.strip_prefix(WHISPER_TAG) {
            let rest = rest.trim_start();
            let (target, text) = rest
                .split_once(char::is_whitespace)
                .unwrap_or((rest, ""));
            return ChatMode::Whisper {
                target: target.to_string(),
                text: text.to_string(),
            };
        }

        ChatMode::Global {
            text: body.to_string(),
        }
    }
}

/// Server → Client message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerMessage {
    /// Chat text from another session (or the sender's echo)
    Chat { from: String, text: String },
    /// Server-originated notice (login ack, rejection, whisper miss)
    Notice(String),
}

impl ServerMessage {
    /// Render as a wire line, without the trailing newline
    pub fn to_line(&self) -> String {
        match self {
            ServerMessage::Chat { from, text } => format!("[{}] {}", from, text),
            ServerMessage::Notice(text) => format!("[{}] {}", SERVER_NAME, text),
        }
    }

    /// Login acknowledgement
    pub fn welcome(name: &str, room: crate::types::RoomId) -> Self {
        ServerMessage::Notice(format!("hello {}, your room number is {}", name, room))
    }
}

/// Convert AppError to ServerMessage for client notification
impl From<&AppError> for ServerMessage {
    fn from(err: &AppError) -> Self {
        let text = match err {
            AppError::DuplicateName(name) => format!("duplicate user: '{}' is already taken", name),
            AppError::InvalidName => "name must not be empty".to_string(),
            AppError::NoCapacity => "max user limit: all rooms are full".to_string(),
            AppError::TargetNotFound(name) => format!("can't find target user '{}'", name),
            AppError::MalformedFrame(reason) => format!("malformed frame: {}", reason),
            // Fatal errors are not typically converted (connection closes)
            _ => "internal error".to_string(),
        };
        ServerMessage::Notice(text)
    }
}

impl From<AppError> for ServerMessage {
    fn from(err: AppError) -> Self {
        ServerMessage::from(&err)
    }
}
