//! Connection handler
//!
//! Handles individual client connections: line framing, the login
//! handshake, and bidirectional communication with the ChatServer.
//! Reads happen on the handler task; writes happen on a dedicated write
//! task draining the session's outbox, so a peer that stops reading never
//! stalls the server or other sessions.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::net::tcp::OwnedReadHalf;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot};
use tokio_util::codec::{FramedRead, FramedWrite, LinesCodec};
use tracing::{debug, info, warn};

use crate::config::ServerConfig;
use crate::error::AppError;
use crate::message::{ClientFrame, ServerMessage};
use crate::server::ServerCommand;
use crate::session::SessionState;
use crate::types::SessionId;

/// How long queued output may take to flush after the session ends
const DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Handle a new TCP connection
///
/// Registers a session with the ChatServer, runs the receive loop until
/// the peer disconnects or misbehaves, then cleans up exactly once.
pub async fn handle_connection(
    stream: TcpStream,
    cmd_tx: mpsc::Sender<ServerCommand>,
    config: &ServerConfig,
) -> Result<(), AppError> {
    let peer_addr = stream
        .peer_addr()
        .map(|a| a.to_string())
        .unwrap_or_else(|_| "unknown".to_string());

    let session_id = SessionId::new();
    info!("Session {} connected from {}", session_id, peer_addr);

    let (read_half, write_half) = stream.into_split();
    let mut frames = FramedRead::new(
        read_half,
        LinesCodec::new_with_max_length(config.max_frame_length),
    );
    let mut lines_out = FramedWrite::new(write_half, LinesCodec::new());

    // Channel for server -> client messages; the ChatServer holds the only sender
    let (msg_tx, mut msg_rx) = mpsc::channel::<ServerMessage>(config.outbox_capacity);

    cmd_tx
        .send(ServerCommand::Connect {
            session_id,
            outbox: msg_tx,
        })
        .await
        .map_err(|_| AppError::ServerClosed)?;

    // Spawn write task (ServerMessage -> socket)
    let mut write_task = tokio::spawn(async move {
        while let Some(msg) = msg_rx.recv().await {
            if let Err(e) = lines_out.send(msg.to_line()).await {
                debug!("Socket write failed, ending write task: {}", e);
                break;
            }
        }
        let _ = SinkExt::<String>::close(&mut lines_out).await;
    });

    let mut write_done = false;
    let result = tokio::select! {
        res = read_loop(session_id, &mut frames, &cmd_tx) => res,
        _ = &mut write_task => {
            debug!("Write task completed for {}", session_id);
            write_done = true;
            Ok(())
        }
    };

    if let Err(e) = &result {
        warn!("Session {} closing: {}", session_id, e);
    }

    // Dropping the server-side session closes the outbox, which lets the
    // write task flush what is queued and shut the socket down.
    let _ = cmd_tx
        .send(ServerCommand::Disconnect { session_id })
        .await;

    if !write_done && tokio::time::timeout(DRAIN_TIMEOUT, &mut write_task).await.is_err() {
        debug!("Write task for {} did not drain in time", session_id);
        write_task.abort();
    }

    info!("Session {} closed", session_id);

    result
}

/// Receive loop: the session state machine
///
/// The first frame must be a login; afterwards only chat frames are
/// accepted. Returns `Ok` on clean peer close or a rejected login.
async fn read_loop(
    session_id: SessionId,
    frames: &mut FramedRead<OwnedReadHalf, LinesCodec>,
    cmd_tx: &mpsc::Sender<ServerCommand>,
) -> Result<(), AppError> {
    let mut state = SessionState::Connected;
    transition(session_id, &mut state, SessionState::AwaitingLogin);

    while let Some(line) = frames.next().await {
        let line = line.map_err(|e| AppError::ReadError(e.to_string()))?;
        debug!("Frame from {}: {:?}", session_id, line);

        match (state, ClientFrame::parse(&line)?) {
            (SessionState::AwaitingLogin, ClientFrame::Login { name }) => {
                let (reply, reply_rx) = oneshot::channel();
                cmd_tx
                    .send(ServerCommand::Login {
                        session_id,
                        name,
                        reply,
                    })
                    .await
                    .map_err(|_| AppError::ServerClosed)?;

                match reply_rx.await.map_err(|_| AppError::ServerClosed)? {
                    Ok(room) => {
                        debug!("Session {} placed in room {}", session_id, room);
                        transition(session_id, &mut state, SessionState::Active);
                    }
                    Err(e) => {
                        info!("Login rejected for {}: {}", session_id, e);
                        transition(session_id, &mut state, SessionState::Closing);
                        return Ok(());
                    }
                }
            }
            (SessionState::Active, ClientFrame::Chat { body }) => {
                cmd_tx
                    .send(ServerCommand::Chat { session_id, body })
                    .await
                    .map_err(|_| AppError::ServerClosed)?;
            }
            (current, frame) => {
                transition(session_id, &mut state, SessionState::Closing);
                return Err(AppError::MalformedFrame(format!(
                    "{:?} not allowed while {:?}",
                    frame, current
                )));
            }
        }
    }

    debug!("Peer closed connection for {}", session_id);
    transition(session_id, &mut state, SessionState::Closing);
    Ok(())
}

fn transition(session_id: SessionId, state: &mut SessionState, next: SessionState) {
    debug!("Session {}: {:?} -> {:?}", session_id, state, next);
    *state = next;
}
