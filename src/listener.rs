//! Connection listener
//!
//! Accepts inbound TCP connections and spawns one handler task per peer.
//! The accept loop stops when the shutdown token is cancelled.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::config::ServerConfig;
use crate::error::AppError;
use crate::handler::handle_connection;
use crate::server::{ChatServer, ServerCommand};

/// Channel buffer size for server commands
const CHANNEL_BUFFER_SIZE: usize = 256;

/// TCP listener that can be closed from outside
pub struct ConnectionListener {
    listener: TcpListener,
    shutdown: CancellationToken,
}

impl ConnectionListener {
    /// Bind `addr`; failure here is fatal for startup
    pub async fn bind(addr: &str, shutdown: CancellationToken) -> Result<Self, AppError> {
        let listener = TcpListener::bind(addr).await?;
        Ok(Self::new(listener, shutdown))
    }

    pub fn new(listener: TcpListener, shutdown: CancellationToken) -> Self {
        Self { listener, shutdown }
    }

    pub fn local_addr(&self) -> Result<SocketAddr, AppError> {
        Ok(self.listener.local_addr()?)
    }

    /// Wait for the next peer
    ///
    /// Fails with `ListenerClosed` once shutdown is requested; other
    /// errors concern a single connection attempt.
    pub async fn accept(&self) -> Result<(TcpStream, SocketAddr), AppError> {
        tokio::select! {
            _ = self.shutdown.cancelled() => Err(AppError::ListenerClosed),
            res = self.listener.accept() => Ok(res?),
        }
    }
}

/// Run the chat server on `listener` until it is closed
///
/// Starts the ChatServer actor, then accepts connections, spawning a
/// handler for each without waiting on sessions already in flight.
pub async fn serve(listener: ConnectionListener, config: ServerConfig) -> Result<(), AppError> {
    config.validate()?;
    let config = Arc::new(config);

    // Create ChatServer actor channel and start
    let (cmd_tx, cmd_rx) = mpsc::channel::<ServerCommand>(CHANNEL_BUFFER_SIZE);
    tokio::spawn(ChatServer::new(&config, cmd_rx).run());

    info!(
        "Chat server listening on {} ({} rooms x {} users, {} sessions max)",
        listener.local_addr()?,
        config.room_max_count,
        config.room_max_user,
        config.capacity()
    );

    // Connection accept loop
    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                info!("New connection from {}", addr);
                let cmd_tx = cmd_tx.clone();
                let config = Arc::clone(&config);

                // Spawn handler task for each connection
                tokio::spawn(async move {
                    if let Err(e) = handle_connection(stream, cmd_tx, &config).await {
                        warn!("Connection handler error: {}", e);
                    }
                });
            }
            Err(AppError::ListenerClosed) => {
                info!("Listener closed, no longer accepting connections");
                return Ok(());
            }
            Err(e) => {
                error!("Failed to accept connection: {}", e);
            }
        }
    }
}
