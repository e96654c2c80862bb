//! Room Chat Server - Entry Point
//!
//! Parses flags, binds the TCP listener and serves until Ctrl-C.

use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use room_chat::config::{
    DEFAULT_ADDR, MAX_FRAME_LENGTH, OUTBOX_CAPACITY, ROOM_MAX_COUNT, ROOM_MAX_USER,
};
use room_chat::{serve, ConnectionListener, ServerConfig};

#[derive(Parser, Debug)]
#[command(name = "room_chat")]
#[command(about = "TCP chat server with bounded rooms and whispers", long_about = None)]
struct Args {
    /// Address to bind the server to
    #[arg(short, long, default_value = DEFAULT_ADDR)]
    addr: String,

    /// Maximum sessions per room
    #[arg(long, default_value_t = ROOM_MAX_USER)]
    room_max_user: usize,

    /// Number of rooms
    #[arg(long, default_value_t = ROOM_MAX_COUNT)]
    room_max_count: usize,

    /// Queued outbound messages per session before deliveries are dropped
    #[arg(long, default_value_t = OUTBOX_CAPACITY)]
    outbox_capacity: usize,

    /// Longest accepted inbound line in bytes
    #[arg(long, default_value_t = MAX_FRAME_LENGTH)]
    max_frame_length: usize,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging with environment filter
    // Use RUST_LOG env var to control log level
    // e.g., RUST_LOG=debug or RUST_LOG=room_chat=trace
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("room_chat=info")),
        )
        .init();

    let args = Args::parse();
    let config = ServerConfig {
        addr: args.addr,
        room_max_user: args.room_max_user,
        room_max_count: args.room_max_count,
        outbox_capacity: args.outbox_capacity,
        max_frame_length: args.max_frame_length,
    };
    config.validate()?;

    let shutdown = CancellationToken::new();
    let listener = ConnectionListener::bind(&config.addr, shutdown.clone()).await?;

    let ctrl_c = shutdown.clone();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl-C: {}", e);
            return;
        }
        info!("Ctrl-C received, shutting down");
        ctrl_c.cancel();
    });

    serve(listener, config).await?;
    Ok(())
}
