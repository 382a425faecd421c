//! HTTP server setup
//!
//! Starts the RelayServer actor and serves the relay router with axum.

use std::net::SocketAddr;

use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tracing::info;

use crate::error::AppError;
use crate::handler::relay_handler;
use crate::server::{RelayServer, ServerCommand};

/// Channel buffer size for server commands
const CHANNEL_BUFFER_SIZE: usize = 256;

/// Router sending every path and method to `relay_handler`
pub fn router(cmd_tx: mpsc::Sender<ServerCommand>) -> Router {
    Router::new().fallback(relay_handler).with_state(cmd_tx)
}

/// Serve relay connections on `listener` until the future is dropped
pub async fn serve(listener: TcpListener) -> Result<(), AppError> {
    let (cmd_tx, cmd_rx) = mpsc::channel(CHANNEL_BUFFER_SIZE);
    let server = RelayServer::new(cmd_rx);
    tokio::spawn(server.run());

    info!("RelayServer actor started");

    let app = router(cmd_tx);
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
