//! Connection handler
//!
//! Every request lands on one axum fallback handler. WebSocket upgrades
//! become relay sessions that talk to the RelayServer over its command
//! channel; anything else gets a plaintext acknowledgement.

use std::net::SocketAddr;

use axum::{
    extract::{
        ConnectInfo, State,
        ws::{Message, WebSocket, WebSocketUpgrade, rejection::WebSocketUpgradeRejection},
    },
    response::{IntoResponse, Response},
};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::error::AppError;
use crate::message::{ClientMessage, ServerMessage};
use crate::server::ServerCommand;
use crate::types::ConnectionId;

/// Per-connection outbound queue size
const OUTBOUND_BUFFER_SIZE: usize = 32;

/// Body returned to anything that is not a WebSocket upgrade
pub const PLAINTEXT_BODY: &str = "Walkie Talkie Signaling Server Running\n";

/// Handle any request on any path
///
/// Upgrade requests are handed to `handle_socket`; the rest are health
/// probes and get `PLAINTEXT_BODY`.
pub async fn relay_handler(
    State(cmd_tx): State<mpsc::Sender<ServerCommand>>,
    ConnectInfo(peer_addr): ConnectInfo<SocketAddr>,
    ws: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
) -> Response {
    match ws {
        Ok(ws) => ws.on_upgrade(move |socket| async move {
            if let Err(e) = handle_socket(socket, peer_addr, cmd_tx).await {
                error!("Connection handler error: {}", e);
            }
        }),
        Err(rejection) => {
            debug!("Plain HTTP request from {} ({})", peer_addr, rejection);
            PLAINTEXT_BODY.into_response()
        }
    }
}

/// Run one WebSocket session
///
/// Sets up bidirectional communication and manages the connection lifecycle.
/// The RelayServer is told about the closure however the session ends.
pub async fn handle_socket(
    socket: WebSocket,
    peer_addr: SocketAddr,
    cmd_tx: mpsc::Sender<ServerCommand>,
) -> Result<(), AppError> {
    let (mut ws_sender, mut ws_receiver) = socket.split();

    let connection_id = ConnectionId::new();
    info!("Client {} connected from {}", connection_id, peer_addr);

    // Channel for server -> client messages
    let (msg_tx, mut msg_rx) = mpsc::channel::<ServerMessage>(OUTBOUND_BUFFER_SIZE);

    // Register with RelayServer
    if cmd_tx
        .send(ServerCommand::Connect {
            connection_id,
            sender: msg_tx,
        })
        .await
        .is_err()
    {
        error!("Failed to register client {} - server closed", connection_id);
        return Err(AppError::ChannelSend);
    }

    let cmd_tx_read = cmd_tx.clone();

    // Read task (WebSocket -> ServerCommand)
    let mut read_task = tokio::spawn(async move {
        while let Some(msg_result) = ws_receiver.next().await {
            match msg_result {
                Ok(Message::Text(text)) => {
                    let msg = match ClientMessage::parse(text.as_str()) {
                        Ok(Some(msg)) => msg,
                        Ok(None) => {
                            debug!("Ignoring unknown message type from {}", connection_id);
                            continue;
                        }
                        Err(e) => {
                            warn!("Error handling message from {}: {}", connection_id, e);
                            continue;
                        }
                    };
                    let cmd = client_message_to_command(connection_id, msg);
                    if cmd_tx_read.send(cmd).await.is_err() {
                        debug!("Server closed, ending read task for {}", connection_id);
                        break;
                    }
                }
                Ok(Message::Close(_)) => {
                    debug!("Client {} sent close frame", connection_id);
                    break;
                }
                Ok(_) => {
                    // Binary, ping and pong frames carry nothing for the relay
                }
                Err(e) => {
                    error!("WebSocket error for {}: {}", connection_id, e);
                    break;
                }
            }
        }
        debug!("Read task ended for {}", connection_id);
    });

    // Write task (ServerMessage -> WebSocket)
    let mut write_task = tokio::spawn(async move {
        while let Some(msg) = msg_rx.recv().await {
            match msg.to_json() {
                Ok(json) => {
                    if ws_sender.send(Message::Text(json.into())).await.is_err() {
                        debug!("WebSocket send failed, ending write task");
                        break;
                    }
                }
                Err(e) => {
                    error!("Failed to serialize message: {}", e);
                }
            }
        }
        debug!("Write task ended for {}", connection_id);

        let _ = ws_sender.close().await;
    });

    // Wait for either task to complete
    tokio::select! {
        _ = &mut read_task => {
            debug!("Read task completed for {}", connection_id);
            write_task.abort();
        }
        _ = &mut write_task => {
            debug!("Write task completed for {}", connection_id);
            read_task.abort();
        }
    }

    let _ = cmd_tx.send(ServerCommand::Disconnect { connection_id }).await;

    info!("Client {} disconnected", connection_id);

    Ok(())
}

/// Convert a ClientMessage to a ServerCommand
fn client_message_to_command(connection_id: ConnectionId, msg: ClientMessage) -> ServerCommand {
    match msg {
        ClientMessage::Join { room } => ServerCommand::Join {
            connection_id,
            room,
        },
        ClientMessage::Signal { kind, payload } => ServerCommand::Signal {
            connection_id,
            kind,
            payload,
        },
        ClientMessage::Status(kind) => ServerCommand::Status {
            connection_id,
            kind,
        },
        ClientMessage::Leave => ServerCommand::Leave { connection_id },
    }
}
