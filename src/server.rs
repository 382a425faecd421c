//! RelayServer Actor implementation
//!
//! The central actor that owns the connection table and the room registry.
//! Every join, leave and fan-out decision runs inside this one task, so the
//! registry never sees two mutations interleave.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::connection::Connection;
use crate::error::SendError;
use crate::message::{Notice, ServerMessage, SignalKind, StatusKind};
use crate::registry::Registry;
use crate::types::{ConnectionId, RoomKey};

/// Commands sent from connection handlers to the RelayServer actor
#[derive(Debug)]
pub enum ServerCommand {
    /// New connection opened
    Connect {
        connection_id: ConnectionId,
        sender: mpsc::Sender<ServerMessage>,
    },
    /// Transport closed
    Disconnect { connection_id: ConnectionId },
    /// Join a room
    Join {
        connection_id: ConnectionId,
        room: RoomKey,
    },
    /// Offer / answer / ICE candidate to relay verbatim
    Signal {
        connection_id: ConnectionId,
        kind: SignalKind,
        payload: Arc<str>,
    },
    /// Talking / stopped indicator
    Status {
        connection_id: ConnectionId,
        kind: StatusKind,
    },
    /// Leave the current room
    Leave { connection_id: ConnectionId },
}

/// The main RelayServer actor
pub struct RelayServer {
    /// All open connections: ConnectionId -> Connection
    connections: HashMap<ConnectionId, Connection>,
    /// Room membership
    registry: Registry,
    /// Command receiver channel
    receiver: mpsc::Receiver<ServerCommand>,
}

impl RelayServer {
    /// Create a new RelayServer with the given command receiver
    pub fn new(receiver: mpsc::Receiver<ServerCommand>) -> Self {
        Self {
            connections: HashMap::new(),
            registry: Registry::new(),
            receiver,
        }
    }

    /// Run the RelayServer event loop
    ///
    /// Continuously receives and processes commands until all senders are dropped.
    pub async fn run(mut self) {
        info!("RelayServer started");

        while let Some(cmd) = self.receiver.recv().await {
            self.handle_command(cmd);
        }

        info!("RelayServer shutting down");
    }

    /// Process a single command
    fn handle_command(&mut self, cmd: ServerCommand) {
        match cmd {
            ServerCommand::Connect {
                connection_id,
                sender,
            } => {
                self.handle_connect(connection_id, sender);
            }
            ServerCommand::Disconnect { connection_id } => {
                self.handle_disconnect(connection_id);
            }
            ServerCommand::Join {
                connection_id,
                room,
            } => {
                self.handle_join(connection_id, room);
            }
            ServerCommand::Signal {
                connection_id,
                kind,
                payload,
            } => {
                debug!("Relaying {:?} from {}", kind, connection_id);
                self.relay(connection_id, ServerMessage::Signal(payload));
            }
            ServerCommand::Status {
                connection_id,
                kind,
            } => {
                debug!("Relaying {:?} from {}", kind, connection_id);
                self.relay(connection_id, Notice::from(kind).into());
            }
            ServerCommand::Leave { connection_id } => {
                self.handle_leave(connection_id);
            }
        }
    }

    /// Handle new connection
    fn handle_connect(&mut self, connection_id: ConnectionId, sender: mpsc::Sender<ServerMessage>) {
        let connection = Connection::new(sender);
        self.connections.insert(connection_id, connection);
        debug!(
            "Total connections: {}, Total rooms: {}",
            self.connections.len(),
            self.registry.room_count()
        );
    }

    /// Handle transport closure
    fn handle_disconnect(&mut self, connection_id: ConnectionId) {
        self.leave_current_room(connection_id);
        self.connections.remove(&connection_id);

        debug!(
            "Total connections: {}, Total rooms: {}",
            self.connections.len(),
            self.registry.room_count()
        );
    }

    /// Handle room joining
    ///
    /// A connection is in at most one room: joining while already in a room
    /// leaves the previous one first (including a re-join of the same room).
    fn handle_join(&mut self, connection_id: ConnectionId, room: RoomKey) {
        if !self.connections.contains_key(&connection_id) {
            return;
        }

        self.leave_current_room(connection_id);

        let count = self.registry.add_member(&room, connection_id);
        if let Some(connection) = self.connections.get_mut(&connection_id) {
            connection.current_room = Some(room.clone());
        }

        info!(
            "Connection {} joined room {} ({} clients)",
            connection_id, room, count
        );

        let notified = self.broadcast(&room, connection_id, Notice::PeerJoined.into());
        debug!("peer-joined sent to {} peers in room {}", notified, room);
    }

    /// Handle explicit leave
    fn handle_leave(&mut self, connection_id: ConnectionId) {
        if !self.leave_current_room(connection_id) {
            debug!("Connection {} sent leave while not in a room", connection_id);
        }
    }

    /// Forward a message to everyone else in the sender's room
    ///
    /// Nothing happens if the sender is not in a room.
    fn relay(&self, connection_id: ConnectionId, msg: ServerMessage) {
        let Some(room) = self
            .connections
            .get(&connection_id)
            .and_then(|c| c.current_room.as_ref())
        else {
            debug!("Connection {} is not in a room, dropping relay", connection_id);
            return;
        };

        let delivered = self.broadcast(room, connection_id, msg);
        debug!("Relayed to {} peers in room {}", delivered, room);
    }

    /// Helper: Leave procedure for the connection's current room
    ///
    /// Removes the membership, notifies the remaining members and clears
    /// `current_room`. The registry drops the room if it is now empty.
    /// Returns false if the connection was not in a room.
    fn leave_current_room(&mut self, connection_id: ConnectionId) -> bool {
        let Some(room) = self
            .connections
            .get_mut(&connection_id)
            .and_then(|c| c.current_room.take())
        else {
            return false;
        };

        let Some(remaining) = self.registry.remove_member(&room, connection_id) else {
            return false;
        };

        info!(
            "Connection {} left room {} ({} clients remaining)",
            connection_id, room, remaining
        );

        if remaining == 0 {
            info!("Room {} deleted (empty)", room);
        } else {
            self.broadcast(&room, connection_id, Notice::PeerLeft.into());
        }

        true
    }

    /// Best-effort broadcast to every open member of `room` except `exclude`
    ///
    /// Each recipient gets its own non-blocking send; a full or closed queue
    /// only affects that recipient. Returns how many sends were queued.
    fn broadcast(&self, room: &RoomKey, exclude: ConnectionId, msg: ServerMessage) -> usize {
        let is_open = |id: ConnectionId| self.connections.get(&id).is_some_and(Connection::is_open);

        let mut delivered = 0;
        for id in self.registry.members_except(room, exclude, is_open) {
            let Some(peer) = self.connections.get(&id) else {
                continue;
            };
            match peer.send(msg.clone()) {
                Ok(()) => delivered += 1,
                Err(SendError::Full) => {
                    warn!("Outbound queue full for {}, dropping message", id);
                }
                Err(SendError::ChannelClosed) => {
                    debug!("Connection {} closed before delivery", id);
                }
            }
        }
        delivered
    }
}
