//! Connection struct definition
//!
//! Router-side view of one peer: its outbound queue and the room it
//! currently belongs to. The router keys connections by `ConnectionId`.

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

use crate::error::SendError;
use crate::message::ServerMessage;
use crate::types::RoomKey;

/// Connected peer session
///
/// The transport itself lives in the handler tasks; the router only holds
/// the sending half of the writer task's queue.
#[derive(Debug)]
pub struct Connection {
    /// Server → peer message queue
    pub sender: mpsc::Sender<ServerMessage>,
    /// Room joined by this connection, if any
    pub current_room: Option<RoomKey>,
}

impl Connection {
    /// Create a new connection that is not in any room yet
    pub fn new(sender: mpsc::Sender<ServerMessage>) -> Self {
        Self {
            sender,
            current_room: None,
        }
    }

    /// Queue a message for this peer without waiting
    ///
    /// A stalled peer gets `SendError::Full` instead of blocking the router.
    pub fn send(&self, msg: ServerMessage) -> Result<(), SendError> {
        self.sender.try_send(msg).map_err(|e| match e {
            TrySendError::Full(_) => SendError::Full,
            TrySendError::Closed(_) => SendError::ChannelClosed,
        })
    }

    /// Whether the writer task is still draining this queue
    pub fn is_open(&self) -> bool {
        !self.sender.is_closed()
    }
}
