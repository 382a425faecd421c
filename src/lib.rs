//! Walkie-Talkie Signaling Relay Library
//!
//! A room-based WebSocket relay built with axum. Peers join a
//! named room and exchange WebRTC negotiation messages and talk/stop
//! indicators through it until they have a direct channel of their own.
//!
//! # Protocol
//! - `{"type":"join","room":"..."}` joins a room; others get `peer-joined`
//! - `offer`, `answer`, `ice-candidate` are relayed verbatim to the room
//! - `talking`, `stopped` are relayed as a bare `{"type":...}`
//! - `leave` (or disconnecting) sends `peer-left` to the room
//!
//! # Architecture
//! Uses the Actor pattern with `mpsc` channels:
//! - `RelayServer` is the central actor owning the room registry
//! - Each connection has a `handler` task communicating with the server
//! - No locks needed - all state access goes through message passing
//!
//! # Example
//! ```ignore
//! use tokio::net::TcpListener;
//!
//! #[tokio::main]
//! async fn main() {
//!     let listener = TcpListener::bind("127.0.0.1:8080").await.unwrap();
//!     walkie_relay::serve(listener).await.unwrap();
//! }
//! ```

pub mod config;
pub mod connection;
pub mod error;
pub mod handler;
pub mod listener;
pub mod message;
pub mod registry;
pub mod room;
pub mod server;
pub mod types;

// Re-export main types for convenience
pub use config::Config;
pub use connection::Connection;
pub use error::{AppError, SendError};
pub use handler::relay_handler;
pub use listener::{router, serve};
pub use message::{ClientMessage, Notice, ServerMessage, SignalKind, StatusKind};
pub use registry::Registry;
pub use room::Room;
pub use server::{RelayServer, ServerCommand};
pub use types::{ConnectionId, RoomKey};
