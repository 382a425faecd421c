//! Message protocol definitions
//!
//! JSON text messages tagged by a `type` field. Negotiation payloads are
//! opaque to the relay: the original frame text is kept and sent on
//! byte for byte. Everything else is a fixed, field-less notice.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::types::RoomKey;

/// Negotiation message kinds, relayed verbatim
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalKind {
    Offer,
    Answer,
    IceCandidate,
}

/// Status message kinds, relayed as a bare `{type}`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    Talking,
    Stopped,
}

/// Client → Server message
#[derive(Debug, Clone, PartialEq)]
pub enum ClientMessage {
    /// Join (or switch to) a room
    Join { room: RoomKey },
    /// Offer / answer / ICE candidate, with the untouched frame text
    Signal { kind: SignalKind, payload: Arc<str> },
    /// Talking / stopped indicator
    Status(StatusKind),
    /// Leave the current room
    Leave,
}

/// Wire shape used to read the `type` tag (and `room` for joins).
/// Unit variants ignore any extra fields.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
enum Envelope {
    Join { room: String },
    Offer,
    Answer,
    IceCandidate,
    Talking,
    Stopped,
    Leave,
    #[serde(other)]
    Unknown,
}

impl ClientMessage {
    /// Parse one inbound text frame
    ///
    /// Returns `Ok(None)` for a well-formed record with an unrecognized
    /// `type`, and `Err` for anything that is not a JSON object with a
    /// string `type` (or a `join` without a string `room`).
    pub fn parse(text: &str) -> Result<Option<Self>, AppError> {
        let envelope: Envelope = serde_json::from_str(text)?;

        let msg = match envelope {
            Envelope::Join { room } => ClientMessage::Join { room: room.into() },
            Envelope::Offer => Self::signal(SignalKind::Offer, text),
            Envelope::Answer => Self::signal(SignalKind::Answer, text),
            Envelope::IceCandidate => Self::signal(SignalKind::IceCandidate, text),
            Envelope::Talking => ClientMessage::Status(StatusKind::Talking),
            Envelope::Stopped => ClientMessage::Status(StatusKind::Stopped),
            Envelope::Leave => ClientMessage::Leave,
            Envelope::Unknown => return Ok(None),
        };
        Ok(Some(msg))
    }

    fn signal(kind: SignalKind, text: &str) -> Self {
        ClientMessage::Signal {
            kind,
            payload: Arc::from(text),
        }
    }
}

/// Server-originated notices
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Notice {
    PeerJoined,
    PeerLeft,
    Talking,
    Stopped,
}

impl From<StatusKind> for Notice {
    fn from(kind: StatusKind) -> Self {
        match kind {
            StatusKind::Talking => Notice::Talking,
            StatusKind::Stopped => Notice::Stopped,
        }
    }
}

/// Server → Client message
///
/// `Signal` shares one frame text across every recipient of a fan-out.
#[derive(Debug, Clone, PartialEq)]
pub enum ServerMessage {
    Notice(Notice),
    Signal(Arc<str>),
}

impl ServerMessage {
    pub fn to_json(&self) -> Result<String, AppError> {
        match self {
            ServerMessage::Notice(notice) => Ok(serde_json::to_string(notice)?),
            ServerMessage::Signal(text) => Ok(text.to_string()),
        }
    }
}

impl From<Notice> for ServerMessage {
    fn from(notice: Notice) -> Self {
        ServerMessage::Notice(notice)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_join() {
        let msg = ClientMessage::parse(r#"{"type": "join", "room": "x"}"#).unwrap();
        assert_eq!(msg, Some(ClientMessage::Join { room: "x".into() }));
    }

    #[test]
    fn test_parse_join_empty_room_is_accepted() {
        let msg = ClientMessage::parse(r#"{"type": "join", "room": ""}"#).unwrap();
        assert_eq!(msg, Some(ClientMessage::Join { room: "".into() }));
    }

    #[test]
    fn test_parse_join_without_string_room_is_malformed() {
        assert!(ClientMessage::parse(r#"{"type": "join"}"#).is_err());
        assert!(ClientMessage::parse(r#"{"type": "join", "room": null}"#).is_err());
        assert!(ClientMessage::parse(r#"{"type": "join", "room": 7}"#).is_err());
    }

    #[test]
    fn test_parse_signal_keeps_whole_record() {
        let text = r#"{"type": "ice-candidate", "candidate": {"sdpMLineIndex": 0}, "extra": [1, 2]}"#;
        let Some(ClientMessage::Signal { kind, payload }) = ClientMessage::parse(text).unwrap()
        else {
            panic!("Wrong variant");
        };
        assert_eq!(kind, SignalKind::IceCandidate);
        assert_eq!(&*payload, text);
    }

    #[test]
    fn test_parse_status_ignores_extra_fields() {
        let msg = ClientMessage::parse(r#"{"type": "talking", "volume": 11}"#).unwrap();
        assert_eq!(msg, Some(ClientMessage::Status(StatusKind::Talking)));
    }

    #[test]
    fn test_parse_unknown_type_is_ignored() {
        let msg = ClientMessage::parse(r#"{"type": "dance", "style": "waltz"}"#).unwrap();
        assert_eq!(msg, None);
    }

    #[test]
    fn test_parse_malformed() {
        assert!(ClientMessage::parse("not json").is_err());
        assert!(ClientMessage::parse(r#"{"room": "x"}"#).is_err());
        assert!(ClientMessage::parse(r#"[1, 2, 3]"#).is_err());
    }

    #[test]
    fn test_notice_serialize() {
        let json = ServerMessage::from(Notice::PeerJoined).to_json().unwrap();
        assert_eq!(json, r#"{"type":"peer-joined"}"#);

        let json = ServerMessage::from(Notice::from(StatusKind::Stopped))
            .to_json()
            .unwrap();
        assert_eq!(json, r#"{"type":"stopped"}"#);
    }

    #[test]
    fn test_signal_forwarded_byte_for_byte() {
        // Key order and spacing must survive, not just the field set
        let text = r#"{"type":"offer","sdp":"abc","a":1,  "z": {"y": 2, "b": 3}}"#;
        let Some(ClientMessage::Signal { payload, .. }) = ClientMessage::parse(text).unwrap()
        else {
            panic!("Wrong variant");
        };
        let json = ServerMessage::Signal(payload).to_json().unwrap();
        assert_eq!(json, text);
    }
}
