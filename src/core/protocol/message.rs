// src/core/protocol/message.rs

//! Server-to-client frames.

use super::{CODE_PREFIX, CONNECTED, DISCONNECTED, ERROR_PREFIX, PONG};
use std::fmt;

/// Everything the server can put on a client's outbound queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerMessage {
    /// `CODE:<code>`, the reply to `OPEN:`.
    Code(String),
    /// Sent to both sides once a `JOIN` binds them.
    Connected,
    /// `ERROR:<reason>`, a failed pairing attempt.
    Error(String),
    Pong,
    /// The partner left the room.
    Disconnected,
    /// A payload relayed from the partner, byte for byte.
    Payload(String),
}

impl ServerMessage {
    /// Classifies a frame received from the server. Used by the bundled client.
    ///
    /// The protocol has no escaping, so a relayed payload that happens to read
    /// `PONG` or `CODE:...` is indistinguishable from the control message.
    pub fn parse(text: &str) -> Self {
        if let Some(code) = text.strip_prefix(CODE_PREFIX) {
            ServerMessage::Code(code.to_string())
        } else if let Some(reason) = text.strip_prefix(ERROR_PREFIX) {
            ServerMessage::Error(reason.to_string())
        } else if text == CONNECTED {
            ServerMessage::Connected
        } else if text == PONG {
            ServerMessage::Pong
        } else if text == DISCONNECTED {
            ServerMessage::Disconnected
        } else {
            ServerMessage::Payload(text.to_string())
        }
    }

    /// Consumes the message and returns its wire text, avoiding a copy for payloads.
    pub fn into_wire(self) -> String {
        match self {
            ServerMessage::Payload(text) => text,
            other => other.to_string(),
        }
    }

    pub fn is_payload(&self) -> bool {
        matches!(self, ServerMessage::Payload(_))
    }
}

impl fmt::Display for ServerMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServerMessage::Code(code) => write!(f, "{CODE_PREFIX}{code}"),
            ServerMessage::Connected => f.write_str(CONNECTED),
            ServerMessage::Error(reason) => write!(f, "{ERROR_PREFIX}{reason}"),
            ServerMessage::Pong => f.write_str(PONG),
            ServerMessage::Disconnected => f.write_str(DISCONNECTED),
            ServerMessage::Payload(text) => f.write_str(text),
        }
    }
}
