// src/core/protocol/command.rs

//! Parsing of client-to-server frames.

use super::{JOIN_PREFIX, OPEN_PREFIX, PING};
use std::fmt;

/// A single client frame, classified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientCommand {
    /// `OPEN:` (anything after the prefix is ignored).
    Open,
    /// `JOIN:<code>`, with surrounding whitespace already trimmed from the code.
    Join(String),
    /// Exactly `PING`.
    Ping,
    /// Any other non-blank text, forwarded verbatim to the partner.
    Payload(String),
    /// An empty or whitespace-only frame. Never relayed, never an error.
    Empty,
}

impl ClientCommand {
    /// Classifies an inbound text frame. Takes ownership so that payloads,
    /// which are the common case, move through without a copy.
    pub fn parse(text: String) -> Self {
        if text.starts_with(OPEN_PREFIX) {
            ClientCommand::Open
        } else if let Some(code) = text.strip_prefix(JOIN_PREFIX) {
            ClientCommand::Join(code.trim().to_string())
        } else if text == PING {
            ClientCommand::Ping
        } else if text.trim().is_empty() {
            ClientCommand::Empty
        } else {
            ClientCommand::Payload(text)
        }
    }

    /// A short name for logging. Payload contents are never logged.
    pub fn name(&self) -> &'static str {
        match self {
            ClientCommand::Open => "OPEN",
            ClientCommand::Join(_) => "JOIN",
            ClientCommand::Ping => "PING",
            ClientCommand::Payload(_) => "PAYLOAD",
            ClientCommand::Empty => "EMPTY",
        }
    }
}

/// Renders the command in its wire form.
impl fmt::Display for ClientCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClientCommand::Open => f.write_str(OPEN_PREFIX),
            ClientCommand::Join(code) => write!(f, "{JOIN_PREFIX}{code}"),
            ClientCommand::Ping => f.write_str(PING),
            ClientCommand::Payload(text) => f.write_str(text),
            ClientCommand::Empty => Ok(()),
        }
    }
}
