// src/core/protocol/mod.rs

//! The text wire protocol spoken over each WebSocket connection.
//!
//! Every frame carries exactly one logical message. Client frames are either a
//! reserved command (`OPEN:`, `JOIN:<code>`, `PING`) or an opaque payload; server
//! frames are either a control reply or a payload relayed from the partner.

pub mod command;
pub mod message;

pub use command::ClientCommand;
pub use message::ServerMessage;

pub const OPEN_PREFIX: &str = "OPEN:";
pub const JOIN_PREFIX: &str = "JOIN:";
pub const PING: &str = "PING";

pub const CODE_PREFIX: &str = "CODE:";
pub const ERROR_PREFIX: &str = "ERROR:";
pub const CONNECTED: &str = "CONNECTED";
pub const PONG: &str = "PONG";
pub const DISCONNECTED: &str = "DISCONNECTED";
