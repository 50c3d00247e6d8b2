// src/core/mod.rs

//! The central module containing the pairing and relay logic of Uniclip.

pub mod discovery;
pub mod errors;
pub mod handler;
pub mod lifecycle;
pub mod metrics;
pub mod outbound;
pub mod pairing;
pub mod protocol;
pub mod registry;
pub mod relay;
pub mod state;
pub mod tasks;

pub use errors::UniclipError;
pub use protocol::{ClientCommand, ServerMessage};
pub use registry::{ConnectionId, Registry};
