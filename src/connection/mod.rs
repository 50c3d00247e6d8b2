// src/connection/mod.rs

//! Manages the lifecycle of a single client WebSocket connection: frame
//! classification, routing, outbound delivery and teardown.

mod guard;
mod handler;

pub use guard::ConnectionGuard;
pub use handler::ConnectionHandler;
