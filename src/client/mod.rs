// src/client/mod.rs

//! A thin client for the relay protocol: server discovery, a WebSocket
//! connection wrapper, and a line-oriented terminal front end.

pub mod discovery;
pub mod relay_client;
pub mod terminal;

pub use discovery::{discover_server, server_url};
pub use relay_client::RelayClient;
