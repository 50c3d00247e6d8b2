// src/core/state/mod.rs

//! Defines the central `ServerState` struct.

mod core;

pub use self::core::ServerState;
