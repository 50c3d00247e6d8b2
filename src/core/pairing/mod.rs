// src/core/pairing/mod.rs

//! Pairing: issuing codes on `OPEN:` and redeeming them on `JOIN:`.

pub mod code;
pub mod coordinator;

pub use code::{CODE_ALPHABET, CodeGenerator, generate_code};
pub use coordinator::PairingCoordinator;
