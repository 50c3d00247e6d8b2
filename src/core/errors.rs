// src/core/errors.rs

//! Defines the primary error type for the entire application.

use std::sync::Arc;
use thiserror::Error;

/// The main error enum, representing all possible failures within the server
/// and the bundled client.
///
/// The `Display` text of the protocol variants is exactly what goes on the wire
/// after the `ERROR:` prefix, so it must not change casually.
#[derive(Error, Debug)]
pub enum UniclipError {
    #[error("IO Error: {0}")]
    Io(Arc<std::io::Error>),

    #[error("WebSocket Error: {0}")]
    WebSocket(String),

    #[error("HTTP client error: {0}")]
    HttpClientError(String),

    #[error("Malformed frame: {0}")]
    InvalidFrame(String),

    // --- Protocol errors, reported to the requesting client only ---
    #[error("Invalid or expired code")]
    InvalidOrExpiredCode,

    #[error("Already paired with another device")]
    AlreadyPaired,

    // --- Registry invariant violations, fatal for the connection involved ---
    #[error("Connection {0} is already registered")]
    DuplicateConnection(u64),

    #[error("Connection {0} is not registered")]
    UnknownConnection(u64),

    #[error("Could not bind {0} and {1}: both must be registered and unpaired")]
    BindRejected(u64, u64),

    #[error("Could not generate a free pairing code after {0} attempts")]
    CodeSpaceExhausted(usize),

    #[error("Server discovery failed: {0}")]
    Discovery(String),
}

impl UniclipError {
    /// True for errors that are answered with an `ERROR:` reply and leave the
    /// connection open. Everything else tears the connection down.
    pub fn is_protocol_error(&self) -> bool {
        matches!(
            self,
            UniclipError::InvalidOrExpiredCode | UniclipError::AlreadyPaired
        )
    }
}

// Manual implementation of Clone because `std::io::Error` is not cloneable.
impl Clone for UniclipError {
    fn clone(&self) -> Self {
        match self {
            UniclipError::Io(e) => UniclipError::Io(Arc::clone(e)),
            UniclipError::WebSocket(s) => UniclipError::WebSocket(s.clone()),
            UniclipError::HttpClientError(s) => UniclipError::HttpClientError(s.clone()),
            UniclipError::InvalidFrame(s) => UniclipError::InvalidFrame(s.clone()),
            UniclipError::InvalidOrExpiredCode => UniclipError::InvalidOrExpiredCode,
            UniclipError::AlreadyPaired => UniclipError::AlreadyPaired,
            UniclipError::DuplicateConnection(id) => UniclipError::DuplicateConnection(*id),
            UniclipError::UnknownConnection(id) => UniclipError::UnknownConnection(*id),
            UniclipError::BindRejected(a, b) => UniclipError::BindRejected(*a, *b),
            UniclipError::CodeSpaceExhausted(n) => UniclipError::CodeSpaceExhausted(*n),
            UniclipError::Discovery(s) => UniclipError::Discovery(s.clone()),
        }
    }
}

impl PartialEq for UniclipError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (UniclipError::Io(a), UniclipError::Io(b)) => a.kind() == b.kind(),
            _ => self.to_string() == other.to_string(),
        }
    }
}

impl From<std::io::Error> for UniclipError {
    fn from(e: std::io::Error) -> Self {
        UniclipError::Io(Arc::new(e))
    }
}

impl From<axum::Error> for UniclipError {
    fn from(e: axum::Error) -> Self {
        UniclipError::WebSocket(e.to_string())
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for UniclipError {
    fn from(e: tokio_tungstenite::tungstenite::Error) -> Self {
        UniclipError::WebSocket(e.to_string())
    }
}

impl From<reqwest::Error> for UniclipError {
    fn from(e: reqwest::Error) -> Self {
        UniclipError::HttpClientError(e.to_string())
    }
}

impl From<std::str::Utf8Error> for UniclipError {
    fn from(e: std::str::Utf8Error) -> Self {
        UniclipError::InvalidFrame(format!("frame is not valid UTF-8: {e}"))
    }
}
