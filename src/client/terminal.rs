// src/client/terminal.rs

//! A line-oriented terminal client. Each stdin line is sent as a payload and
//! every payload from the partner is printed to stdout. Status goes to stderr
//! so stdout can be piped.

use super::discovery::{DEFAULT_PORT, discover_server, server_url};
use super::relay_client::RelayClient;
use crate::core::protocol::ServerMessage;
use anyhow::{Context, Result};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info};

pub const DEFAULT_PING_INTERVAL: Duration = Duration::from_secs(30);

/// How the client enters a room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    /// Send `OPEN:` and wait for someone to join with the printed code.
    Open,
    /// Send `JOIN:<code>`.
    Join(String),
}

#[derive(Debug, Clone)]
pub struct TerminalOptions {
    pub mode: Mode,
    /// `host` or `host:port`. Discovered via `/serverinfo` when absent.
    pub server: Option<String>,
    pub ping_interval: Duration,
}

/// Room state as seen from the client, driven by server messages.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RoomStatus {
    pub code: Option<String>,
    pub paired: bool,
}

/// What the terminal should do with one server message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Output {
    /// Print to stdout.
    Payload(String),
    /// Print to stderr.
    Status(String),
    Nothing,
}

/// What the terminal should do with one read from stdin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Send(String),
    /// Not paired yet; the line is discarded.
    Discard,
    /// Stdin is exhausted. Incoming payloads are still printed.
    Closed,
}

impl RoomStatus {
    pub fn apply(&mut self, message: ServerMessage) -> Output {
        match message {
            ServerMessage::Code(code) => {
                let line = format!("Your room code: {code}");
                self.code = Some(code);
                Output::Status(line)
            }
            ServerMessage::Connected => {
                self.paired = true;
                Output::Status("Joined room successfully.".to_string())
            }
            ServerMessage::Error(reason) => Output::Status(format!("Error: {reason}")),
            ServerMessage::Disconnected => {
                self.paired = false;
                Output::Status("Partner left the room.".to_string())
            }
            ServerMessage::Pong => Output::Nothing,
            ServerMessage::Payload(text) => Output::Payload(text),
        }
    }

    pub fn input(&self, line: Option<String>) -> Input {
        match line {
            Some(line) if self.paired => Input::Send(line),
            Some(_) => Input::Discard,
            None => Input::Closed,
        }
    }
}

/// Runs the terminal client until the server hangs up or Ctrl-C. Once stdin
/// closes nothing more is sent, but payloads keep printing.
pub async fn run(options: TerminalOptions) -> Result<()> {
    let url = match options.server.as_deref() {
        Some(server) => server_url(server),
        None => discover_server(None, DEFAULT_PORT)
            .await
            .context("Server not found automatically; pass --server <host[:port]>")?,
    };
    info!("Connecting to {}", url);
    let mut client = RelayClient::connect(&url)
        .await
        .with_context(|| format!("Connection to {url} failed"))?;

    match &options.mode {
        Mode::Open => client.open().await?,
        Mode::Join(code) => client.join(code).await?,
    }

    let mut status = RoomStatus::default();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;
    let mut ping = tokio::time::interval(options.ping_interval);
    ping.tick().await;
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            _ = &mut ctrl_c => {
                debug!("Ctrl-C received, leaving the room.");
                break;
            }
            message = client.next_message() => {
                let Some(message) = message? else {
                    eprintln!("Lost room connectivity.");
                    break;
                };
                match status.apply(message) {
                    Output::Payload(text) => println!("{text}"),
                    Output::Status(line) => eprintln!("{line}"),
                    Output::Nothing => {}
                }
            }
            line = lines.next_line(), if stdin_open => {
                match status.input(line.context("Failed to read stdin")?) {
                    Input::Send(line) => client.send_text(&line).await?,
                    Input::Discard => eprintln!("Not in a room yet; line not sent."),
                    Input::Closed => {
                        debug!("Stdin closed; only receiving from now on.");
                        stdin_open = false;
                    }
                }
            }
            _ = ping.tick() => client.ping().await?,
        }
    }

    client.close().await.ok();
    Ok(())
}
