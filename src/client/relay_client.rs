// src/client/relay_client.rs

//! A WebSocket connection to a relay server, speaking the text protocol.

use crate::core::UniclipError;
use crate::core::protocol::{ClientCommand, ServerMessage};
use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::debug;

pub struct RelayClient {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl RelayClient {
    /// Opens the WebSocket at `url`, e.g. `ws://192.168.1.10:5000/ws`.
    pub async fn connect(url: &str) -> Result<Self, UniclipError> {
        let (stream, response) = connect_async(url).await?;
        debug!("Connected to {} ({})", url, response.status());
        Ok(Self { stream })
    }

    pub async fn open(&mut self) -> Result<(), UniclipError> {
        self.send_command(&ClientCommand::Open).await
    }

    pub async fn join(&mut self, code: &str) -> Result<(), UniclipError> {
        self.send_command(&ClientCommand::Join(code.trim().to_string()))
            .await
    }

    pub async fn ping(&mut self) -> Result<(), UniclipError> {
        self.send_command(&ClientCommand::Ping).await
    }

    pub async fn send_command(&mut self, command: &ClientCommand) -> Result<(), UniclipError> {
        self.send_text(&command.to_string()).await
    }

    /// Sends one raw text frame. Payloads go out exactly as given.
    pub async fn send_text(&mut self, text: &str) -> Result<(), UniclipError> {
        self.stream.send(Message::text(text.to_owned())).await?;
        Ok(())
    }

    /// Waits for the next server message. Returns `None` once the server
    /// closes the connection. Transport-level ping/pong frames are skipped.
    pub async fn next_message(&mut self) -> Result<Option<ServerMessage>, UniclipError> {
        while let Some(frame) = self.stream.next().await {
            match frame? {
                Message::Text(text) => return Ok(Some(ServerMessage::parse(text.as_str()))),
                Message::Binary(data) => {
                    let text = std::str::from_utf8(&data)?;
                    return Ok(Some(ServerMessage::parse(text)));
                }
                Message::Close(frame) => {
                    debug!("Server closed the connection: {:?}", frame);
                    return Ok(None);
                }
                Message::Ping(_) | Message::Pong(_) | Message::Frame(_) => {}
            }
        }
        Ok(None)
    }

    /// Performs the closing handshake.
    pub async fn close(mut self) -> Result<(), UniclipError> {
        self.stream.close(None).await?;
        Ok(())
    }
}
