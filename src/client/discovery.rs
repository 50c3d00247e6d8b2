// src/client/discovery.rs

//! Locating a server before opening the WebSocket.

use crate::core::UniclipError;
use crate::core::discovery::{ServerInfo, machine_name};
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_PORT: u16 = 5000;

const DISCOVERY_TIMEOUT: Duration = Duration::from_secs(3);

/// Builds the WebSocket URL for a user-supplied `host` or `host:port`.
pub fn server_url(server: &str) -> String {
    let server = server.trim();
    let server = server
        .strip_prefix("ws://")
        .or_else(|| server.strip_prefix("http://"))
        .unwrap_or(server)
        .trim_end_matches('/');
    if has_port(server) {
        format!("ws://{server}/ws")
    } else {
        format!("ws://{server}:{DEFAULT_PORT}/ws")
    }
}

fn has_port(server: &str) -> bool {
    if let Some(rest) = server.strip_prefix('[') {
        // Bracketed IPv6, e.g. `[::1]:5000`.
        return rest.contains("]:");
    }
    matches!(server.rsplit_once(':'), Some((host, port)) if !host.contains(':') && port.parse::<u16>().is_ok())
}

/// Asks `http://<host>:<port>/serverinfo` where the relay lives and returns its
/// WebSocket URL. With no host, the local machine's own name is tried, which
/// is how a client running next to the server finds it.
pub async fn discover_server(host: Option<&str>, port: u16) -> Result<String, UniclipError> {
    let host = host.map(str::to_owned).unwrap_or_else(machine_name);
    let url = format!("http://{host}:{port}/serverinfo");
    debug!("Discovering server via {}", url);

    let client = reqwest::Client::builder()
        .timeout(DISCOVERY_TIMEOUT)
        .build()?;
    let response = client.get(&url).send().await?;
    if !response.status().is_success() {
        return Err(UniclipError::Discovery(format!(
            "{url} answered {}",
            response.status()
        )));
    }
    let info: ServerInfo = response.json().await?;
    let ip = info
        .ip
        .ok_or_else(|| UniclipError::Discovery(format!("{} did not report an IP", info.machine_name)))?;
    Ok(server_url(&format!("{ip}:{port}")))
}
