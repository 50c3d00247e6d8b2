// tests/integration/test_helpers.rs

//! Test helpers and utilities for integration tests

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing_subscriber::EnvFilter;
use uniclip::client::RelayClient;
use uniclip::config::Config;
use uniclip::core::protocol::ServerMessage;
use uniclip::core::registry::{ConnectionId, PeerReceiver, PeerSender, outbound_queue};
use uniclip::core::state::ServerState;

/// How long a test waits for a single message before failing.
pub const RECV_TIMEOUT: Duration = Duration::from_secs(5);

/// Installs a quiet subscriber once per test binary.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new("warn"))
        .with_test_writer()
        .try_init();
}

/// A real server bound to an ephemeral loopback port.
pub struct TestServer {
    pub state: Arc<ServerState>,
    pub addr: SocketAddr,
    pub shutdown_tx: broadcast::Sender<()>,
    pub server_task: JoinHandle<std::io::Result<()>>,
}

impl TestServer {
    /// Starts a server with the default configuration.
    pub async fn start() -> Self {
        Self::with_config(Config::default()).await
    }

    /// Starts a server with a custom configuration. `host` and `port` are ignored.
    pub async fn with_config(config: Config) -> Self {
        init_tracing();
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test listener");
        let addr = listener.local_addr().expect("listener has an address");
        let state = ServerState::new(config);
        let (shutdown_tx, _) = broadcast::channel(1);
        let server_task = tokio::spawn(uniclip::server::serve(
            listener,
            state.clone(),
            shutdown_tx.clone(),
        ));
        Self {
            state,
            addr,
            shutdown_tx,
            server_task,
        }
    }

    pub fn ws_url(&self) -> String {
        format!("ws://{}/ws", self.addr)
    }

    pub fn http_url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Connects a new client and waits until the server has registered it.
    pub async fn client(&self) -> RelayClient {
        let before = self.state.registry.len();
        let client = RelayClient::connect(&self.ws_url())
            .await
            .expect("Failed to connect test client");
        self.wait_for_connections(before + 1).await;
        client
    }

    /// Opens a room on a fresh client and returns it with its code.
    pub async fn host(&self) -> (RelayClient, String) {
        let mut host = self.client().await;
        host.open().await.expect("OPEN failed");
        match recv(&mut host).await {
            ServerMessage::Code(code) => (host, code),
            other => panic!("Expected CODE, got {other:?}"),
        }
    }

    /// Returns a bound host/joiner pair with both `CONNECTED` messages consumed.
    pub async fn pair(&self) -> (RelayClient, RelayClient) {
        let (mut host, code) = self.host().await;
        let mut joiner = self.client().await;
        joiner.join(&code).await.expect("JOIN failed");
        assert_eq!(recv(&mut joiner).await, ServerMessage::Connected);
        assert_eq!(recv(&mut host).await, ServerMessage::Connected);
        (host, joiner)
    }

    /// Polls the registry until it holds exactly `expected` connections.
    pub async fn wait_for_connections(&self, expected: usize) {
        let registry = &self.state.registry;
        tokio::time::timeout(RECV_TIMEOUT, async {
            while registry.len() != expected {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .unwrap_or_else(|_| {
            panic!(
                "Registry never reached {expected} connections (has {})",
                registry.len()
            )
        });
    }

    /// Broadcasts shutdown and waits for the HTTP server to stop.
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(());
        let _ = tokio::time::timeout(RECV_TIMEOUT, self.server_task).await;
    }
}

/// Receives the next server message or panics after [`RECV_TIMEOUT`].
pub async fn recv(client: &mut RelayClient) -> ServerMessage {
    match tokio::time::timeout(RECV_TIMEOUT, client.next_message()).await {
        Ok(Ok(Some(message))) => message,
        Ok(Ok(None)) => panic!("Server closed the connection"),
        Ok(Err(e)) => panic!("Transport error: {e}"),
        Err(_) => panic!("Timed out waiting for a server message"),
    }
}

/// Asserts that nothing arrives within `wait`.
pub async fn assert_silent(client: &mut RelayClient, wait: Duration) {
    if let Ok(result) = tokio::time::timeout(wait, client.next_message()).await {
        panic!("Expected no message, got {result:?}");
    }
}

/// An in-memory stand-in for a connection: a registered id and the receiving
/// end of its outbound queue.
pub struct FakePeer {
    pub id: ConnectionId,
    pub rx: PeerReceiver,
}

impl FakePeer {
    /// Drains everything queued so far.
    pub fn drain(&mut self) -> Vec<ServerMessage> {
        let mut out = Vec::new();
        while let Ok(message) = self.rx.try_recv() {
            out.push(message);
        }
        out
    }
}

/// Creates an outbound queue of the given capacity.
pub fn queue(capacity: usize) -> (PeerSender, PeerReceiver) {
    outbound_queue(capacity)
}

/// Registers a fake peer on `state`'s registry with a fresh id.
pub fn register_peer(state: &ServerState) -> FakePeer {
    let id = state.registry.next_id();
    let (tx, rx) = queue(16);
    let addr: SocketAddr = format!("127.0.0.1:{}", 10_000 + id)
        .parse()
        .expect("valid test address");
    state
        .registry
        .register(id, addr, tx)
        .expect("fresh id registers");
    FakePeer { id, rx }
}
