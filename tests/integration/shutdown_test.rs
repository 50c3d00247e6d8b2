// tests/integration/shutdown_test.rs

//! Graceful shutdown: connected clients are closed and their state torn down.

use super::test_helpers::{RECV_TIMEOUT, TestServer};
use futures::StreamExt;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;

#[tokio::test]
async fn test_shutdown_closes_connected_clients() {
    let server = TestServer::start().await;
    let (mut raw, _) = connect_async(server.ws_url()).await.unwrap();
    server.wait_for_connections(1).await;

    server.shutdown_tx.send(()).unwrap();

    let frame = tokio::time::timeout(RECV_TIMEOUT, raw.next())
        .await
        .expect("no close frame before timeout");
    match frame {
        Some(Ok(Message::Close(Some(close)))) => {
            assert_eq!(close.code, CloseCode::Away);
            assert_eq!(close.reason.as_str(), "Server is shutting down");
        }
        other => panic!("Expected a close frame, got {other:?}"),
    }

    let tracker = server.state.connection_tasks.clone();
    tracker.close();
    tokio::time::timeout(RECV_TIMEOUT, tracker.wait())
        .await
        .expect("connection tasks did not finish");
    assert!(server.state.registry.is_empty());
    assert_eq!(server.state.registry.outstanding_codes(), 0);
}

#[tokio::test]
async fn test_shutdown_with_paired_clients_releases_everything() {
    let server = TestServer::start().await;
    let (_host, _joiner) = server.pair().await;
    let (_lonely_host, _code) = server.host().await;
    assert_eq!(server.state.registry.room_count(), 1);
    assert_eq!(server.state.registry.outstanding_codes(), 1);

    let state = server.state.clone();
    server.shutdown().await;

    let tracker = state.connection_tasks.clone();
    tracker.close();
    tokio::time::timeout(RECV_TIMEOUT, tracker.wait())
        .await
        .expect("connection tasks did not finish");
    assert!(state.registry.is_empty());
    assert_eq!(state.registry.room_count(), 0);
    assert_eq!(state.registry.outstanding_codes(), 0);
}
