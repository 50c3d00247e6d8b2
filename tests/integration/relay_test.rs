// tests/integration/relay_test.rs

//! Payload relay and liveness over real WebSocket connections.

use super::test_helpers::{TestServer, assert_silent, recv};
use futures::{SinkExt, StreamExt};
use std::time::Duration;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use uniclip::core::protocol::ServerMessage;

const QUIET: Duration = Duration::from_millis(200);

#[tokio::test]
async fn test_payload_is_relayed_verbatim_both_ways() {
    let server = TestServer::start().await;
    let (mut host, mut joiner) = server.pair().await;

    let multiline = "line one\nline two\r\n\ttabbed  \u{1F4CB}";
    host.send_text(multiline).await.unwrap();
    assert_eq!(
        recv(&mut joiner).await,
        ServerMessage::Payload(multiline.to_string())
    );

    joiner.send_text("reply").await.unwrap();
    assert_eq!(
        recv(&mut host).await,
        ServerMessage::Payload("reply".to_string())
    );

    // The sender never gets its own payload back.
    assert_silent(&mut host, QUIET).await;

    server.shutdown().await;
}

#[tokio::test]
async fn test_payloads_keep_their_order() {
    let server = TestServer::start().await;
    let (mut host, mut joiner) = server.pair().await;

    for i in 0..20 {
        host.send_text(&format!("clip {i}")).await.unwrap();
    }
    for i in 0..20 {
        assert_eq!(
            recv(&mut joiner).await,
            ServerMessage::Payload(format!("clip {i}"))
        );
    }

    server.shutdown().await;
}

#[tokio::test]
async fn test_unpaired_payload_is_dropped_silently() {
    let server = TestServer::start().await;
    let mut lonely = server.client().await;

    lonely.send_text("nobody hears this").await.unwrap();
    assert_silent(&mut lonely, QUIET).await;

    // Still connected and responsive.
    lonely.ping().await.unwrap();
    assert_eq!(recv(&mut lonely).await, ServerMessage::Pong);

    server.shutdown().await;
}

#[tokio::test]
async fn test_blank_payloads_are_not_relayed() {
    let server = TestServer::start().await;
    let (mut host, mut joiner) = server.pair().await;

    host.send_text("").await.unwrap();
    host.send_text("   \n\t").await.unwrap();
    host.send_text("real").await.unwrap();
    assert_eq!(
        recv(&mut joiner).await,
        ServerMessage::Payload("real".to_string())
    );

    server.shutdown().await;
}

#[tokio::test]
async fn test_ping_gets_pong_in_any_state() {
    let server = TestServer::start().await;
    let (mut host, mut joiner) = server.pair().await;

    joiner.ping().await.unwrap();
    assert_eq!(recv(&mut joiner).await, ServerMessage::Pong);
    assert_silent(&mut host, QUIET).await;

    server.shutdown().await;
}

#[tokio::test]
async fn test_binary_utf8_frame_is_treated_as_text() {
    let server = TestServer::start().await;
    let (_host, mut joiner) = server.pair().await;

    let (mut raw, _) = connect_async(server.ws_url()).await.unwrap();
    server.wait_for_connections(3).await;
    raw.send(Message::binary(b"PING".to_vec())).await.unwrap();
    let reply = tokio::time::timeout(Duration::from_secs(5), raw.next())
        .await
        .expect("no reply to binary PING")
        .expect("stream ended")
        .unwrap();
    assert_eq!(reply.into_text().unwrap().as_str(), "PONG");
    assert_silent(&mut joiner, QUIET).await;

    server.shutdown().await;
}

#[tokio::test]
async fn test_invalid_utf8_binary_frame_closes_the_connection() {
    let server = TestServer::start().await;
    let (mut host, _joiner) = server.pair().await;

    let (mut raw, _) = connect_async(server.ws_url()).await.unwrap();
    server.wait_for_connections(3).await;
    raw.send(Message::binary(vec![0xff, 0xfe, 0xfd])).await.unwrap();
    server.wait_for_connections(2).await;

    // Other rooms are unaffected.
    host.ping().await.unwrap();
    assert_eq!(recv(&mut host).await, ServerMessage::Pong);

    server.shutdown().await;
}

#[tokio::test]
async fn test_partner_is_unpaired_after_disconnect() {
    let server = TestServer::start().await;
    let (mut host, joiner) = server.pair().await;

    joiner.close().await.unwrap();
    assert_eq!(recv(&mut host).await, ServerMessage::Disconnected);

    // A payload now goes nowhere, and the host can open a new room.
    host.send_text("anyone?").await.unwrap();
    host.open().await.unwrap();
    assert!(matches!(recv(&mut host).await, ServerMessage::Code(_)));

    server.shutdown().await;
}
