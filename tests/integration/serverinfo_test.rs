// tests/integration/serverinfo_test.rs

//! The plain-HTTP surface: discovery, upgrade rejection, connection limits and CORS.

use super::test_helpers::{RECV_TIMEOUT, TestServer, recv};
use reqwest::StatusCode;
use uniclip::client::discover_server;
use uniclip::config::Config;
use uniclip::core::discovery::ServerInfo;
use uniclip::core::protocol::ServerMessage;

fn announcing(ip: &str, name: &str) -> Config {
    let mut config = Config::default();
    config.discovery.announce_ip = Some(ip.to_string());
    config.discovery.machine_name = Some(name.to_string());
    config
}

#[tokio::test]
async fn test_serverinfo_reports_configured_values() {
    let server = TestServer::with_config(announcing("192.168.1.20", "desk")).await;

    let response = reqwest::get(server.http_url("/serverinfo")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["ip"], "192.168.1.20");
    assert_eq!(body["machineName"], "desk");

    server.shutdown().await;
}

#[tokio::test]
async fn test_serverinfo_defaults_to_host_name() {
    let server = TestServer::start().await;

    let info: ServerInfo = reqwest::get(server.http_url("/serverinfo"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(info.machine_name, uniclip::core::discovery::machine_name());

    server.shutdown().await;
}

#[tokio::test]
async fn test_discover_server_builds_ws_url() {
    let server = TestServer::with_config(announcing("127.0.0.1", "loopback")).await;

    let url = discover_server(Some("127.0.0.1"), server.addr.port())
        .await
        .unwrap();
    assert_eq!(url, server.ws_url());

    server.shutdown().await;
}

#[tokio::test]
async fn test_plain_get_on_ws_is_bad_request() {
    let server = TestServer::start().await;

    let response = reqwest::get(server.http_url("/ws")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    server.shutdown().await;
}

#[tokio::test]
async fn test_unknown_path_is_not_found() {
    let server = TestServer::start().await;

    let response = reqwest::get(server.http_url("/nope")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    server.shutdown().await;
}

#[tokio::test]
async fn test_cors_headers_and_preflight() {
    let server = TestServer::start().await;
    let client = reqwest::Client::new();

    let response = client
        .get(server.http_url("/serverinfo"))
        .header("Origin", "http://example.test")
        .send()
        .await
        .unwrap();
    assert_eq!(
        response.headers()["access-control-allow-origin"],
        "*"
    );

    let preflight = client
        .request(reqwest::Method::OPTIONS, server.http_url("/serverinfo"))
        .header("Origin", "http://example.test")
        .header("Access-Control-Request-Method", "GET")
        .send()
        .await
        .unwrap();
    assert_eq!(preflight.status(), StatusCode::NO_CONTENT);
    assert_eq!(preflight.headers()["access-control-allow-methods"], "*");
    assert_eq!(preflight.headers()["access-control-allow-headers"], "*");

    server.shutdown().await;
}

#[tokio::test]
async fn test_cors_can_be_disabled() {
    let mut config = Config::default();
    config.http.cors_allow_all = false;
    let server = TestServer::with_config(config).await;

    let response = reqwest::get(server.http_url("/serverinfo")).await.unwrap();
    assert!(
        response
            .headers()
            .get("access-control-allow-origin")
            .is_none()
    );

    server.shutdown().await;
}

#[tokio::test]
async fn test_max_clients_refuses_extra_upgrades() {
    let mut config = Config::default();
    config.max_clients = 1;
    let server = TestServer::with_config(config).await;

    let mut first = server.client().await;
    let refused = tokio_tungstenite::connect_async(server.ws_url()).await;
    match refused {
        Err(tokio_tungstenite::tungstenite::Error::Http(response)) => {
            assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        }
        Err(e) => panic!("Expected HTTP 503, got {e}"),
        Ok(_) => panic!("Upgrade past max_clients unexpectedly succeeded"),
    }

    // The admitted client is unaffected, and its slot frees on disconnect.
    first.ping().await.unwrap();
    assert_eq!(recv(&mut first).await, ServerMessage::Pong);
    first.close().await.unwrap();
    server.wait_for_connections(0).await;
    let permits = server.state.connection_permits.clone();
    tokio::time::timeout(RECV_TIMEOUT, async {
        while permits.available_permits() < 1 {
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("permit was never returned");

    let mut second = server.client().await;
    second.ping().await.unwrap();
    assert_eq!(recv(&mut second).await, ServerMessage::Pong);

    server.shutdown().await;
}
