// src/server/routes.rs

//! The HTTP surface: `/serverinfo` for discovery and `/ws` for the relay protocol.

use crate::connection::ConnectionHandler;
use crate::core::discovery::ServerInfo;
use crate::core::state::ServerState;
use axum::extract::ws::WebSocketUpgrade;
use axum::extract::ws::rejection::WebSocketUpgradeRejection;
use axum::extract::{ConnectInfo, Request, State};
use axum::http::{HeaderValue, Method, StatusCode, header};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Json, Response};
use axum::routing::get;
use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, warn};

/// State shared by every route.
#[derive(Clone)]
pub struct AppState {
    pub state: Arc<ServerState>,
    /// Every connection handler subscribes to this to hear about shutdown.
    pub shutdown_tx: broadcast::Sender<()>,
}

/// Builds the application router. Must be served with
/// `into_make_service_with_connect_info::<SocketAddr>()`.
pub fn app(state: Arc<ServerState>, shutdown_tx: broadcast::Sender<()>) -> Router {
    let cors_allow_all = state.config.http.cors_allow_all;
    let router = Router::new()
        .route("/serverinfo", get(server_info_handler))
        .route("/ws", get(ws_handler))
        .with_state(AppState { state, shutdown_tx });

    if cors_allow_all {
        router.layer(middleware::from_fn(allow_all_cors))
    } else {
        router
    }
}

/// `GET /serverinfo`: where clients should connect.
async fn server_info_handler(State(app): State<AppState>) -> Json<ServerInfo> {
    Json(ServerInfo::resolve(&app.state.config.discovery))
}

/// `GET /ws`: upgrades to the relay protocol and hands the socket to a
/// `ConnectionHandler` running in its own tracked task.
async fn ws_handler(
    State(app): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    upgrade: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
) -> Response {
    let upgrade = match upgrade {
        Ok(upgrade) => upgrade,
        Err(rejection) => {
            debug!("Rejected non-WebSocket request to /ws from {}: {}", addr, rejection);
            return StatusCode::BAD_REQUEST.into_response();
        }
    };

    let Ok(permit) = app.state.connection_permits.clone().try_acquire_owned() else {
        warn!(
            "Refusing connection from {}: max_clients ({}) reached.",
            addr, app.state.config.max_clients
        );
        return (StatusCode::SERVICE_UNAVAILABLE, "max number of clients reached").into_response();
    };

    let state = app.state.clone();
    let shutdown_rx = app.shutdown_tx.subscribe();
    let tracker = state.connection_tasks.clone();
    upgrade
        .max_message_size(state.config.max_message_size)
        .on_upgrade(move |socket| {
            tracker.track_future(async move {
                let handler = ConnectionHandler::new(socket, addr, state, shutdown_rx);
                if let Err(e) = handler.run().await {
                    warn!("Connection from {} terminated unexpectedly: {}", addr, e);
                }
                drop(permit);
            })
        })
}

/// Permissive CORS: any origin, method and header, with preflight answered directly.
async fn allow_all_cors(request: Request, next: Next) -> Response {
    let mut response = if request.method() == Method::OPTIONS {
        StatusCode::NO_CONTENT.into_response()
    } else {
        next.run(request).await
    };
    let headers = response.headers_mut();
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("*"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("*"),
    );
    response
}
