//! Browser side of tdrelay: the broadcast gateway and its HTTP server.
//!
//! Browsers open a WebSocket on `/ws` (or `/`) and receive every relayed OSC
//! message as a JSON event:
//!
//! ```json
//! {"type": "td-data", "timestamp": 1734567890123.0, "data": {"address": "/pinch", "value": 0.42}}
//! ```
//!
//! Cross-origin requests are accepted from any origin so a dev server on
//! another port can connect.
//!
//! # Wire format
//!
//! Events are plain WebSocket text frames, not socket.io packets. A
//! `socket.io-client` (`io("http://host:3000")` with `socket.on("td-data")`)
//! cannot connect. Browsers use the native `WebSocket` API instead:
//!
//! ```js
//! const ws = new WebSocket("ws://localhost:3000/ws");
//! ws.onmessage = (e) => {
//!   const event = JSON.parse(e.data);
//!   if (event.type === "td-data") handle(event.data);
//! };
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use tdrelay_http::{bind, serve, AppState, Gateway};
//!
//! let gateway = Gateway::new(1024);
//! let state = AppState::new(gateway.clone());
//! let listener = bind("0.0.0.0:3000".parse()?).await?;
//! serve(listener, state).await?;
//! ```

mod gateway;
mod routes;
mod websocket;

use axum::{http::Method, routing::get, Router};
use std::net::SocketAddr;
use std::sync::Arc;
use tdrelay_core::{ListenerStats, Result};
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};

pub use gateway::{Channel, Gateway, RelayEvent};
pub use routes::status::RelayStatus;

/// Shared application state for HTTP handlers.
pub struct AppState {
    /// Gateway owning the set of connected browsers.
    pub gateway: Arc<Gateway>,
    /// Counters of the UDP listener feeding the gateway (optional).
    pub listener_stats: Option<Arc<ListenerStats>>,
}

impl AppState {
    pub fn new(gateway: Arc<Gateway>) -> Arc<Self> {
        Arc::new(Self {
            gateway,
            listener_stats: None,
        })
    }

    pub fn with_listener_stats(gateway: Arc<Gateway>, stats: Arc<ListenerStats>) -> Arc<Self> {
        Arc::new(Self {
            gateway,
            listener_stats: Some(stats),
        })
    }
}

/// Build the router with all routes.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        // WebSocket
        .route("/", get(websocket::ws_handler))
        .route("/ws", get(websocket::ws_handler))
        // Status
        .route("/status", get(routes::status::get_status))
        // Add shared state
        .with_state(state)
        // Add CORS middleware
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([Method::GET, Method::POST])
                .allow_headers(Any),
        )
}

/// Bind the TCP listener browsers connect to.
pub async fn bind(addr: SocketAddr) -> Result<TcpListener> {
    Ok(TcpListener::bind(addr).await?)
}

/// Serve the router on an already-bound listener until the task is dropped.
pub async fn serve(listener: TcpListener, state: Arc<AppState>) -> Result<()> {
    let addr = listener.local_addr()?;
    log::info!(
        "Relay server running at http://{}:{}",
        addr.ip(),
        addr.port()
    );

    axum::serve(listener, router(state)).await?;
    Ok(())
}
