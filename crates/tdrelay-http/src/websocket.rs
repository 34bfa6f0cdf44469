//! WebSocket handler: one upgraded socket is one gateway channel.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
};
use futures::{SinkExt, StreamExt};
use std::sync::Arc;

use crate::AppState;

/// WebSocket upgrade handler.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Pump gateway events into the socket until either side goes away.
async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let (mut sender, mut receiver) = socket.split();

    // Registers the browser; dropping it at the end unregisters.
    let mut channel = state.gateway.connect();

    loop {
        tokio::select! {
            event = channel.recv() => {
                let Some(event) = event else { break };
                if sender.send(Message::Text(event.to_json().into())).await.is_err() {
                    break;
                }
            }
            incoming = receiver.next() => {
                match incoming {
                    // Browsers have nothing to say to the relay; ignore their frames.
                    Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                    Some(Ok(_)) => {}
                }
            }
        }
    }

    log::debug!("[Socket] Closing socket for {}", channel.id());
}
