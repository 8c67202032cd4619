//! Progress WebSocket. Pushes every [`ProgressEvent`] as a JSON text frame.

use std::sync::Arc;

use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};

use super::AppState;
use crate::batch::ProgressHub;

pub(super) async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
) -> impl IntoResponse {
    info!("Progress client connecting");
    ws.on_upgrade(|socket| handle_socket(socket, state.progress))
}

async fn handle_socket(mut socket: WebSocket, hub: Arc<ProgressHub>) {
    let mut rx = hub.subscribe();
    info!(subscribers = hub.subscriber_count(), "Progress client connected");

    loop {
        tokio::select! {
            result = rx.recv() => {
                match result {
                    Ok(event) => {
                        if let Ok(json) = serde_json::to_string(&event) {
                            if socket.send(Message::Text(json.into())).await.is_err() {
                                debug!("Client disconnected during send");
                                break;
                            }
                        }
                    }
                    // Counts are cumulative, so the next event catches the client up.
                    Err(RecvError::Lagged(n)) => {
                        warn!(missed = n, "Progress client lagged behind broadcast");
                    }
                    Err(RecvError::Closed) => {
                        debug!("Broadcast channel closed");
                        break;
                    }
                }
            }

            result = socket.recv() => {
                match result {
                    Some(Ok(Message::Ping(data))) => {
                        if socket.send(Message::Pong(data)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        info!("Progress client disconnected");
                        break;
                    }
                    Some(Err(e)) => {
                        warn!(error = %e, "WebSocket error");
                        break;
                    }
                    _ => {}
                }
            }
        }
    }

    debug!("Progress socket closed");
}
