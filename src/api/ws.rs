//! WebSocket observer endpoint
//!
//! Each connection to `/ws/vehicles` registers one hub observer. A
//! forwarding loop serializes hub updates onto the socket; when the socket
//! closes (or a send fails) the observer is unsubscribed. The hub may also
//! prune the observer first - a slow socket fills its channel - in which
//! case the forwarding loop ends on the closed channel.

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::Response;
use tracing::{debug, warn};

use super::handlers::ApiState;

/// GET /ws/vehicles - upgrade and attach the socket to the broadcast hub.
pub async fn vehicles_ws(ws: WebSocketUpgrade, State(state): State<ApiState>) -> Response {
    ws.on_upgrade(move |socket| observer_loop(socket, state))
}

async fn observer_loop(mut socket: WebSocket, state: ApiState) {
    let (observer_id, mut updates) = state.hub.subscribe().await;

    loop {
        tokio::select! {
            update = updates.recv() => {
                let Some(update) = update else {
                    // Hub pruned this observer after a failed delivery.
                    debug!("Observer channel closed by hub");
                    break;
                };
                let text = match serde_json::to_string(&update) {
                    Ok(text) => text,
                    Err(e) => {
                        warn!(error = %e, "Failed to serialize broadcast update");
                        continue;
                    }
                };
                if socket.send(Message::Text(text)).await.is_err() {
                    debug!("WebSocket send failed - client gone");
                    break;
                }
            }
            inbound = socket.recv() => {
                match inbound {
                    // Clients may ping or send keepalives; ignore content.
                    Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                    Some(Ok(_)) => {}
                }
            }
        }
    }

    state.hub.unsubscribe(observer_id).await;
}
