use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};

use crate::state::AppState;
use crate::ws::hub::ProgressHub;

/// HTTP handler that upgrades `/ws` to an observer connection.
///
/// After the upgrade the connection is registered with the hub and
/// managed by two tasks (send loop + inbound drain).
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state.hub))
}

/// Manage a single observer connection after upgrade.
///
/// Splits the socket into a sink (outbound) and stream (inbound), then:
///   1. Subscribes the connection to the hub.
///   2. Spawns a send loop forwarding hub messages to the sink.
///   3. Drains inbound messages (keep-alive only) on the current task.
///   4. Unsubscribes and stops the send loop on disconnect.
async fn handle_socket(socket: WebSocket, hub: Arc<ProgressHub>) {
    let conn_id = uuid::Uuid::new_v4().to_string();
    tracing::info!(conn_id = %conn_id, "Observer connected");

    // Subscribe and get the receiver for outbound frames.
    let mut rx = hub.subscribe(conn_id.clone()).await;

    let (mut sink, mut stream) = socket.split();

    // Send loop: forward hub messages to the WebSocket sink.
    let send_conn_id = conn_id.clone();
    let send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sink.send(msg).await.is_err() {
                tracing::debug!(conn_id = %send_conn_id, "Observer sink closed");
                break;
            }
        }
    });

    // Inbound loop: observers have no client-to-server payload semantics
    // beyond keep-alive, so everything except Close/errors is dropped.
    while let Some(result) = stream.next().await {
        match result {
            Ok(Message::Close(_)) => break,
            Ok(Message::Pong(_)) => {
                tracing::trace!(conn_id = %conn_id, "Pong received");
            }
            Ok(_msg) => {}
            Err(e) => {
                tracing::debug!(conn_id = %conn_id, error = %e, "Observer receive error");
                break;
            }
        }
    }

    // Clean up: unsubscribe and stop the send loop.
    hub.unsubscribe(&conn_id).await;
    send_task.abort();
    tracing::info!(conn_id = %conn_id, "Observer disconnected");
}
