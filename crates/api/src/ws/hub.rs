use std::collections::HashMap;

use axum::body::Bytes;
use axum::extract::ws::Message;
use shapeflow_core::job_events::ProgressFrame;
use shapeflow_core::types::Timestamp;
use tokio::sync::{mpsc, RwLock};

/// Channel sender half for pushing messages to one observer connection.
pub type ObserverSender = mpsc::UnboundedSender<Message>;

/// Metadata for a single observer connection.
pub struct Observer {
    /// Channel sender for outbound messages to this connection.
    pub sender: ObserverSender,
    /// When this connection was established.
    pub connected_at: Timestamp,
}

/// Fan-out of progress frames to all connected observers.
///
/// Frames are not scoped per job: every observer receives every job's
/// frames and filters by `jobId` client-side. Thread-safe via interior
/// `RwLock`; designed to be wrapped in `Arc` and shared between the
/// upgrade handler and in-flight run tasks.
pub struct ProgressHub {
    observers: RwLock<HashMap<String, Observer>>,
}

impl ProgressHub {
    /// Create a new, empty hub.
    pub fn new() -> Self {
        Self {
            observers: RwLock::new(HashMap::new()),
        }
    }

    /// Register an observer.
    ///
    /// Returns the receiver half of the message channel so the caller
    /// can forward messages to the WebSocket sink.
    pub async fn subscribe(&self, conn_id: String) -> mpsc::UnboundedReceiver<Message> {
        let (tx, rx) = mpsc::unbounded_channel();
        let observer = Observer {
            sender: tx,
            connected_at: chrono::Utc::now(),
        };
        self.observers.write().await.insert(conn_id, observer);
        rx
    }

    /// Remove an observer by its connection ID.
    pub async fn unsubscribe(&self, conn_id: &str) {
        self.observers.write().await.remove(conn_id);
    }

    /// Serialize a frame and deliver it to every observer, best-effort.
    ///
    /// Observers whose send channels are closed are silently skipped
    /// (their own connection task removes them on disconnect), so a
    /// broken observer never blocks or fails the publishing run.
    pub async fn publish(&self, frame: &ProgressFrame) {
        let payload = match serde_json::to_string(frame) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::error!(error = %e, "Failed to serialize progress frame");
                return;
            }
        };
        let observers = self.observers.read().await;
        for observer in observers.values() {
            let _ = observer.sender.send(Message::Text(payload.clone().into()));
        }
    }

    /// Return the current number of connected observers.
    pub async fn observer_count(&self) -> usize {
        self.observers.read().await.len()
    }

    /// Send a Ping frame to every connected observer.
    ///
    /// Used by the heartbeat task to keep connections alive and detect
    /// stale ones.
    pub async fn ping_all(&self) {
        let observers = self.observers.read().await;
        for observer in observers.values() {
            let _ = observer.sender.send(Message::Ping(Bytes::new()));
        }
    }

    /// Send a Close frame to every observer, then clear the set.
    ///
    /// Used during graceful shutdown to notify all clients before the
    /// server stops accepting new connections.
    pub async fn shutdown_all(&self) {
        let mut observers = self.observers.write().await;
        let count = observers.len();
        for observer in observers.values() {
            let _ = observer.sender.send(Message::Close(None));
        }
        observers.clear();
        tracing::info!(count, "Closed all observer connections");
    }
}

impl Default for ProgressHub {
    fn default() -> Self {
        Self::new()
    }
}
