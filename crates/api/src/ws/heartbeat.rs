use std::sync::Arc;
use std::time::Duration;

use crate::ws::hub::ProgressHub;

/// Interval between heartbeat pings (in seconds).
const HEARTBEAT_INTERVAL_SECS: u64 = 30;

/// Spawn a background task that sends periodic Ping frames to all
/// connected observers.
///
/// The task runs for the life of the process; the returned `JoinHandle`
/// is used to abort it during shutdown.
pub fn start_heartbeat(hub: Arc<ProgressHub>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(HEARTBEAT_INTERVAL_SECS));

        loop {
            interval.tick().await;
            let count = hub.observer_count().await;
            tracing::debug!(count, "Observer heartbeat ping");
            hub.ping_all().await;
        }
    })
}
