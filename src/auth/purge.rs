// Background task dropping expired sessions on a fixed interval.

use super::SessionStore;
use std::sync::Arc;
use tokio::sync::oneshot;
use tokio::time::{Duration, interval};

pub fn spawn_session_purger(
    sessions: Arc<dyn SessionStore>,
    every: Duration,
    mut shutdown_rx: oneshot::Receiver<()>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut tick = interval(every);
        tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        // First tick completes immediately.
        tick.tick().await;
        loop {
            tokio::select! {
                _ = tick.tick() => {
                    let purged = sessions.purge_expired().await;
                    if purged > 0 {
                        tracing::debug!(operation = "purge_sessions", purged, "Expired sessions dropped");
                    }
                }
                _ = &mut shutdown_rx => break,
            }
        }
        tracing::debug!("Session purger shutting down");
    })
}
