use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::lifecycle::SessionLifecycleManager;

/// Run [`SessionLifecycleManager::sweep`] every `interval` until `cancel` fires.
///
/// A zero interval falls back to the manager's configured sweep interval, or
/// to [`MIN_SWEEP_INTERVAL`] if that is zero too.
pub fn spawn_sweeper(
    manager: Arc<SessionLifecycleManager>,
    interval: Duration,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    let interval = effective_interval(interval, manager.config().sweep_interval);
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        // The first tick completes immediately.
        ticker.tick().await;
        loop {
            tokio::select! {
                () = cancel.cancelled() => {
                    tracing::debug!("Session sweeper stopping");
                    break;
                }
                _ = ticker.tick() => {
                    let report = manager.sweep().await;
                    tracing::trace!(removed = report.removed.len(), "Sweep tick");
                }
            }
        }
    })
}

/// Shortest period the sweeper will tick at.
pub const MIN_SWEEP_INTERVAL: Duration = Duration::from_secs(1);

fn effective_interval(requested: Duration, configured: Duration) -> Duration {
    if !requested.is_zero() {
        return requested;
    }
    let fallback = if configured.is_zero() {
        MIN_SWEEP_INTERVAL
    } else {
        configured
    };
    tracing::warn!(fallback_secs = fallback.as_secs_f64(), "Zero sweep interval requested");
    fallback
}
