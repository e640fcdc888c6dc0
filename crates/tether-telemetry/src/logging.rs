use tether_core::events::SessionEvent;
use tokio::sync::broadcast;

/// Emit one structured log line for a session event.
pub fn log_event(event: &SessionEvent) {
    match event {
        SessionEvent::Created {
            session_id,
            category,
            owner,
            ..
        } => {
            tracing::info!(session_id = %session_id, %category, owner, "Session created");
        }
        SessionEvent::Joined {
            session_id,
            requested_by,
            ..
        } => {
            tracing::info!(session_id = %session_id, requested_by, "Session joined");
        }
        SessionEvent::Forked {
            session_id,
            source_id,
            ..
        } => {
            tracing::info!(session_id = %session_id, source_id = %source_id, "Session forked");
        }
        SessionEvent::Stopped {
            session_id,
            preserve_artifacts,
            ..
        } => {
            tracing::info!(session_id = %session_id, preserve_artifacts, "Session stopped");
        }
        SessionEvent::CleanedUp {
            session_id, reason, ..
        } => {
            tracing::info!(session_id = %session_id, ?reason, "Session cleaned up");
        }
    }
}

/// Subscribe a logger to the event bus. Runs until the bus closes.
pub fn spawn_event_logger(mut rx: broadcast::Receiver<SessionEvent>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(event) => log_event(&event),
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(skipped = n, "Event logger lagged, dropped events");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::debug!("Event bus closed, stopping logger");
                    break;
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use tether_core::events::EventBus;
    use tether_core::ids::SessionId;

    #[tokio::test]
    async fn logger_exits_when_bus_closes() {
        let bus = EventBus::new(4);
        let handle = spawn_event_logger(bus.subscribe());
        bus.publish(SessionEvent::Stopped {
            session_id: SessionId::new(),
            preserve_artifacts: false,
            at: Utc::now(),
        });
        drop(bus);
        tokio::time::timeout(std::time::Duration::from_secs(1), handle)
            .await
            .expect("logger did not stop")
            .unwrap();
    }
}
