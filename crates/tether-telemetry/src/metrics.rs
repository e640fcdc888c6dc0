use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tether_core::events::SessionEvent;
use tokio::sync::broadcast;

/// In-memory counter. Monotonically increasing.
struct Counter {
    value: AtomicU64,
}

impl Counter {
    fn new() -> Self {
        Self {
            value: AtomicU64::new(0),
        }
    }
    fn increment(&self, n: u64) {
        self.value.fetch_add(n, Ordering::Relaxed);
    }
    fn get(&self) -> u64 {
        self.value.load(Ordering::Relaxed)
    }
}

/// Point-in-time view of the session counters.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSnapshot {
    pub counters: BTreeMap<String, u64>,
    pub live_sessions: i64,
}

/// Session event counters, fed from the event bus.
pub struct SessionMetrics {
    counters: RwLock<HashMap<String, Counter>>,
    // created + forked - cleaned_up
    live_sessions: AtomicI64,
}

impl SessionMetrics {
    pub fn new() -> Self {
        Self {
            counters: RwLock::new(HashMap::new()),
            live_sessions: AtomicI64::new(0),
        }
    }

    /// Increment a counter by n.
    pub fn counter_inc(&self, name: &str, n: u64) {
        let counters = self.counters.read();
        if let Some(c) = counters.get(name) {
            c.increment(n);
            return;
        }
        drop(counters);
        let mut counters = self.counters.write();
        let c = counters.entry(name.to_string()).or_insert_with(Counter::new);
        c.increment(n);
    }

    pub fn counter(&self, name: &str) -> u64 {
        self.counters.read().get(name).map_or(0, Counter::get)
    }

    pub fn record(&self, event: &SessionEvent) {
        self.counter_inc(event.event_type(), 1);
        match event {
            SessionEvent::Created { .. } | SessionEvent::Forked { .. } => {
                self.live_sessions.fetch_add(1, Ordering::Relaxed);
            }
            SessionEvent::CleanedUp { .. } => {
                self.live_sessions.fetch_sub(1, Ordering::Relaxed);
            }
            SessionEvent::Joined { .. } | SessionEvent::Stopped { .. } => {}
        }
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let counters = self
            .counters
            .read()
            .iter()
            .map(|(k, c)| (k.clone(), c.get()))
            .collect();
        MetricsSnapshot {
            counters,
            live_sessions: self.live_sessions.load(Ordering::Relaxed),
        }
    }
}

impl Default for SessionMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Feed every event from `rx` into `metrics` until the bus closes.
pub fn spawn_metrics_recorder(
    metrics: Arc<SessionMetrics>,
    mut rx: broadcast::Receiver<SessionEvent>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(event) => metrics.record(&event),
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(skipped = n, "Metrics recorder lagged, dropped events");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    })
}
