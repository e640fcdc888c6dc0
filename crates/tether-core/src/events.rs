use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::ids::SessionId;
use crate::session::SessionCategory;

/// Session lifecycle notifications.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SessionEvent {
    #[serde(rename = "session_created")]
    Created {
        session_id: SessionId,
        category: SessionCategory,
        owner: String,
        at: DateTime<Utc>,
    },

    #[serde(rename = "session_joined")]
    Joined {
        session_id: SessionId,
        requested_by: String,
        at: DateTime<Utc>,
    },

    #[serde(rename = "session_forked")]
    Forked {
        session_id: SessionId,
        source_id: SessionId,
        at: DateTime<Utc>,
    },

    #[serde(rename = "session_stopped")]
    Stopped {
        session_id: SessionId,
        preserve_artifacts: bool,
        at: DateTime<Utc>,
    },

    #[serde(rename = "session_cleaned_up")]
    CleanedUp {
        session_id: SessionId,
        reason: CleanupReason,
        at: DateTime<Utc>,
    },
}

/// Why a session was fully cleaned up.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CleanupReason {
    Stopped,
    Idle,
    Purged,
}

impl SessionEvent {
    pub fn session_id(&self) -> &SessionId {
        match self {
            Self::Created { session_id, .. }
            | Self::Joined { session_id, .. }
            | Self::Forked { session_id, .. }
            | Self::Stopped { session_id, .. }
            | Self::CleanedUp { session_id, .. } => session_id,
        }
    }

    pub fn event_type(&self) -> &'static str {
        match self {
            Self::Created { .. } => "session_created",
            Self::Joined { .. } => "session_joined",
            Self::Forked { .. } => "session_forked",
            Self::Stopped { .. } => "session_stopped",
            Self::CleanedUp { .. } => "session_cleaned_up",
        }
    }
}

/// Fan-out publisher for [`SessionEvent`]s.
///
/// Publishing never fails; events sent while nobody subscribes are dropped.
#[derive(Clone, Debug)]
pub struct EventBus {
    tx: broadcast::Sender<SessionEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn publish(&self, event: SessionEvent) {
        if self.tx.send(event).is_err() {
            tracing::trace!("No subscribers for session event");
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.tx.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(1024)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_accessors() {
        let sid = SessionId::new();
        let evt = SessionEvent::Forked {
            session_id: sid.clone(),
            source_id: SessionId::new(),
            at: Utc::now(),
        };
        assert_eq!(evt.session_id(), &sid);
        assert_eq!(evt.event_type(), "session_forked");
    }

    #[test]
    fn event_serializes_with_type_tag() {
        let evt = SessionEvent::CleanedUp {
            session_id: SessionId::new(),
            reason: CleanupReason::Idle,
            at: Utc::now(),
        };
        let json = serde_json::to_value(&evt).unwrap();
        assert_eq!(json["type"], "session_cleaned_up");
        assert_eq!(json["reason"], "idle");
    }

    #[test]
    fn publish_without_subscribers_is_noop() {
        let bus = EventBus::new(4);
        bus.publish(SessionEvent::Stopped {
            session_id: SessionId::new(),
            preserve_artifacts: true,
            at: Utc::now(),
        });
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn subscribers_receive_published_events() {
        let bus = EventBus::new(8);
        let mut a = bus.subscribe();
        let mut b = bus.subscribe();
        let sid = SessionId::new();
        bus.publish(SessionEvent::Joined {
            session_id: sid.clone(),
            requested_by: "joel".into(),
            at: Utc::now(),
        });
        assert_eq!(a.recv().await.unwrap().session_id(), &sid);
        assert_eq!(b.recv().await.unwrap().event_type(), "session_joined");
    }
}
