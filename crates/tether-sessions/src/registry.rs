//! In-memory session table.
//!
//! Readers anywhere in the daemon query through [`SessionRegistry`]; only the
//! lifecycle manager in this crate writes to it.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tether_core::ids::SessionId;
use tether_core::session::{Session, SessionCategory};

/// Query filter. Every populated field must match.
#[derive(Clone, Debug, Default)]
pub struct SessionFilter {
    pub owner: Option<String>,
    pub category: Option<SessionCategory>,
    pub active_only: bool,
}

impl SessionFilter {
    pub fn owner(mut self, owner: impl Into<String>) -> Self {
        self.owner = Some(owner.into());
        self
    }

    pub fn category(mut self, category: SessionCategory) -> Self {
        self.category = Some(category);
        self
    }

    pub fn active_only(mut self) -> Self {
        self.active_only = true;
        self
    }

    pub fn matches(&self, session: &Session) -> bool {
        self.owner.as_deref().map_or(true, |o| session.owner == o)
            && self.category.map_or(true, |c| session.category == c)
            && (!self.active_only || session.is_active)
    }
}

#[derive(Default)]
pub struct SessionRegistry {
    sessions: DashMap<SessionId, Session>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &SessionId) -> Option<Session> {
        self.sessions.get(id).map(|s| s.clone())
    }

    pub fn contains(&self, id: &SessionId) -> bool {
        self.sessions.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Matching sessions, oldest first.
    pub fn list(&self, filter: &SessionFilter) -> Vec<Session> {
        let mut out: Vec<Session> = self
            .sessions
            .iter()
            .filter(|entry| filter.matches(entry.value()))
            .map(|entry| entry.value().clone())
            .collect();
        out.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        out
    }

    /// The active session for `(category, owner)` with the latest `last_active`.
    pub fn most_recent_active(&self, category: SessionCategory, owner: &str) -> Option<Session> {
        let filter = SessionFilter::default()
            .category(category)
            .owner(owner)
            .active_only();
        self.sessions
            .iter()
            .filter(|entry| filter.matches(entry.value()))
            .max_by(|a, b| {
                a.last_active
                    .cmp(&b.last_active)
                    .then_with(|| a.id.cmp(&b.id))
            })
            .map(|entry| entry.value().clone())
    }

    /// Ids of every session the sweep should remove at `now`.
    pub fn expired_ids(&self, now: DateTime<Utc>) -> Vec<SessionId> {
        self.sessions
            .iter()
            .filter(|entry| entry.value().is_expired(now))
            .map(|entry| entry.key().clone())
            .collect()
    }

    pub(crate) fn insert(&self, session: Session) {
        self.sessions.insert(session.id.clone(), session);
    }

    pub(crate) fn remove(&self, id: &SessionId) -> Option<Session> {
        self.sessions.remove(id).map(|(_, s)| s)
    }

    /// Remove only if the session is still expired at `now`.
    pub(crate) fn remove_if_expired(&self, id: &SessionId, now: DateTime<Utc>) -> Option<Session> {
        self.sessions
            .remove_if(id, |_, s| s.is_expired(now))
            .map(|(_, s)| s)
    }

    /// Run `f` against the stored record. `None` when the id is unknown.
    pub(crate) fn update<R>(&self, id: &SessionId, f: impl FnOnce(&mut Session) -> R) -> Option<R> {
        self.sessions.get_mut(id).map(|mut s| f(&mut s))
    }
}
