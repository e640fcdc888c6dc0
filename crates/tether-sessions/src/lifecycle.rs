//! Session lifecycle: create, fork, join, stop and sweep.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tether_core::errors::SessionError;
use tether_core::events::{CleanupReason, EventBus, SessionEvent};
use tether_core::ids::SessionId;
use tether_core::session::{
    ArtifactPaths, Session, SessionCategory, SessionContext, TrackedProcess,
    DEFAULT_CLEANUP_AFTER, SHARED_OWNER,
};
use tracing::{debug, info, instrument, warn};

use crate::artifacts;
use crate::creation_lock::CreationLock;
use crate::process;
use crate::registry::SessionRegistry;

#[derive(Clone, Debug)]
pub struct LifecycleConfig {
    /// Root under which every session's artifact tree is created.
    pub root: PathBuf,
    /// Idle window for sessions with auto-cleanup enabled.
    pub cleanup_after: Duration,
    /// Development sessions are exempt from idle sweeps unless this is set.
    pub development_auto_cleanup: bool,
    pub sweep_interval: Duration,
}

impl LifecycleConfig {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            cleanup_after: DEFAULT_CLEANUP_AFTER,
            development_auto_cleanup: false,
            sweep_interval: Duration::from_secs(5 * 60),
        }
    }

    pub fn auto_cleanup_for(&self, category: SessionCategory) -> bool {
        match category {
            SessionCategory::Development => self.development_auto_cleanup,
            other => other.default_auto_cleanup(),
        }
    }
}

/// Parameters for a new session.
#[derive(Clone, Debug)]
pub struct CreateSession {
    pub category: SessionCategory,
    pub owner: String,
    pub context: SessionContext,
}

impl CreateSession {
    pub fn new(category: SessionCategory, owner: impl Into<String>) -> Self {
        Self {
            category,
            owner: owner.into(),
            context: SessionContext::default(),
        }
    }

    pub fn with_context(mut self, context: SessionContext) -> Self {
        self.context = context;
        self
    }
}

/// Result of [`SessionLifecycleManager::find_or_create_shared_session`].
#[derive(Clone, Debug)]
pub struct SharedSession {
    pub session: Session,
    /// False when an existing session was joined.
    pub created: bool,
}

#[derive(Clone, Debug, Default)]
pub struct SweepReport {
    pub removed: Vec<SessionId>,
}

fn creation_key(category: SessionCategory, owner: &str) -> String {
    format!("{category}-{owner}")
}

fn validate_owner(owner: &str) -> Result<(), SessionError> {
    if owner.trim().is_empty() {
        return Err(SessionError::invalid("owner must not be empty"));
    }
    Ok(())
}

/// Everything a detached creation task needs.
#[derive(Clone)]
struct Provisioner {
    registry: Arc<SessionRegistry>,
    bus: EventBus,
    config: Arc<LifecycleConfig>,
}

impl Provisioner {
    /// Touch and return the most recently active shared session for `category`.
    fn join_shared(&self, category: SessionCategory, now: DateTime<Utc>) -> Option<Session> {
        let candidate = self.registry.most_recent_active(category, SHARED_OWNER)?;
        self.registry
            .update(&candidate.id, |s| {
                // Stopped between lookup and touch.
                if !s.is_active {
                    return None;
                }
                s.touch(now);
                Some(s.clone())
            })
            .flatten()
    }

    /// Build the artifact tree, then publish the record. Readers never see a
    /// registry entry whose directories are missing.
    async fn materialize(self, request: CreateSession) -> Result<Session, SessionError> {
        let id = SessionId::new();
        let now = Utc::now();
        let base = artifacts::base_path(&self.config.root, request.category, &request.owner, &id);
        let session = Session {
            id,
            category: request.category,
            owner: request.owner,
            created_at: now,
            last_active: now,
            is_active: true,
            paths: ArtifactPaths::under(base),
            processes: Vec::new(),
            auto_cleanup: self.config.auto_cleanup_for(request.category),
            cleanup_after: self.config.cleanup_after,
            context: request.context,
        };

        artifacts::provision(&session).await?;
        self.registry.insert(session.clone());

        let event = match &session.context.forked_from {
            Some(source_id) => SessionEvent::Forked {
                session_id: session.id.clone(),
                source_id: source_id.clone(),
                at: now,
            },
            None => SessionEvent::Created {
                session_id: session.id.clone(),
                category: session.category,
                owner: session.owner.clone(),
                at: now,
            },
        };
        self.bus.publish(event);
        Ok(session)
    }
}

/// Sole writer of the [`SessionRegistry`].
pub struct SessionLifecycleManager {
    registry: Arc<SessionRegistry>,
    bus: EventBus,
    config: Arc<LifecycleConfig>,
    creations: CreationLock<SharedSession>,
}

impl SessionLifecycleManager {
    pub fn new(registry: Arc<SessionRegistry>, bus: EventBus, config: LifecycleConfig) -> Self {
        Self {
            registry,
            bus,
            config: Arc::new(config),
            creations: CreationLock::new(),
        }
    }

    pub fn registry(&self) -> &Arc<SessionRegistry> {
        &self.registry
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    pub fn config(&self) -> &LifecycleConfig {
        &self.config
    }

    /// Creations currently pending on the keyed lock.
    pub fn creations_in_flight(&self) -> usize {
        self.creations.in_flight()
    }

    fn provisioner(&self) -> Provisioner {
        Provisioner {
            registry: Arc::clone(&self.registry),
            bus: self.bus.clone(),
            config: Arc::clone(&self.config),
        }
    }

    /// Create a session for `(category, owner)`. Callers racing on the same
    /// pair all receive the one session that gets created.
    #[instrument(skip_all, fields(category = %request.category, owner = %request.owner))]
    pub async fn create_session(&self, request: CreateSession) -> Result<Session, SessionError> {
        validate_owner(&request.owner)?;
        let key = creation_key(request.category, &request.owner);
        let provisioner = self.provisioner();
        let outcome = self
            .creations
            .run(&key, move || async move {
                let session = provisioner.materialize(request).await?;
                Ok::<_, SessionError>(SharedSession {
                    session,
                    created: true,
                })
            })
            .await?;
        Ok(outcome.session)
    }

    /// Create a new session whose context references `source_id`. No
    /// artifact content is copied.
    #[instrument(skip_all, fields(source_id = %source_id, category = %request.category))]
    pub async fn fork_session(
        &self,
        source_id: &SessionId,
        mut request: CreateSession,
    ) -> Result<Session, SessionError> {
        validate_owner(&request.owner)?;
        if !self.registry.contains(source_id) {
            return Err(SessionError::not_found(source_id));
        }
        request.context.forked_from = Some(source_id.clone());

        let key = format!(
            "{}-fork-{source_id}",
            creation_key(request.category, &request.owner)
        );
        let provisioner = self.provisioner();
        let outcome = self
            .creations
            .run(&key, move || async move {
                let session = provisioner.materialize(request).await?;
                Ok::<_, SessionError>(SharedSession {
                    session,
                    created: true,
                })
            })
            .await?;
        Ok(outcome.session)
    }

    /// Join the most recently active shared session for `category`, or
    /// create one if none exists.
    #[instrument(skip_all, fields(category = %category))]
    pub async fn find_or_create_shared_session(
        &self,
        category: SessionCategory,
        context: SessionContext,
    ) -> Result<SharedSession, SessionError> {
        let provisioner = self.provisioner();
        if let Some(session) = provisioner.join_shared(category, Utc::now()) {
            return Ok(SharedSession {
                session,
                created: false,
            });
        }

        let key = creation_key(category, SHARED_OWNER);
        self.creations
            .run(&key, move || async move {
                // A creation for this key may have finished since the first lookup.
                if let Some(session) = provisioner.join_shared(category, Utc::now()) {
                    return Ok(SharedSession {
                        session,
                        created: false,
                    });
                }
                let request =
                    CreateSession::new(category, SHARED_OWNER).with_context(context);
                let session = provisioner.materialize(request).await?;
                Ok::<_, SessionError>(SharedSession {
                    session,
                    created: true,
                })
            })
            .await
    }

    pub fn get_session(&self, id: &SessionId) -> Result<Session, SessionError> {
        self.registry
            .get(id)
            .ok_or_else(|| SessionError::not_found(id))
    }

    /// Advance `last_active` to now. Stopped sessions are left untouched.
    pub fn touch_session(&self, id: &SessionId) -> Result<Session, SessionError> {
        self.touch_session_at(id, Utc::now())
    }

    pub fn touch_session_at(
        &self,
        id: &SessionId,
        now: DateTime<Utc>,
    ) -> Result<Session, SessionError> {
        self.registry
            .update(id, |s| {
                if !s.is_active {
                    return Err(SessionError::Inactive(s.id.to_string()));
                }
                s.touch(now);
                Ok(s.clone())
            })
            .unwrap_or_else(|| Err(SessionError::not_found(id)))
    }

    /// Bind an OS process to an active session so stop and cleanup terminate it.
    pub fn track_process(
        &self,
        id: &SessionId,
        pid: u32,
        label: impl Into<String>,
    ) -> Result<(), SessionError> {
        let label = label.into();
        self.registry
            .update(id, |s| {
                if !s.is_active {
                    return Err(SessionError::Inactive(s.id.to_string()));
                }
                s.processes.push(TrackedProcess { pid, label });
                Ok(())
            })
            .unwrap_or_else(|| Err(SessionError::not_found(id)))
    }

    /// Mark a session inactive and terminate its processes. Without
    /// `preserve_artifacts` the tree and registry entry go immediately;
    /// otherwise the next sweep removes them.
    #[instrument(skip(self), fields(session_id = %id))]
    pub async fn stop_session(
        &self,
        id: &SessionId,
        preserve_artifacts: bool,
    ) -> Result<Session, SessionError> {
        let (session, was_active, processes) = self
            .registry
            .update(id, |s| {
                let was_active = s.is_active;
                let processes = if was_active {
                    s.is_active = false;
                    std::mem::take(&mut s.processes)
                } else {
                    Vec::new()
                };
                (s.clone(), was_active, processes)
            })
            .ok_or_else(|| SessionError::not_found(id))?;

        if was_active {
            process::terminate_all(id.as_str(), &processes);
            info!(preserve_artifacts, "Session stopped");
            self.bus.publish(SessionEvent::Stopped {
                session_id: id.clone(),
                preserve_artifacts,
                at: Utc::now(),
            });
        }

        if !preserve_artifacts {
            self.cleanup(id, CleanupReason::Stopped).await;
        }
        Ok(session)
    }

    /// Full cleanup of one session on demand.
    #[instrument(skip(self), fields(session_id = %id))]
    pub async fn purge_session(&self, id: &SessionId) -> Result<(), SessionError> {
        match self.cleanup(id, CleanupReason::Purged).await {
            Some(_) => Ok(()),
            None => Err(SessionError::not_found(id)),
        }
    }

    pub async fn sweep(&self) -> SweepReport {
        self.sweep_at(Utc::now()).await
    }

    /// Remove every inactive session and every auto-cleanup session idle
    /// longer than its window, as judged at `now`.
    pub async fn sweep_at(&self, now: DateTime<Utc>) -> SweepReport {
        let mut report = SweepReport::default();
        for id in self.registry.expired_ids(now) {
            // Re-checked under the entry lock; a concurrent touch wins.
            let Some(session) = self.registry.remove_if_expired(&id, now) else {
                continue;
            };
            let reason = if session.is_active {
                CleanupReason::Idle
            } else {
                CleanupReason::Stopped
            };
            self.finish_cleanup(session, reason).await;
            report.removed.push(id);
        }
        if !report.removed.is_empty() {
            info!(removed = report.removed.len(), "Session sweep");
        }
        report
    }

    async fn cleanup(&self, id: &SessionId, reason: CleanupReason) -> Option<Session> {
        let session = self.registry.remove(id)?;
        self.finish_cleanup(session.clone(), reason).await;
        Some(session)
    }

    /// Teardown after the registry entry is gone.
    async fn finish_cleanup(&self, session: Session, reason: CleanupReason) {
        process::terminate_all(session.id.as_str(), &session.processes);
        if let Err(e) = artifacts::remove_tree(&session.paths.base).await {
            warn!(session_id = %session.id, error = %e, "Failed to delete artifact tree");
        }
        debug!(session_id = %session.id, ?reason, "Session cleaned up");
        self.bus.publish(SessionEvent::CleanedUp {
            session_id: session.id,
            reason,
            at: Utc::now(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::SessionFilter;
    use std::path::Path;

    fn manager(root: &Path) -> SessionLifecycleManager {
        SessionLifecycleManager::new(
            Arc::new(SessionRegistry::new()),
            EventBus::new(64),
            LifecycleConfig::new(root),
        )
    }

    fn count_dirs(path: &Path) -> usize {
        std::fs::read_dir(path).map(|rd| rd.count()).unwrap_or(0)
    }

    #[tokio::test]
    async fn create_provisions_then_registers() {
        let dir = tempfile::tempdir().unwrap();
        let mgr = manager(dir.path());
        let mut events = mgr.bus().subscribe();

        let s = mgr
            .create_session(CreateSession::new(SessionCategory::Test, "joel"))
            .await
            .unwrap();

        assert!(s.paths.base.starts_with(dir.path().join("test").join("joel")));
        assert!(s.paths.base.join(artifacts::DESCRIPTOR_FILE).is_file());
        assert!(s.auto_cleanup);
        assert_eq!(mgr.registry().get(&s.id).unwrap().id, s.id);

        let evt = events.recv().await.unwrap();
        assert_eq!(evt.event_type(), "session_created");
        assert_eq!(evt.session_id(), &s.id);
    }

    #[tokio::test]
    async fn empty_owner_is_rejected_before_any_io() {
        let dir = tempfile::tempdir().unwrap();
        let mgr = manager(dir.path());
        let err = mgr
            .create_session(CreateSession::new(SessionCategory::Test, "  "))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "invalid_request");
        assert_eq!(count_dirs(dir.path()), 0);
    }

    #[tokio::test]
    async fn development_sessions_skip_auto_cleanup() {
        let dir = tempfile::tempdir().unwrap();
        let mgr = manager(dir.path());
        let s = mgr
            .create_session(CreateSession::new(SessionCategory::Development, "joel"))
            .await
            .unwrap();
        assert!(!s.auto_cleanup);
        assert_eq!(s.cleanup_after, DEFAULT_CLEANUP_AFTER);
    }

    #[tokio::test]
    async fn racing_creates_yield_one_session() {
        let dir = tempfile::tempdir().unwrap();
        let mgr = manager(dir.path());

        // join_all polls every call once before the spawned creation can run,
        // so all sixteen are pending on the same key.
        let results = futures::future::join_all((0..16).map(|_| {
            mgr.create_session(CreateSession::new(SessionCategory::Portal, SHARED_OWNER))
        }))
        .await;

        let ids: Vec<_> = results.into_iter().map(|r| r.unwrap().id).collect();
        assert!(ids.windows(2).all(|w| w[0] == w[1]));
        assert_eq!(mgr.registry().len(), 1);
        assert_eq!(count_dirs(&dir.path().join("portal").join(SHARED_OWNER)), 1);
        assert_eq!(mgr.creations_in_flight(), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn racing_default_routes_share_one_session() {
        let dir = tempfile::tempdir().unwrap();
        let mgr = Arc::new(manager(dir.path()));

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let mgr = Arc::clone(&mgr);
                tokio::spawn(async move {
                    mgr.find_or_create_shared_session(
                        SessionCategory::Validation,
                        SessionContext::default(),
                    )
                    .await
                })
            })
            .collect();

        let mut ids = Vec::new();
        for h in handles {
            ids.push(h.await.unwrap().unwrap().session.id);
        }
        assert!(ids.windows(2).all(|w| w[0] == w[1]));
        assert_eq!(mgr.registry().len(), 1);
        assert_eq!(
            count_dirs(&dir.path().join("validation").join(SHARED_OWNER)),
            1
        );
    }

    #[tokio::test]
    async fn failed_creation_releases_lock_and_leaves_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("root");
        std::fs::write(&root, b"not a directory").unwrap();
        let mgr = manager(&root);

        let err = mgr
            .create_session(CreateSession::new(SessionCategory::Test, "joel"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "io");
        assert!(mgr.registry().is_empty());
        assert_eq!(mgr.creations_in_flight(), 0);

        std::fs::remove_file(&root).unwrap();
        let s = mgr
            .create_session(CreateSession::new(SessionCategory::Test, "joel"))
            .await
            .unwrap();
        assert!(s.paths.base.is_dir());
    }

    #[tokio::test]
    async fn fork_gets_independent_tree_and_source_reference() {
        let dir = tempfile::tempdir().unwrap();
        let mgr = manager(dir.path());
        let mut events = mgr.bus().subscribe();

        let a = mgr
            .create_session(CreateSession::new(SessionCategory::Persona, "joel"))
            .await
            .unwrap();
        let b = mgr
            .fork_session(&a.id, CreateSession::new(SessionCategory::Persona, "joel"))
            .await
            .unwrap();

        assert_ne!(a.id, b.id);
        assert_eq!(b.context.forked_from.as_ref(), Some(&a.id));
        assert_ne!(a.paths.base, b.paths.base);
        assert!(a.paths.base.is_dir() && b.paths.base.is_dir());

        let descriptor = artifacts::SessionDescriptor::load(&b.paths.base).await.unwrap();
        assert_eq!(descriptor.forked_from, Some(a.id.clone()));

        assert_eq!(events.recv().await.unwrap().event_type(), "session_created");
        assert_eq!(events.recv().await.unwrap().event_type(), "session_forked");
    }

    #[tokio::test]
    async fn fork_of_unknown_source_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let mgr = manager(dir.path());
        let err = mgr
            .fork_session(
                &SessionId::new(),
                CreateSession::new(SessionCategory::Persona, "joel"),
            )
            .await
            .unwrap_err();
        assert!(err.to_string().contains("not found"));
        assert!(mgr.registry().is_empty());
    }

    #[tokio::test]
    async fn shared_session_is_joined_on_second_call() {
        let dir = tempfile::tempdir().unwrap();
        let mgr = manager(dir.path());
        let first = mgr
            .find_or_create_shared_session(SessionCategory::Portal, SessionContext::default())
            .await
            .unwrap();
        let second = mgr
            .find_or_create_shared_session(SessionCategory::Portal, SessionContext::default())
            .await
            .unwrap();
        assert!(first.created);
        assert!(!second.created);
        assert_eq!(first.session.id, second.session.id);
        assert!(second.session.last_active >= first.session.last_active);
    }

    #[tokio::test]
    async fn joining_shared_session_touches_it() {
        let dir = tempfile::tempdir().unwrap();
        let mgr = manager(dir.path());
        let first = mgr
            .find_or_create_shared_session(SessionCategory::Test, SessionContext::default())
            .await
            .unwrap();
        let id = first.session.id.clone();
        let stale = first.session.last_active - chrono::Duration::hours(1);
        mgr.registry().update(&id, |s| s.last_active = stale);

        // The path taken when a racing creation has just finished.
        let now = Utc::now();
        let joined = mgr.provisioner().join_shared(SessionCategory::Test, now).unwrap();
        assert_eq!(joined.id, id);
        assert_eq!(joined.last_active, now);
        assert_eq!(mgr.get_session(&id).unwrap().last_active, now);

        mgr.stop_session(&id, true).await.unwrap();
        let later = now + chrono::Duration::minutes(1);
        assert!(mgr.provisioner().join_shared(SessionCategory::Test, later).is_none());
        assert_eq!(mgr.get_session(&id).unwrap().last_active, now);
    }

    #[tokio::test]
    async fn stopped_shared_session_is_not_rejoined() {
        let dir = tempfile::tempdir().unwrap();
        let mgr = manager(dir.path());
        let first = mgr
            .find_or_create_shared_session(SessionCategory::Portal, SessionContext::default())
            .await
            .unwrap();
        mgr.stop_session(&first.session.id, true).await.unwrap();

        let next = mgr
            .find_or_create_shared_session(SessionCategory::Portal, SessionContext::default())
            .await
            .unwrap();
        assert!(next.created);
        assert_ne!(next.session.id, first.session.id);
    }

    #[tokio::test]
    async fn touch_is_monotonic_and_refuses_inactive() {
        let dir = tempfile::tempdir().unwrap();
        let mgr = manager(dir.path());
        let s = mgr
            .create_session(CreateSession::new(SessionCategory::Test, "joel"))
            .await
            .unwrap();

        let earlier = s.last_active - chrono::Duration::minutes(5);
        let touched = mgr.touch_session_at(&s.id, earlier).unwrap();
        assert_eq!(touched.last_active, s.last_active);

        mgr.stop_session(&s.id, true).await.unwrap();
        let err = mgr.touch_session(&s.id).unwrap_err();
        assert_eq!(err.kind(), "inactive");
        assert_eq!(mgr.touch_session(&SessionId::new()).unwrap_err().kind(), "not_found");
    }

    #[tokio::test]
    async fn stop_without_preserve_removes_immediately() {
        let dir = tempfile::tempdir().unwrap();
        let mgr = manager(dir.path());
        let s = mgr
            .create_session(CreateSession::new(SessionCategory::Test, "joel"))
            .await
            .unwrap();

        let stopped = mgr.stop_session(&s.id, false).await.unwrap();
        assert!(!stopped.is_active);
        assert!(!mgr.registry().contains(&s.id));
        assert!(!s.paths.base.exists());
    }

    #[tokio::test]
    async fn sweep_removes_stopped_and_keeps_fresh() {
        let dir = tempfile::tempdir().unwrap();
        let mgr = manager(dir.path());
        let stopped = mgr
            .create_session(CreateSession::new(SessionCategory::Test, "a"))
            .await
            .unwrap();
        let fresh = mgr
            .create_session(CreateSession::new(SessionCategory::Test, "b"))
            .await
            .unwrap();

        mgr.stop_session(&stopped.id, true).await.unwrap();
        assert!(stopped.paths.base.exists());

        let report = mgr.sweep().await;
        assert_eq!(report.removed, vec![stopped.id.clone()]);
        assert!(!mgr.registry().contains(&stopped.id));
        assert!(!stopped.paths.base.exists());
        assert!(mgr.registry().contains(&fresh.id));
        assert!(fresh.paths.base.exists());
    }

    #[tokio::test]
    async fn sweep_expires_idle_auto_cleanup_sessions_only() {
        let dir = tempfile::tempdir().unwrap();
        let mgr = manager(dir.path());
        let mut events = mgr.bus().subscribe();
        let test = mgr
            .create_session(CreateSession::new(SessionCategory::Test, "joel"))
            .await
            .unwrap();
        let dev = mgr
            .create_session(CreateSession::new(SessionCategory::Development, "joel"))
            .await
            .unwrap();

        let within = Utc::now() + chrono::Duration::minutes(30);
        assert!(mgr.sweep_at(within).await.removed.is_empty());

        let later = Utc::now() + chrono::Duration::hours(3);
        let report = mgr.sweep_at(later).await;
        assert_eq!(report.removed, vec![test.id.clone()]);
        assert!(mgr.registry().contains(&dev.id));

        let mut saw_cleanup = false;
        while let Ok(evt) = events.try_recv() {
            if let SessionEvent::CleanedUp { session_id, reason, .. } = evt {
                assert_eq!(session_id, test.id);
                assert_eq!(reason, CleanupReason::Idle);
                saw_cleanup = true;
            }
        }
        assert!(saw_cleanup);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn purge_and_track_process() {
        let dir = tempfile::tempdir().unwrap();
        let mgr = manager(dir.path());
        let s = mgr
            .create_session(CreateSession::new(SessionCategory::Test, "joel"))
            .await
            .unwrap();

        // Pid of a process that has already been reaped.
        let mut child = std::process::Command::new("true").spawn().unwrap();
        let pid = child.id();
        child.wait().unwrap();
        mgr.track_process(&s.id, pid, "browser").unwrap();
        assert_eq!(mgr.get_session(&s.id).unwrap().processes.len(), 1);

        mgr.purge_session(&s.id).await.unwrap();
        assert!(!s.paths.base.exists());
        assert_eq!(mgr.purge_session(&s.id).await.unwrap_err().kind(), "not_found");
        assert_eq!(
            mgr.track_process(&s.id, pid, "browser").unwrap_err().kind(),
            "not_found"
        );
    }
}
