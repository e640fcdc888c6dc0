//! Session data model shared by the registry, lifecycle manager and router.

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::SessionId;

/// Reserved owner value used for pooled sessions.
pub const SHARED_OWNER: &str = "shared";

/// Default inactivity window before a session is swept.
pub const DEFAULT_CLEANUP_AFTER: Duration = Duration::from_secs(2 * 60 * 60);

/// Fixed subdirectories provisioned under every session base directory.
pub const ARTIFACT_SUBDIRS: [&str; 5] = ["logs", "screenshots", "files", "recordings", "devtools"];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionCategory {
    Development,
    Persona,
    Portal,
    Validation,
    Test,
}

impl SessionCategory {
    pub const ALL: [SessionCategory; 5] = [
        Self::Development,
        Self::Persona,
        Self::Portal,
        Self::Validation,
        Self::Test,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Persona => "persona",
            Self::Portal => "portal",
            Self::Validation => "validation",
            Self::Test => "test",
        }
    }

    /// Development sessions are long-lived and never auto-swept by default.
    pub fn default_auto_cleanup(&self) -> bool {
        !matches!(self, Self::Development)
    }
}

impl std::fmt::Display for SessionCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SessionCategory {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| format!("unknown session category: {s}"))
    }
}

/// Kind of component that started a connection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StarterKind {
    Cli,
    Portal,
    GitHook,
    Persona,
    Validation,
}

impl StarterKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cli => "cli",
            Self::Portal => "portal",
            Self::GitHook => "git-hook",
            Self::Persona => "persona",
            Self::Validation => "validation",
        }
    }
}

impl std::fmt::Display for StarterKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for StarterKind {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cli" => Ok(Self::Cli),
            "portal" => Ok(Self::Portal),
            "git-hook" => Ok(Self::GitHook),
            "persona" => Ok(Self::Persona),
            "validation" => Ok(Self::Validation),
            other => Err(format!("unknown connection source: {other}")),
        }
    }
}

/// Optional free-form context attached to an identity.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct IdentityContext {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
}

/// Who is connecting. Identities arrive pre-validated from upstream.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionIdentity {
    pub starter: StarterKind,
    pub name: String,
    #[serde(default)]
    pub context: IdentityContext,
}

/// Context recorded on a session at creation time.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SessionContext {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub starter: Option<StarterKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requested_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub forked_from: Option<SessionId>,
}

impl SessionContext {
    pub fn from_identity(identity: &ConnectionIdentity) -> Self {
        Self {
            starter: Some(identity.starter),
            requested_by: Some(identity.name.clone()),
            branch: identity.context.branch.clone(),
            project: identity.context.project.clone(),
            forked_from: None,
        }
    }
}

/// On-disk artifact layout for one session.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactPaths {
    pub base: PathBuf,
    pub logs: PathBuf,
    pub screenshots: PathBuf,
    pub files: PathBuf,
    pub recordings: PathBuf,
    pub devtools: PathBuf,
}

impl ArtifactPaths {
    pub fn under(base: impl Into<PathBuf>) -> Self {
        let base = base.into();
        Self {
            logs: base.join("logs"),
            screenshots: base.join("screenshots"),
            files: base.join("files"),
            recordings: base.join("recordings"),
            devtools: base.join("devtools"),
            base,
        }
    }

    pub fn subdirs(&self) -> [&Path; 5] {
        [
            &self.logs,
            &self.screenshots,
            &self.files,
            &self.recordings,
            &self.devtools,
        ]
    }
}

/// An OS process whose lifetime is bound to a session.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackedProcess {
    pub pid: u32,
    pub label: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: SessionId,
    pub category: SessionCategory,
    pub owner: String,
    pub created_at: DateTime<Utc>,
    pub last_active: DateTime<Utc>,
    pub is_active: bool,
    pub paths: ArtifactPaths,
    #[serde(default)]
    pub processes: Vec<TrackedProcess>,
    pub auto_cleanup: bool,
    #[serde(with = "duration_ms")]
    pub cleanup_after: Duration,
    #[serde(default)]
    pub context: SessionContext,
}

impl Session {
    pub fn is_shared(&self) -> bool {
        self.owner == SHARED_OWNER
    }

    /// True when the sweep should remove this session at `now`.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        if !self.is_active {
            return true;
        }
        if !self.auto_cleanup {
            return false;
        }
        let idle = now.signed_duration_since(self.last_active);
        idle.to_std().map(|d| d > self.cleanup_after).unwrap_or(false)
    }

    /// Advances `last_active` without ever moving it backwards.
    pub fn touch(&mut self, now: DateTime<Utc>) {
        if now > self.last_active {
            self.last_active = now;
        }
    }
}

mod duration_ms {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(now: DateTime<Utc>) -> Session {
        Session {
            id: SessionId::new(),
            category: SessionCategory::Portal,
            owner: SHARED_OWNER.into(),
            created_at: now,
            last_active: now,
            is_active: true,
            paths: ArtifactPaths::under("/tmp/sessions/portal/shared/x"),
            processes: Vec::new(),
            auto_cleanup: true,
            cleanup_after: Duration::from_secs(60),
            context: SessionContext::default(),
        }
    }

    #[test]
    fn category_round_trips_through_str() {
        for c in SessionCategory::ALL {
            assert_eq!(c.as_str().parse::<SessionCategory>().unwrap(), c);
        }
        assert!("staging".parse::<SessionCategory>().is_err());
    }

    #[test]
    fn development_defaults_to_no_auto_cleanup() {
        assert!(!SessionCategory::Development.default_auto_cleanup());
        assert!(SessionCategory::Persona.default_auto_cleanup());
        assert!(SessionCategory::Test.default_auto_cleanup());
    }

    #[test]
    fn starter_kind_parses_git_hook() {
        assert_eq!("git-hook".parse::<StarterKind>().unwrap(), StarterKind::GitHook);
        assert_eq!(
            serde_json::to_value(StarterKind::GitHook).unwrap(),
            serde_json::json!("git-hook")
        );
        assert!("daemon".parse::<StarterKind>().is_err());
    }

    #[test]
    fn artifact_paths_layout() {
        let paths = ArtifactPaths::under("/data/s1");
        assert_eq!(paths.logs, PathBuf::from("/data/s1/logs"));
        assert_eq!(paths.devtools, PathBuf::from("/data/s1/devtools"));
        let names: Vec<_> = paths
            .subdirs()
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap().to_string())
            .collect();
        assert_eq!(names, ARTIFACT_SUBDIRS);
    }

    #[test]
    fn touch_is_monotonic() {
        let now = Utc::now();
        let mut s = sample(now);
        s.touch(now - chrono::Duration::seconds(30));
        assert_eq!(s.last_active, now);
        let later = now + chrono::Duration::seconds(5);
        s.touch(later);
        assert_eq!(s.last_active, later);
    }

    #[test]
    fn expiry_rules() {
        let now = Utc::now();
        let mut s = sample(now);
        assert!(!s.is_expired(now + chrono::Duration::seconds(30)));
        assert!(s.is_expired(now + chrono::Duration::seconds(61)));

        s.auto_cleanup = false;
        assert!(!s.is_expired(now + chrono::Duration::days(3)));

        s.is_active = false;
        assert!(s.is_expired(now));
    }

    #[test]
    fn session_serializes_camel_case() {
        let s = sample(Utc::now());
        let json = serde_json::to_value(&s).unwrap();
        assert!(json.get("lastActive").is_some());
        assert_eq!(json["cleanupAfter"], 60_000);
        assert_eq!(json["category"], "portal");
    }
}
