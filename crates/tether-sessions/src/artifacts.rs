//! On-disk artifact trees.
//!
//! Layout: `<root>/<category>/<owner-slug>/<session-id>/` holding the fixed
//! subdirectories from [`ARTIFACT_SUBDIRS`](tether_core::session::ARTIFACT_SUBDIRS),
//! a `session-info.json` descriptor and `logs/session.log`.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tether_core::errors::SessionError;
use tether_core::ids::SessionId;
use tether_core::session::{ArtifactPaths, Session, SessionCategory};
use tracing::{debug, warn};

pub const DESCRIPTOR_FILE: &str = "session-info.json";
pub const INITIAL_LOG_FILE: &str = "session.log";

/// Externally inspectable summary of one session.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionDescriptor {
    pub id: SessionId,
    pub category: SessionCategory,
    pub owner: String,
    pub created: DateTime<Utc>,
    pub paths: ArtifactPaths,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub forked_from: Option<SessionId>,
}

impl SessionDescriptor {
    pub fn of(session: &Session) -> Self {
        Self {
            id: session.id.clone(),
            category: session.category,
            owner: session.owner.clone(),
            created: session.created_at,
            paths: session.paths.clone(),
            forked_from: session.context.forked_from.clone(),
        }
    }

    pub async fn load(base: &Path) -> Result<Self, SessionError> {
        let content = tokio::fs::read_to_string(base.join(DESCRIPTOR_FILE)).await?;
        Ok(serde_json::from_str(&content)?)
    }
}

/// Owner names become a single safe path component.
pub fn owner_slug(owner: &str) -> String {
    owner
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '-'
            }
        })
        .collect()
}

pub fn base_path(root: &Path, category: SessionCategory, owner: &str, id: &SessionId) -> PathBuf {
    root.join(category.as_str())
        .join(owner_slug(owner))
        .join(id.as_str())
}

/// Create the directory tree, descriptor and initial log for `session`.
///
/// On error the partially created base directory is removed before returning.
pub async fn provision(session: &Session) -> Result<(), SessionError> {
    match write_tree(session).await {
        Ok(()) => Ok(()),
        Err(e) => {
            if let Err(cleanup) = remove_tree(&session.paths.base).await {
                warn!(
                    session_id = %session.id,
                    error = %cleanup,
                    "Failed to remove partial artifact tree"
                );
            }
            Err(e)
        }
    }
}

async fn write_tree(session: &Session) -> Result<(), SessionError> {
    for dir in session.paths.subdirs() {
        tokio::fs::create_dir_all(dir).await?;
    }

    let descriptor = serde_json::to_string_pretty(&SessionDescriptor::of(session))?;
    tokio::fs::write(session.paths.base.join(DESCRIPTOR_FILE), descriptor).await?;

    let line = format!(
        "[{}] session {} started (category={}, owner={})\n",
        session.created_at.to_rfc3339(),
        session.id,
        session.category,
        session.owner,
    );
    tokio::fs::write(session.paths.logs.join(INITIAL_LOG_FILE), line).await?;

    debug!(session_id = %session.id, base = %session.paths.base.display(), "Artifact tree provisioned");
    Ok(())
}

/// Delete an artifact tree. A tree that is already gone is not an error.
pub async fn remove_tree(base: &Path) -> Result<(), SessionError> {
    match tokio::fs::remove_dir_all(base).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}
