//! Wire types for connection routing.

use serde::{Deserialize, Serialize};
use tether_core::ids::SessionId;
use tether_core::session::{ArtifactPaths, IdentityContext};

/// Request decoded by the transport.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionRequest {
    /// Starter kind: `cli`, `portal`, `git-hook`, `persona` or `validation`.
    pub source: String,
    pub owner: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default)]
    pub capabilities: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_preference: Option<String>,
    #[serde(default)]
    pub context: IdentityContext,
}

impl ConnectionRequest {
    pub fn new(source: impl Into<String>, owner: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            owner: owner.into(),
            ..Self::default()
        }
    }

    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn preference(mut self, preference: impl Into<String>) -> Self {
        self.session_preference = Some(preference.into());
        self
    }

    pub fn capability(mut self, capability: impl Into<String>) -> Self {
        self.capabilities.push(capability.into());
        self
    }

    pub fn wants_browser(&self) -> bool {
        self.capabilities.iter().any(|c| c == "browser")
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionAction {
    JoinedExisting,
    CreatedNew,
    ForkedFrom,
}

impl ConnectionAction {
    /// True when the session's log files were just written.
    pub fn has_new_log_files(&self) -> bool {
        matches!(self, Self::CreatedNew | Self::ForkedFrom)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LaunchFlags {
    pub browser: bool,
    pub webserver: bool,
    pub new_log_files: bool,
}

/// Follow-up commands with the session id substituted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandTemplates {
    pub stop: String,
    pub fork: String,
    pub info: String,
    pub other_clients: String,
}

impl CommandTemplates {
    pub fn for_session(id: &SessionId) -> Self {
        Self {
            stop: format!("session-stop {id}"),
            fork: format!("session-fork {id}"),
            info: format!("session-info {id}"),
            other_clients: format!("connect --session={id}"),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionResult {
    pub session_id: SessionId,
    pub action: ConnectionAction,
    pub paths: ArtifactPaths,
    pub launched: LaunchFlags,
    pub commands: CommandTemplates,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn request_deserializes_with_defaults() {
        let req: ConnectionRequest =
            serde_json::from_value(json!({"source": "cli", "owner": "joel", "category": "development"}))
                .unwrap();
        assert_eq!(req.category.as_deref(), Some("development"));
        assert!(req.capabilities.is_empty());
        assert!(req.session_preference.is_none());
        assert!(!req.wants_browser());
    }

    #[test]
    fn request_reads_camel_case_preference() {
        let req: ConnectionRequest = serde_json::from_value(json!({
            "source": "portal",
            "owner": "shared",
            "capabilities": ["browser"],
            "sessionPreference": "new"
        }))
        .unwrap();
        assert_eq!(req.session_preference.as_deref(), Some("new"));
        assert!(req.wants_browser());
    }

    #[test]
    fn action_wire_names() {
        assert_eq!(
            serde_json::to_value(ConnectionAction::JoinedExisting).unwrap(),
            json!("joined_existing")
        );
        assert_eq!(
            serde_json::to_value(ConnectionAction::ForkedFrom).unwrap(),
            json!("forked_from")
        );
        assert!(!ConnectionAction::JoinedExisting.has_new_log_files());
        assert!(ConnectionAction::CreatedNew.has_new_log_files());
    }

    #[test]
    fn command_templates_substitute_id() {
        let id = SessionId::new();
        let cmds = CommandTemplates::for_session(&id);
        assert_eq!(cmds.stop, format!("session-stop {id}"));
        assert_eq!(cmds.other_clients, format!("connect --session={id}"));
        let json = serde_json::to_value(&cmds).unwrap();
        assert!(json.get("otherClients").is_some());
    }
}
