//! Connection routing.
//!
//! [`ConnectionOrchestrator`] turns a [`ConnectionRequest`] into exactly one
//! routing action. It holds no state of its own: reads go to the registry and
//! every mutation is delegated to the lifecycle manager.

use std::sync::Arc;

use chrono::Utc;
use tether_core::errors::SessionError;
use tether_core::events::SessionEvent;
use tether_core::ids::SessionId;
use tether_core::session::{
    ConnectionIdentity, Session, SessionCategory, SessionContext, StarterKind,
};
use tether_sessions::{CreateSession, SessionLifecycleManager};
use tracing::{debug, instrument};

use crate::protocol::{
    CommandTemplates, ConnectionAction, ConnectionRequest, ConnectionResult, LaunchFlags,
};

/// Parsed `sessionPreference`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SessionPreference {
    /// Pool on the shared session for the category.
    Default,
    New,
    /// Raw source id as given after `fork:`.
    Fork(String),
    Join(SessionId),
}

impl SessionPreference {
    pub fn parse(raw: Option<&str>) -> Result<Self, SessionError> {
        let Some(raw) = raw.map(str::trim) else {
            return Ok(Self::Default);
        };
        match raw {
            "" | "shared" | "current" | "default" => Ok(Self::Default),
            "new" => Ok(Self::New),
            _ => {
                if let Some(source) = raw.strip_prefix("fork:") {
                    return Ok(Self::Fork(source.trim().to_owned()));
                }
                SessionId::parse_canonical(raw).map(Self::Join).map_err(|_| {
                    SessionError::invalid(format!("unrecognized session preference: {raw}"))
                })
            }
        }
    }
}

#[derive(Clone)]
pub struct ConnectionOrchestrator {
    manager: Arc<SessionLifecycleManager>,
}

impl ConnectionOrchestrator {
    pub fn new(manager: Arc<SessionLifecycleManager>) -> Self {
        Self { manager }
    }

    pub fn manager(&self) -> &Arc<SessionLifecycleManager> {
        &self.manager
    }

    /// Route one request. Validation happens before any state is touched.
    #[instrument(skip_all, fields(source = %request.source, owner = %request.owner))]
    pub async fn orchestrate(
        &self,
        request: &ConnectionRequest,
    ) -> Result<ConnectionResult, SessionError> {
        let starter: StarterKind = request.source.parse().map_err(SessionError::InvalidRequest)?;
        if request.owner.trim().is_empty() {
            return Err(SessionError::invalid("owner is required"));
        }
        let preference = SessionPreference::parse(request.session_preference.as_deref())?;
        let context = SessionContext::from_identity(&ConnectionIdentity {
            starter,
            name: request.owner.clone(),
            context: request.context.clone(),
        });

        let (session, action) = match preference {
            SessionPreference::New => {
                let category = required_category(request)?;
                let session = self
                    .manager
                    .create_session(
                        CreateSession::new(category, request.owner.clone()).with_context(context),
                    )
                    .await?;
                (session, ConnectionAction::CreatedNew)
            }
            SessionPreference::Fork(raw) => {
                // A malformed id can never be in the registry.
                let source_id = SessionId::parse_canonical(&raw)
                    .map_err(|_| SessionError::not_found(&raw))?;
                let source = self.manager.get_session(&source_id)?;
                let category = match optional_category(request)? {
                    Some(category) => category,
                    None => source.category,
                };
                let session = self
                    .manager
                    .fork_session(
                        &source_id,
                        CreateSession::new(category, request.owner.clone()).with_context(context),
                    )
                    .await?;
                (session, ConnectionAction::ForkedFrom)
            }
            SessionPreference::Join(id) => {
                let session = self.manager.touch_session(&id)?;
                (session, ConnectionAction::JoinedExisting)
            }
            SessionPreference::Default => {
                let category = required_category(request)?;
                let shared = self
                    .manager
                    .find_or_create_shared_session(category, context)
                    .await?;
                let action = if shared.created {
                    ConnectionAction::CreatedNew
                } else {
                    ConnectionAction::JoinedExisting
                };
                (shared.session, action)
            }
        };

        if action == ConnectionAction::JoinedExisting {
            self.manager.bus().publish(SessionEvent::Joined {
                session_id: session.id.clone(),
                requested_by: request.owner.clone(),
                at: Utc::now(),
            });
        }
        debug!(session_id = %session.id, ?action, "Connection routed");
        Ok(build_result(session, action, request.wants_browser()))
    }
}

fn optional_category(request: &ConnectionRequest) -> Result<Option<SessionCategory>, SessionError> {
    match request.category.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(raw) => raw
            .parse()
            .map(Some)
            .map_err(SessionError::InvalidRequest),
    }
}

fn required_category(request: &ConnectionRequest) -> Result<SessionCategory, SessionError> {
    optional_category(request)?.ok_or_else(|| SessionError::invalid("category is required"))
}

fn build_result(session: Session, action: ConnectionAction, browser: bool) -> ConnectionResult {
    ConnectionResult {
        commands: CommandTemplates::for_session(&session.id),
        session_id: session.id,
        action,
        paths: session.paths,
        launched: LaunchFlags {
            browser,
            webserver: true,
            new_log_files: action.has_new_log_files(),
        },
    }
}
