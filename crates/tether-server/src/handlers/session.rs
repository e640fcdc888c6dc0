//! Session handlers: connect, stop, info, list, fork, touch.

use async_trait::async_trait;
use serde_json::{json, Value};
use tether_core::session::SessionCategory;
use tether_sessions::{CreateSession, SessionFilter};
use tracing::instrument;

use super::{HandlerContext, MessageHandler};
use crate::protocol::ConnectionRequest;
use crate::rpc::{optional_bool, optional_str, require_session_id, RpcError};

fn parse_category(raw: &str) -> Result<SessionCategory, RpcError> {
    raw.parse().map_err(RpcError::invalid_params)
}

/// Route a connection request.
#[derive(Default)]
pub struct ConnectHandler;

#[async_trait]
impl MessageHandler for ConnectHandler {
    #[instrument(skip_all, fields(method = "session.connect"))]
    async fn handle(&self, params: Option<Value>, ctx: &HandlerContext) -> Result<Value, RpcError> {
        let params = params.ok_or_else(|| RpcError::invalid_params("params required"))?;
        let request: ConnectionRequest = serde_json::from_value(params)
            .map_err(|e| RpcError::invalid_params(format!("invalid connection request: {e}")))?;
        let result = ctx.orchestrator.orchestrate(&request).await?;
        Ok(serde_json::to_value(result)?)
    }
}

/// Stop a session; artifacts are preserved unless `preserveArtifacts` is false.
#[derive(Default)]
pub struct StopHandler;

#[async_trait]
impl MessageHandler for StopHandler {
    #[instrument(skip_all, fields(method = "session.stop"))]
    async fn handle(&self, params: Option<Value>, ctx: &HandlerContext) -> Result<Value, RpcError> {
        let id = require_session_id(params.as_ref())?;
        let preserve = optional_bool(params.as_ref(), "preserveArtifacts").unwrap_or(true);
        let session = ctx.manager.stop_session(&id, preserve).await?;
        Ok(json!({
            "sessionId": session.id,
            "isActive": session.is_active,
            "preserveArtifacts": preserve,
        }))
    }
}

#[derive(Default)]
pub struct InfoHandler;

#[async_trait]
impl MessageHandler for InfoHandler {
    #[instrument(skip_all, fields(method = "session.info"))]
    async fn handle(&self, params: Option<Value>, ctx: &HandlerContext) -> Result<Value, RpcError> {
        let id = require_session_id(params.as_ref())?;
        let session = ctx.manager.get_session(&id)?;
        Ok(serde_json::to_value(session)?)
    }
}

/// List sessions filtered by `owner`, `category` and `activeOnly`.
#[derive(Default)]
pub struct ListHandler;

#[async_trait]
impl MessageHandler for ListHandler {
    #[instrument(skip_all, fields(method = "session.list"))]
    async fn handle(&self, params: Option<Value>, ctx: &HandlerContext) -> Result<Value, RpcError> {
        let params = params.as_ref();
        let mut filter = SessionFilter::default();
        if let Some(owner) = optional_str(params, "owner") {
            filter = filter.owner(owner);
        }
        if let Some(category) = optional_str(params, "category") {
            filter = filter.category(parse_category(category)?);
        }
        if optional_bool(params, "activeOnly").unwrap_or(false) {
            filter = filter.active_only();
        }
        let sessions = ctx.manager.registry().list(&filter);
        Ok(json!({
            "count": sessions.len(),
            "sessions": sessions,
        }))
    }
}

/// Fork `sessionId`. Owner and category default to the source's.
#[derive(Default)]
pub struct ForkHandler;

#[async_trait]
impl MessageHandler for ForkHandler {
    #[instrument(skip_all, fields(method = "session.fork"))]
    async fn handle(&self, params: Option<Value>, ctx: &HandlerContext) -> Result<Value, RpcError> {
        let source_id = require_session_id(params.as_ref())?;
        let source = ctx.manager.get_session(&source_id)?;
        let owner = optional_str(params.as_ref(), "owner").unwrap_or(&source.owner);
        let category = match optional_str(params.as_ref(), "category") {
            Some(raw) => parse_category(raw)?,
            None => source.category,
        };
        let forked = ctx
            .manager
            .fork_session(&source_id, CreateSession::new(category, owner))
            .await?;
        Ok(json!({
            "sessionId": forked.id,
            "forkedFrom": source_id,
            "paths": forked.paths,
        }))
    }
}

#[derive(Default)]
pub struct TouchHandler;

#[async_trait]
impl MessageHandler for TouchHandler {
    #[instrument(skip_all, fields(method = "session.touch"))]
    async fn handle(&self, params: Option<Value>, ctx: &HandlerContext) -> Result<Value, RpcError> {
        let id = require_session_id(params.as_ref())?;
        let session = ctx.manager.touch_session(&id)?;
        Ok(json!({
            "sessionId": session.id,
            "lastActive": session.last_active,
        }))
    }
}
