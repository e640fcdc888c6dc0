//! Message handlers and their startup registration.
//!
//! Components contribute handlers keyed by method name through the
//! [`BUILTIN_HANDLERS`] table. Dispatch goes to the highest-priority entry.

pub mod session;
pub mod system;

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use tether_core::handlers::{HandlerRegistry, RegisterOptions, RegistryError};
use tether_sessions::SessionLifecycleManager;
use tether_telemetry::SessionMetrics;
use tracing::{debug, warn};

use crate::orchestrator::ConnectionOrchestrator;
use crate::rpc::{RpcError, RpcRequest, RpcResponse};

/// Implemented by every message handler.
#[async_trait]
pub trait MessageHandler: Send + Sync {
    async fn handle(&self, params: Option<Value>, ctx: &HandlerContext) -> Result<Value, RpcError>;
}

pub type MessageHandlerRegistry = HandlerRegistry<dyn MessageHandler>;

/// Collaborators available to handlers.
pub struct HandlerContext {
    pub manager: Arc<SessionLifecycleManager>,
    pub orchestrator: ConnectionOrchestrator,
    pub metrics: Arc<SessionMetrics>,
    pub started_at: DateTime<Utc>,
}

impl HandlerContext {
    pub fn new(manager: Arc<SessionLifecycleManager>, metrics: Arc<SessionMetrics>) -> Self {
        Self {
            orchestrator: ConnectionOrchestrator::new(Arc::clone(&manager)),
            manager,
            metrics,
            started_at: Utc::now(),
        }
    }
}

/// One row of the startup registration table.
pub struct Registration {
    pub message_type: &'static str,
    pub component: &'static str,
    pub build: fn() -> Arc<dyn MessageHandler>,
}

fn make<H: MessageHandler + Default + 'static>() -> Arc<dyn MessageHandler> {
    Arc::new(H::default())
}

pub static BUILTIN_HANDLERS: &[Registration] = &[
    Registration {
        message_type: "session.connect",
        component: "session",
        build: make::<session::ConnectHandler>,
    },
    Registration {
        message_type: "session.stop",
        component: "session",
        build: make::<session::StopHandler>,
    },
    Registration {
        message_type: "session.info",
        component: "session",
        build: make::<session::InfoHandler>,
    },
    Registration {
        message_type: "session.list",
        component: "session",
        build: make::<session::ListHandler>,
    },
    Registration {
        message_type: "session.fork",
        component: "session",
        build: make::<session::ForkHandler>,
    },
    Registration {
        message_type: "session.touch",
        component: "session",
        build: make::<session::TouchHandler>,
    },
    Registration {
        message_type: "system.ping",
        component: "system",
        build: make::<system::PingHandler>,
    },
    Registration {
        message_type: "telemetry.metrics",
        component: "system",
        build: make::<system::MetricsHandler>,
    },
];

/// Register every built-in handler. A duplicate row is a startup error.
pub fn register_builtin(registry: &MessageHandlerRegistry) -> Result<(), RegistryError> {
    for row in BUILTIN_HANDLERS {
        registry.register(
            row.message_type,
            (row.build)(),
            row.component,
            RegisterOptions::strict(),
        )?;
    }
    debug!(count = BUILTIN_HANDLERS.len(), "Registered built-in handlers");
    Ok(())
}

/// Route a request to the primary handler for its method.
pub async fn dispatch(
    registry: &MessageHandlerRegistry,
    ctx: &HandlerContext,
    request: RpcRequest,
) -> RpcResponse {
    ctx.metrics.counter_inc("rpc_requests", 1);

    let Some(handler) = registry.primary(&request.method) else {
        ctx.metrics.counter_inc("rpc_errors", 1);
        return RpcResponse::method_not_found(request.id, &request.method);
    };

    let start = Instant::now();
    let response = match handler.handle(request.params, ctx).await {
        Ok(result) => RpcResponse::success(request.id, result),
        Err(err) => {
            ctx.metrics.counter_inc("rpc_errors", 1);
            debug!(method = %request.method, code = err.code(), error = %err, "RPC request failed");
            RpcResponse::failure(request.id, &err)
        }
    };

    let elapsed = start.elapsed();
    if elapsed.as_secs() >= 5 {
        warn!(method = %request.method, duration_secs = elapsed.as_secs_f64(), "slow RPC request");
    }
    response
}


#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use test_helpers::make_test_context;

    struct Echo;

    #[async_trait]
    impl MessageHandler for Echo {
        async fn handle(&self, params: Option<Value>, _ctx: &HandlerContext) -> Result<Value, RpcError> {
            Ok(params.unwrap_or(Value::Null))
        }
    }

    fn request(method: &str, params: Option<Value>) -> RpcRequest {
        RpcRequest {
            method: method.into(),
            params,
            id: Some(json!("r1")),
        }
    }

    #[test]
    fn builtin_table_registers_without_duplicates() {
        let registry = MessageHandlerRegistry::new();
        register_builtin(&registry).unwrap();
        assert_eq!(registry.message_types().len(), BUILTIN_HANDLERS.len());
        assert_eq!(registry.owners("session.connect"), vec!["session"]);
        assert_eq!(registry.owners("telemetry.metrics"), vec!["system"]);

        // Running the table twice trips strict registration.
        let err = register_builtin(&registry).unwrap_err();
        assert!(matches!(err, RegistryError::DuplicateHandler { .. }));
    }

    #[tokio::test]
    async fn unknown_method_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = make_test_context(dir.path());
        let registry = MessageHandlerRegistry::new();
        let resp = dispatch(&registry, &ctx, request("nope", None)).await;
        assert!(!resp.success);
        assert_eq!(resp.error.unwrap().code, "METHOD_NOT_FOUND");
        assert_eq!(ctx.metrics.counter("rpc_errors"), 1);
    }

    #[tokio::test]
    async fn higher_priority_handler_wins() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = make_test_context(dir.path());
        let registry = MessageHandlerRegistry::new();
        register_builtin(&registry).unwrap();
        registry
            .register(
                "system.ping",
                Arc::new(Echo),
                "override",
                RegisterOptions::default().with_priority(10),
            )
            .unwrap();

        let resp = dispatch(&registry, &ctx, request("system.ping", Some(json!({"echo": 1})))).await;
        assert!(resp.success);
        assert_eq!(resp.result.unwrap(), json!({"echo": 1}));
        assert_eq!(resp.id, Some(json!("r1")));
        assert_eq!(registry.handlers("system.ping").len(), 2);
    }
}
