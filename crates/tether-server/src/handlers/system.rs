use async_trait::async_trait;
use chrono::Utc;
use serde_json::{json, Value};

use super::{HandlerContext, MessageHandler};
use crate::rpc::RpcError;

#[derive(Default)]
pub struct PingHandler;

#[async_trait]
impl MessageHandler for PingHandler {
    async fn handle(&self, _params: Option<Value>, ctx: &HandlerContext) -> Result<Value, RpcError> {
        let now = Utc::now();
        let uptime = now.signed_duration_since(ctx.started_at).num_seconds().max(0);
        Ok(json!({
            "pong": true,
            "timestamp": now.to_rfc3339(),
            "uptimeSecs": uptime,
            "sessions": ctx.manager.registry().len(),
        }))
    }
}

/// Snapshot of the session event counters.
#[derive(Default)]
pub struct MetricsHandler;

#[async_trait]
impl MessageHandler for MetricsHandler {
    async fn handle(&self, _params: Option<Value>, ctx: &HandlerContext) -> Result<Value, RpcError> {
        Ok(serde_json::to_value(ctx.metrics.snapshot())?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::test_helpers::make_test_context;

    #[tokio::test]
    async fn ping_reports_pong() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = make_test_context(dir.path());
        let result = PingHandler.handle(None, &ctx).await.unwrap();
        assert_eq!(result["pong"], true);
        assert_eq!(result["sessions"], 0);
    }

    #[tokio::test]
    async fn metrics_snapshot_shape() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = make_test_context(dir.path());
        ctx.metrics.counter_inc("session_created", 2);
        let result = MetricsHandler.handle(None, &ctx).await.unwrap();
        assert_eq!(result["counters"]["session_created"], 2);
        assert_eq!(result["liveSessions"], 0);
    }
}
