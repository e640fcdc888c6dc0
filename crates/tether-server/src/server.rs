use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;
use tokio::sync::oneshot;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::handlers::{self, HandlerContext, MessageHandlerRegistry};
use crate::rpc::{RpcRequest, RpcResponse};

/// Server configuration.
#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    /// `0` binds a free port.
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 9191,
        }
    }
}

/// Shared application state passed to axum handlers.
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<MessageHandlerRegistry>,
    pub ctx: Arc<HandlerContext>,
}

/// Build the axum router with all routes.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/rpc", post(rpc_handler))
        .route("/health", get(health_handler))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Bind and serve. The returned handle stops the server on
/// [`ServerHandle::shutdown`].
pub async fn start(config: ServerConfig, state: AppState) -> Result<ServerHandle, std::io::Error> {
    let router = build_router(state);
    let listener = tokio::net::TcpListener::bind((config.host.as_str(), config.port)).await?;
    let addr = listener.local_addr()?;

    tracing::info!(%addr, "Tether server started");

    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
    let server = tokio::spawn(async move {
        let result = axum::serve(listener, router)
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.await;
            })
            .await;
        if let Err(e) = result {
            tracing::error!(error = %e, "Server exited with error");
        }
    });

    Ok(ServerHandle {
        addr,
        shutdown_tx: Some(shutdown_tx),
        server,
    })
}

/// Keeps the server task alive.
pub struct ServerHandle {
    pub addr: SocketAddr,
    shutdown_tx: Option<oneshot::Sender<()>>,
    server: tokio::task::JoinHandle<()>,
}

impl ServerHandle {
    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    /// Stop accepting connections and wait for in-flight requests.
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Err(e) = (&mut self.server).await {
            tracing::warn!(error = %e, "Server task ended abnormally");
        }
    }
}

/// `POST /rpc`. Always answers 200 with an RPC envelope.
async fn rpc_handler(State(state): State<AppState>, body: String) -> impl IntoResponse {
    let response = match serde_json::from_str::<RpcRequest>(&body) {
        Ok(request) => handlers::dispatch(&state.registry, &state.ctx, request).await,
        Err(e) => RpcResponse::parse_error(format!("Parse error: {e}")),
    };
    Json(response)
}

async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    let uptime = chrono::Utc::now()
        .signed_duration_since(state.ctx.started_at)
        .num_seconds()
        .max(0);
    Json(json!({
        "status": "ok",
        "sessions": state.ctx.manager.registry().len(),
        "uptimeSecs": uptime,
    }))
}
