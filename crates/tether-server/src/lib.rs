//! # tether-server
//!
//! Connection routing and the in-process transport adapter.
//!
//! - [`ConnectionOrchestrator`]: maps a connection request onto one routing action
//! - [`handlers`]: message handler trait, built-in components, dispatch
//! - [`server`]: axum `POST /rpc` and `GET /health`

pub mod handlers;
pub mod orchestrator;
pub mod protocol;
pub mod rpc;
pub mod server;

pub use handlers::{
    dispatch, register_builtin, HandlerContext, MessageHandler, MessageHandlerRegistry,
};
pub use orchestrator::{ConnectionOrchestrator, SessionPreference};
pub use protocol::{
    CommandTemplates, ConnectionAction, ConnectionRequest, ConnectionResult, LaunchFlags,
};
pub use rpc::{RpcError, RpcRequest, RpcResponse};
pub use server::{start, AppState, ServerConfig, ServerHandle};
