use serde::{Deserialize, Serialize};
use serde_json::Value;
use tether_core::errors::SessionError;
use tether_core::ids::SessionId;

/// Request envelope: `{ method, params?, id? }`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RpcRequest {
    pub method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
}

/// Response envelope: `{ id, success, result?, error?: { code, message } }`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RpcResponse {
    pub id: Option<Value>,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcErrorBody>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RpcErrorBody {
    pub code: String,
    pub message: String,
}

pub const PARSE_ERROR: &str = "PARSE_ERROR";
pub const INVALID_PARAMS: &str = "INVALID_PARAMS";
pub const METHOD_NOT_FOUND: &str = "METHOD_NOT_FOUND";
pub const NOT_FOUND: &str = "NOT_FOUND";
pub const SESSION_INACTIVE: &str = "SESSION_INACTIVE";
pub const INTERNAL_ERROR: &str = "INTERNAL_ERROR";

/// Handler failure, mapped onto a wire error code.
#[derive(Debug, thiserror::Error)]
pub enum RpcError {
    #[error("{message}")]
    InvalidParams { message: String },

    #[error("Method not found: {method}")]
    MethodNotFound { method: String },

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error("{message}")]
    Internal { message: String },
}

impl RpcError {
    pub fn invalid_params(message: impl Into<String>) -> Self {
        Self::InvalidParams {
            message: message.into(),
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidParams { .. } => INVALID_PARAMS,
            Self::MethodNotFound { .. } => METHOD_NOT_FOUND,
            Self::Session(e) => match e {
                SessionError::NotFound(_) => NOT_FOUND,
                SessionError::InvalidRequest(_) => INVALID_PARAMS,
                SessionError::Inactive(_) => SESSION_INACTIVE,
                SessionError::Io(_) | SessionError::Serialization(_) => INTERNAL_ERROR,
            },
            Self::Internal { .. } => INTERNAL_ERROR,
        }
    }

    pub fn to_error_body(&self) -> RpcErrorBody {
        RpcErrorBody {
            code: self.code().to_owned(),
            message: self.to_string(),
        }
    }
}

impl From<serde_json::Error> for RpcError {
    fn from(e: serde_json::Error) -> Self {
        Self::Internal {
            message: e.to_string(),
        }
    }
}

impl RpcResponse {
    pub fn success(id: Option<Value>, result: Value) -> Self {
        Self {
            id,
            success: true,
            result: Some(result),
            error: None,
        }
    }

    pub fn failure(id: Option<Value>, err: &RpcError) -> Self {
        Self {
            id,
            success: false,
            result: None,
            error: Some(err.to_error_body()),
        }
    }

    pub fn method_not_found(id: Option<Value>, method: &str) -> Self {
        Self::failure(
            id,
            &RpcError::MethodNotFound {
                method: method.to_owned(),
            },
        )
    }

    pub fn parse_error(message: impl Into<String>) -> Self {
        Self {
            id: None,
            success: false,
            result: None,
            error: Some(RpcErrorBody {
                code: PARSE_ERROR.to_owned(),
                message: message.into(),
            }),
        }
    }
}

/// Extract a required string param.
pub fn require_str<'a>(params: Option<&'a Value>, key: &str) -> Result<&'a str, RpcError> {
    params
        .and_then(|p| p.get(key))
        .and_then(Value::as_str)
        .ok_or_else(|| RpcError::invalid_params(format!("Missing required parameter: {key}")))
}

pub fn optional_str<'a>(params: Option<&'a Value>, key: &str) -> Option<&'a str> {
    params.and_then(|p| p.get(key)).and_then(Value::as_str)
}

pub fn optional_bool(params: Option<&Value>, key: &str) -> Option<bool> {
    params.and_then(|p| p.get(key)).and_then(Value::as_bool)
}

/// Resolve the `sessionId` param. Malformed ids cannot name a session.
pub fn require_session_id(params: Option<&Value>) -> Result<SessionId, RpcError> {
    let raw = require_str(params, "sessionId")?;
    SessionId::parse_canonical(raw).map_err(|_| SessionError::not_found(raw).into())
}
