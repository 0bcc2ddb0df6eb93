//! Error types for protocol handling

use thiserror::Error;

use crate::protocol::JsonRpcError;

/// JSON-RPC level failures
///
/// Tool failures (unknown agent, storage trouble) are not protocol errors:
/// they travel inside a successful response as an `isError` tool result.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    /// Line is not valid JSON
    #[error("Parse error: {0}")]
    Parse(String),

    /// Valid JSON but not a JSON-RPC 2.0 request
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// No such method
    #[error("Method not found: {0}")]
    MethodNotFound(String),

    /// Params missing, of the wrong shape, or naming an unknown tool/resource
    #[error("Invalid params: {0}")]
    InvalidParams(String),

    /// Failure inside the server while handling a well-formed request
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ProtocolError {
    /// JSON-RPC 2.0 error code
    #[must_use]
    pub fn code(&self) -> i32 {
        match self {
            ProtocolError::Parse(_) => -32700,
            ProtocolError::InvalidRequest(_) => -32600,
            ProtocolError::MethodNotFound(_) => -32601,
            ProtocolError::InvalidParams(_) => -32602,
            ProtocolError::Internal(_) => -32603,
        }
    }
}

impl From<ProtocolError> for JsonRpcError {
    fn from(err: ProtocolError) -> Self {
        JsonRpcError {
            code: err.code(),
            message: err.to_string(),
            data: None,
        }
    }
}

impl From<serde_json::Error> for ProtocolError {
    fn from(err: serde_json::Error) -> Self {
        ProtocolError::Internal(format!("serialization failed: {err}"))
    }
}

/// Convenient Result type alias
pub type Result<T> = std::result::Result<T, ProtocolError>;
