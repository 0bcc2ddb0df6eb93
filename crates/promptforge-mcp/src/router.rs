//! Method routing: one inbound line in, at most one response out

use promptforge_persistence::Store;
use serde_json::{json, Map, Value};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::{ProtocolError, Result};
use crate::protocol::{JsonRpcRequest, JsonRpcResponse, ServerInfo};
use crate::resources;
use crate::tools::ForgeTools;

/// Maps JSON-RPC methods onto tools and resources
#[derive(Clone)]
pub struct Router {
    store: Arc<dyn Store>,
    tools: ForgeTools,
    info: ServerInfo,
}

impl Router {
    /// Create a router over `store`
    #[must_use]
    pub fn new(store: Arc<dyn Store>, info: ServerInfo) -> Self {
        Self {
            tools: ForgeTools::new(Arc::clone(&store)),
            store,
            info,
        }
    }

    /// Handle one raw line from the channel
    ///
    /// Returns `None` for notifications. Unreadable input still produces an
    /// error response so the client is never left waiting.
    pub async fn handle_line(&self, line: &str) -> Option<JsonRpcResponse> {
        let value: Value = match serde_json::from_str(line) {
            Ok(value) => value,
            Err(e) => {
                warn!("Unparseable message: {}", e);
                return Some(JsonRpcResponse::failure(
                    Value::Null,
                    ProtocolError::Parse(e.to_string()).into(),
                ));
            }
        };

        let id = value.get("id").cloned().unwrap_or(Value::Null);
        let request: JsonRpcRequest = match serde_json::from_value(value) {
            Ok(request) => request,
            Err(e) => {
                return Some(JsonRpcResponse::failure(
                    id,
                    ProtocolError::InvalidRequest(e.to_string()).into(),
                ));
            }
        };

        if request.jsonrpc != "2.0" {
            return Some(JsonRpcResponse::failure(
                id,
                ProtocolError::InvalidRequest(format!(
                    "unsupported jsonrpc version '{}'",
                    request.jsonrpc
                ))
                .into(),
            ));
        }

        self.handle_request(request).await
    }

    /// Handle a decoded request; `None` for notifications
    pub async fn handle_request(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        debug!(method = %request.method, "Received request");

        let is_notification = request.is_notification();
        let result = self.dispatch(&request.method, request.params).await;

        if is_notification {
            if let Err(e) = result {
                debug!("Notification '{}' failed: {}", request.method, e);
            }
            return None;
        }

        let id = request.id.unwrap_or(Value::Null);
        Some(match result {
            Ok(result) => JsonRpcResponse::success(id, result),
            Err(e) => JsonRpcResponse::failure(id, e.into()),
        })
    }

    async fn dispatch(&self, method: &str, params: Option<Value>) -> Result<Value> {
        match method {
            "initialize" => Ok(self.initialize()),
            "notifications/initialized" | "initialized" | "ping" => Ok(json!({})),
            "tools/list" => Ok(json!({ "tools": ForgeTools::descriptors() })),
            "tools/call" => self.call_tool(params).await,
            "resources/list" => resources::list(self.store.as_ref()).await,
            "resources/read" => {
                let params = object_params(params)?;
                let uri = params
                    .get("uri")
                    .and_then(Value::as_str)
                    .ok_or_else(|| ProtocolError::InvalidParams("missing uri".to_string()))?;
                resources::read(self.store.as_ref(), uri).await
            }
            other => Err(ProtocolError::MethodNotFound(other.to_string())),
        }
    }

    fn initialize(&self) -> Value {
        json!({
            "protocolVersion": self.info.protocol_version,
            "capabilities": {
                "tools": { "listChanged": false },
                "resources": { "listChanged": false, "subscribe": false },
            },
            "serverInfo": {
                "name": self.info.name,
                "version": self.info.version,
            },
        })
    }

    async fn call_tool(&self, params: Option<Value>) -> Result<Value> {
        let params = object_params(params)?;
        let name = params
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| ProtocolError::InvalidParams("missing tool name".to_string()))?;

        let arguments = match params.get("arguments") {
            None | Some(Value::Null) => Map::new(),
            Some(Value::Object(arguments)) => arguments.clone(),
            Some(_) => {
                return Err(ProtocolError::InvalidParams(
                    "arguments must be an object".to_string(),
                ))
            }
        };

        let outcome = self.tools.call(name, &arguments).await?;
        Ok(outcome.into_result())
    }
}

fn object_params(params: Option<Value>) -> Result<Map<String, Value>> {
    match params {
        Some(Value::Object(map)) => Ok(map),
        None | Some(Value::Null) => Err(ProtocolError::InvalidParams("missing params".to_string())),
        Some(_) => Err(ProtocolError::InvalidParams("params must be an object".to_string())),
    }
}
