//! Read-only resources: one per agent plus the instruction digest

use promptforge_persistence::Store;
use promptforge_resolver::{render_instructions, resolve_instructions};
use serde_json::{json, Value};

use crate::error::{ProtocolError, Result};
use crate::protocol::{ResourceContent, ResourceDescriptor};

const AGENT_PREFIX: &str = "prompt-forge://agents/";
const INSTRUCTIONS_URI: &str = "prompt-forge://instructions/all";

fn storage(err: promptforge_persistence::StoreError) -> ProtocolError {
    ProtocolError::Internal(err.to_string())
}

/// `resources/list` result
pub(crate) async fn list(store: &dyn Store) -> Result<Value> {
    let mut resources: Vec<ResourceDescriptor> = store
        .list_agents()
        .await
        .map_err(storage)?
        .into_iter()
        .map(|agent| ResourceDescriptor {
            uri: format!("{AGENT_PREFIX}{}", agent.id),
            name: agent.name,
            description: agent.description,
            mime_type: "application/json",
        })
        .collect();

    resources.push(ResourceDescriptor {
        uri: INSTRUCTIONS_URI.to_string(),
        name: "All Instructions".to_string(),
        description: "All enabled instructions, highest priority first".to_string(),
        mime_type: "text/markdown",
    });

    Ok(json!({ "resources": resources }))
}

/// `resources/read` result for `uri`
pub(crate) async fn read(store: &dyn Store, uri: &str) -> Result<Value> {
    let content = if uri == INSTRUCTIONS_URI {
        let all = store.list_instructions().await.map_err(storage)?;
        ResourceContent {
            uri: uri.to_string(),
            mime_type: "text/markdown",
            text: render_instructions(&resolve_instructions(&all, None)),
        }
    } else if let Some(agent_id) = uri.strip_prefix(AGENT_PREFIX) {
        let agent = store
            .get_agent(agent_id)
            .await
            .map_err(storage)?
            .ok_or_else(|| ProtocolError::InvalidParams(format!("Resource not found: {uri}")))?;
        ResourceContent {
            uri: uri.to_string(),
            mime_type: "application/json",
            text: serde_json::to_string_pretty(&agent)?,
        }
    } else {
        return Err(ProtocolError::InvalidParams(format!("Resource not found: {uri}")));
    };

    Ok(json!({ "contents": [content] }))
}
