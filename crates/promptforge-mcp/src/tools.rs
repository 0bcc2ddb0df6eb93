//! The six tools exposed to the client
//!
//! Tool names and argument names are part of the compatibility surface.

use chrono::Utc;
use promptforge_persistence::Store;
use promptforge_resolver::{
    find_skill, render_prompt, resolve_applied_agent, resolve_instructions, AppliedAgent,
};
use promptforge_types::{
    AgentSummary, ForgeError, ForgeResult, InstructionCategory, RecordKind, SkillSummary,
};
use serde_json::{json, Map, Value};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::error::{ProtocolError, Result};
use crate::protocol::ToolDescriptor;

/// Result of one tool call, before it is wrapped in the MCP envelope
#[derive(Debug, Clone, PartialEq)]
pub struct ToolOutcome {
    /// Human/model readable text block
    pub text: String,
    /// Machine readable payload (`structuredContent`)
    pub structured: Value,
    /// True when the tool failed
    pub is_error: bool,
}

impl ToolOutcome {
    fn json(structured: Value) -> Self {
        let text = serde_json::to_string_pretty(&structured).unwrap_or_default();
        Self {
            text,
            structured,
            is_error: false,
        }
    }

    fn failure(err: &ForgeError) -> Self {
        Self {
            text: err.to_string(),
            structured: json!({
                "error": {
                    "kind": err.kind(),
                    "message": err.to_string(),
                }
            }),
            is_error: true,
        }
    }

    /// MCP `tools/call` result object
    #[must_use]
    pub fn into_result(self) -> Value {
        json!({
            "content": [{ "type": "text", "text": self.text }],
            "structuredContent": self.structured,
            "isError": self.is_error,
        })
    }
}

/// Tool dispatcher over a [`Store`]
#[derive(Clone)]
pub struct ForgeTools {
    store: Arc<dyn Store>,
}

impl ForgeTools {
    /// Create tools backed by `store`
    #[must_use]
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Descriptors returned by `tools/list`
    #[must_use]
    pub fn descriptors() -> Vec<ToolDescriptor> {
        let agent_id = |description: &str| {
            json!({
                "type": "object",
                "properties": {
                    "agent_id": { "type": "string", "description": description }
                },
                "required": ["agent_id"]
            })
        };
        let no_arguments = || json!({ "type": "object", "properties": {} });

        vec![
            ToolDescriptor {
                name: "list_agents",
                description: "List all available Prompt Forge agents (id, name, description)",
                input_schema: no_arguments(),
            },
            ToolDescriptor {
                name: "get_agent",
                description: "Get a Prompt Forge agent's full configuration including system prompt, \
                              personality, and attached skill/instruction ids",
                input_schema: agent_id(
                    "The ID of the agent to retrieve. Use 'default' for the default agent.",
                ),
            },
            ToolDescriptor {
                name: "apply_agent",
                description: "Apply an agent's configuration - returns the combined prompt with all \
                              attached skills and enabled instructions, and records the use",
                input_schema: agent_id("The ID of the agent to apply"),
            },
            ToolDescriptor {
                name: "list_skills",
                description: "List all available skills",
                input_schema: no_arguments(),
            },
            ToolDescriptor {
                name: "get_skill",
                description: "Get a specific skill's full configuration. Looks up by ID first, then \
                              by case-insensitive name (e.g. 'Code Review')",
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "id_or_name": {
                            "type": "string",
                            "description": "The ID or name of the skill to retrieve"
                        }
                    },
                    "required": ["id_or_name"]
                }),
            },
            ToolDescriptor {
                name: "get_instructions",
                description: "Get enabled instructions ordered by priority, optionally for one category",
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "category": {
                            "type": "string",
                            "description": "Optional category filter: general, code_style, communication, \
                                            workflow, security, testing, documentation, custom"
                        }
                    }
                }),
            },
        ]
    }

    /// Run tool `name`
    ///
    /// Only an unknown tool is a protocol error; everything that goes wrong
    /// inside a tool comes back as an `is_error` outcome.
    ///
    /// # Errors
    /// Returns [`ProtocolError::InvalidParams`] for an unknown tool name
    pub async fn call(&self, name: &str, arguments: &Map<String, Value>) -> Result<ToolOutcome> {
        let result = match name {
            "list_agents" => self.list_agents().await,
            "get_agent" => self.get_agent(arguments).await,
            "apply_agent" => self.apply_agent(arguments).await,
            "list_skills" => self.list_skills().await,
            "get_skill" => self.get_skill(arguments).await,
            "get_instructions" => self.get_instructions(arguments).await,
            other => return Err(ProtocolError::InvalidParams(format!("unknown tool '{other}'"))),
        };

        Ok(result.unwrap_or_else(|err| {
            debug!(tool = name, kind = err.kind(), "Tool call failed: {}", err);
            ToolOutcome::failure(&err)
        }))
    }

    async fn list_agents(&self) -> ForgeResult<ToolOutcome> {
        let agents: Vec<AgentSummary> = self
            .store
            .list_agents()
            .await?
            .iter()
            .map(promptforge_types::Agent::summary)
            .collect();
        Ok(ToolOutcome::json(json!({ "agents": agents })))
    }

    async fn get_agent(&self, arguments: &Map<String, Value>) -> ForgeResult<ToolOutcome> {
        let agent_id = required_str(arguments, &["agent_id"])?;
        let agent = self
            .store
            .get_agent(agent_id)
            .await?
            .ok_or_else(|| ForgeError::not_found(RecordKind::Agent, agent_id))?;
        Ok(ToolOutcome::json(json!(agent)))
    }

    /// Resolve, then record the use
    ///
    /// A failed usage write does not fail the call: the composite is still
    /// returned, with `usage.recorded = false` and the cause.
    async fn apply_agent(&self, arguments: &Map<String, Value>) -> ForgeResult<ToolOutcome> {
        let agent_id = required_str(arguments, &["agent_id"])?;

        let agents = self.store.list_agents().await?;
        let skills = self.store.list_skills().await?;
        let instructions = self.store.list_instructions().await?;
        let mut applied: AppliedAgent =
            resolve_applied_agent(agent_id, &agents, &skills, &instructions)?;

        let usage = match self.store.record_agent_usage(agent_id, Utc::now()).await {
            Ok(Some(updated)) => {
                applied.agent = updated;
                json!({ "recorded": true })
            }
            Ok(None) => {
                warn!(agent_id, "Agent disappeared before its use could be recorded");
                json!({ "recorded": false, "error": format!("agent '{agent_id}' no longer exists") })
            }
            Err(err) => {
                warn!(agent_id, "Failed to record agent usage: {}", err);
                json!({ "recorded": false, "error": err.to_string() })
            }
        };

        info!(
            agent_id,
            skills = applied.resolved_skills.len(),
            instructions = applied.resolved_instructions.len(),
            "Applied agent"
        );

        let prompt = render_prompt(&applied);
        Ok(ToolOutcome {
            text: prompt.clone(),
            structured: json!({
                "agent": applied.agent,
                "resolved_skills": applied.resolved_skills,
                "resolved_instructions": applied.resolved_instructions,
                "prompt": prompt,
                "usage": usage,
            }),
            is_error: false,
        })
    }

    async fn list_skills(&self) -> ForgeResult<ToolOutcome> {
        let skills: Vec<SkillSummary> = self
            .store
            .list_skills()
            .await?
            .iter()
            .map(promptforge_types::Skill::summary)
            .collect();
        Ok(ToolOutcome::json(json!({ "skills": skills })))
    }

    async fn get_skill(&self, arguments: &Map<String, Value>) -> ForgeResult<ToolOutcome> {
        let id_or_name = required_str(arguments, &["id_or_name", "skill_id"])?;
        let skills = self.store.list_skills().await?;
        let skill = find_skill(id_or_name, &skills)?;
        Ok(ToolOutcome::json(json!(skill)))
    }

    async fn get_instructions(&self, arguments: &Map<String, Value>) -> ForgeResult<ToolOutcome> {
        let category = match arguments.get("category") {
            None | Some(Value::Null) => None,
            Some(Value::String(raw)) => match raw.parse::<InstructionCategory>() {
                Ok(category) => Some(category),
                Err(_) => {
                    debug!(category = %raw, "Unknown category, no instructions match");
                    return Ok(ToolOutcome::json(json!({ "instructions": [] })));
                }
            },
            Some(_) => return Err(ForgeError::validation("category", "must be a string")),
        };

        let all = self.store.list_instructions().await?;
        let instructions = resolve_instructions(&all, category);
        Ok(ToolOutcome::json(json!({ "instructions": instructions })))
    }
}

/// First of `keys` present in `arguments`, which must be a non-empty string
fn required_str<'a>(arguments: &'a Map<String, Value>, keys: &[&str]) -> ForgeResult<&'a str> {
    let field = keys.first().copied().unwrap_or("argument");
    let value = keys
        .iter()
        .find_map(|key| arguments.get(*key))
        .ok_or_else(|| ForgeError::validation(field, "is required"))?;

    match value.as_str() {
        Some(s) if !s.trim().is_empty() => Ok(s),
        Some(_) => Err(ForgeError::validation(field, "cannot be empty")),
        None => Err(ForgeError::validation(field, "must be a string")),
    }
}
