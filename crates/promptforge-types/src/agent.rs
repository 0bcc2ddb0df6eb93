use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{ForgeError, ForgeResult};

/// Personality traits that influence how the agent communicates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Personality {
    pub tone: String,      // e.g. "friendly", "professional"
    pub verbosity: String, // e.g. "concise", "balanced", "detailed"
    pub creativity: f32,   // 0.0 - 1.0
    pub formality: f32,    // 0.0 (casual) - 1.0 (formal)
    pub traits: Vec<String>,
}

impl Default for Personality {
    fn default() -> Self {
        Self {
            tone: "friendly".to_string(),
            verbosity: "balanced".to_string(),
            creativity: 0.5,
            formality: 0.5,
            traits: vec!["helpful".to_string(), "clear".to_string()],
        }
    }
}

impl Personality {
    /// Clamp the numeric dials into [0, 1]; NaN becomes the midpoint
    pub fn clamped(mut self) -> Self {
        self.creativity = clamp_unit(self.creativity);
        self.formality = clamp_unit(self.formality);
        self
    }
}

pub(crate) fn clamp_unit(value: f32) -> f32 {
    if value.is_nan() {
        0.5
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// A customizable AI persona with a system prompt and weak references to
/// skills and instructions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Agent {
    pub id: String,
    pub name: String,
    pub description: String,
    pub avatar_emoji: String,
    pub personality: Personality,
    pub system_prompt: String,
    pub skills: Vec<String>,       // Skill ids, may dangle
    pub instructions: Vec<String>, // Instruction ids, may dangle
    pub tags: Vec<String>,
    #[serde(default)]
    pub usage_count: u64,
    #[serde(default)]
    pub last_used_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Minimal projection returned by `list_agents`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentSummary {
    pub id: String,
    pub name: String,
    pub description: String,
}

impl Agent {
    /// Materialize a new agent from creation input
    pub fn new(id: String, input: NewAgent, now: DateTime<Utc>) -> Self {
        Self {
            id,
            name: input.name,
            description: input.description,
            avatar_emoji: input.avatar_emoji,
            personality: input.personality.clamped(),
            system_prompt: input.system_prompt,
            skills: input.skills,
            instructions: input.instructions,
            tags: input.tags,
            usage_count: 0,
            last_used_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn summary(&self) -> AgentSummary {
        AgentSummary {
            id: self.id.clone(),
            name: self.name.clone(),
            description: self.description.clone(),
        }
    }

    /// Check invariants the editing layer is expected to uphold
    pub fn validate(&self) -> ForgeResult<()> {
        if self.name.trim().is_empty() {
            return Err(ForgeError::validation("name", "agent name cannot be empty"));
        }
        Ok(())
    }

    /// Record one use of this agent
    pub fn record_usage(&mut self, at: DateTime<Utc>) {
        self.usage_count = self.usage_count.saturating_add(1);
        self.last_used_at = Some(at);
    }
}

/// Input for creating a new agent (no id, no timestamps)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewAgent {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_avatar")]
    pub avatar_emoji: String,
    #[serde(default)]
    pub personality: Personality,
    #[serde(default)]
    pub system_prompt: String,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub instructions: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

fn default_avatar() -> String {
    "🤖".to_string()
}

impl Default for NewAgent {
    fn default() -> Self {
        Self {
            name: "New Agent".to_string(),
            description: String::new(),
            avatar_emoji: default_avatar(),
            personality: Personality::default(),
            system_prompt: String::new(),
            skills: Vec::new(),
            instructions: Vec::new(),
            tags: Vec::new(),
        }
    }
}

impl From<Agent> for NewAgent {
    fn from(agent: Agent) -> Self {
        Self {
            name: agent.name,
            description: agent.description,
            avatar_emoji: agent.avatar_emoji,
            personality: agent.personality,
            system_prompt: agent.system_prompt,
            skills: agent.skills,
            instructions: agent.instructions,
            tags: agent.tags,
        }
    }
}
