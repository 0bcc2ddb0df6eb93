use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{ForgeError, ForgeResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkillType {
    Prompt,   // A prompt template
    Tool,     // A tool definition (MCP-compatible)
    Workflow, // A multi-step workflow
}

impl SkillType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SkillType::Prompt => "prompt",
            SkillType::Tool => "tool",
            SkillType::Workflow => "workflow",
        }
    }
}

impl fmt::Display for SkillType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SkillType {
    type Err = ForgeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "prompt" => Ok(SkillType::Prompt),
            "tool" => Ok(SkillType::Tool),
            "workflow" => Ok(SkillType::Workflow),
            other => Err(ForgeError::validation(
                "skill_type",
                format!("unknown skill type '{other}'"),
            )),
        }
    }
}

/// What a skill actually carries, keyed by its type tag
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SkillDefinition {
    Prompt {
        template: String,
    },
    Tool {
        parameters: Vec<ToolParameter>,
        handler: String, // Script or command to execute
    },
    Workflow {
        steps: Vec<WorkflowStep>,
    },
}

impl SkillDefinition {
    pub fn skill_type(&self) -> SkillType {
        match self {
            SkillDefinition::Prompt { .. } => SkillType::Prompt,
            SkillDefinition::Tool { .. } => SkillType::Tool,
            SkillDefinition::Workflow { .. } => SkillType::Workflow,
        }
    }

    pub fn prompt(template: impl Into<String>) -> Self {
        SkillDefinition::Prompt {
            template: template.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolParameter {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub param_type: String, // "string", "number", "boolean", "array", "object"
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub default: Option<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowStep {
    pub id: String,
    pub name: String,
    pub action: String,
    #[serde(default)]
    pub inputs: serde_json::Value,
    #[serde(default)]
    pub outputs: Vec<String>,
}

/// A reusable unit of capability an agent can reference
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Skill {
    pub id: String,
    pub name: String,
    pub description: String,
    pub icon_emoji: String,
    pub skill_type: SkillType,
    pub definition: SkillDefinition,
    pub enabled: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Minimal projection returned by `list_skills`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillSummary {
    pub id: String,
    pub name: String,
    pub description: String,
    pub skill_type: SkillType,
    pub enabled: bool,
}

impl Skill {
    pub fn new(id: String, input: NewSkill, now: DateTime<Utc>) -> Self {
        Self {
            id,
            name: input.name,
            description: input.description,
            icon_emoji: input.icon_emoji,
            skill_type: input.skill_type,
            definition: input.definition,
            enabled: input.enabled,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn summary(&self) -> SkillSummary {
        SkillSummary {
            id: self.id.clone(),
            name: self.name.clone(),
            description: self.description.clone(),
            skill_type: self.skill_type,
            enabled: self.enabled,
        }
    }

    /// The definition's tag must agree with `skill_type`
    pub fn validate(&self) -> ForgeResult<()> {
        if self.name.trim().is_empty() {
            return Err(ForgeError::validation("name", "skill name cannot be empty"));
        }
        let defined = self.definition.skill_type();
        if defined != self.skill_type {
            return Err(ForgeError::validation(
                "definition",
                format!(
                    "definition type '{}' does not match skill_type '{}'",
                    defined, self.skill_type
                ),
            ));
        }
        Ok(())
    }
}

/// Input for creating a new skill (no id, no timestamps)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewSkill {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_icon")]
    pub icon_emoji: String,
    pub skill_type: SkillType,
    pub definition: SkillDefinition,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_icon() -> String {
    "⚡".to_string()
}

fn default_enabled() -> bool {
    true
}

impl NewSkill {
    /// A prompt-template skill; the common case
    pub fn prompt(name: impl Into<String>, template: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            icon_emoji: default_icon(),
            skill_type: SkillType::Prompt,
            definition: SkillDefinition::prompt(template),
            enabled: true,
        }
    }
}

impl From<Skill> for NewSkill {
    fn from(skill: Skill) -> Self {
        Self {
            name: skill.name,
            description: skill.description,
            icon_emoji: skill.icon_emoji,
            skill_type: skill.skill_type,
            definition: skill.definition,
            enabled: skill.enabled,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_definition_tag_serialization() {
        let def = SkillDefinition::prompt("Be concise.");
        let json = serde_json::to_value(&def).unwrap();
        assert_eq!(json["type"], "prompt");
        assert_eq!(json["template"], "Be concise.");
    }

    #[test]
    fn test_validate_type_mismatch() {
        let mut input = NewSkill::prompt("Mismatch", "x");
        input.skill_type = SkillType::Tool;
        let skill = Skill::new("s1".into(), input, Utc::now());
        match skill.validate() {
            Err(ForgeError::Validation { field, .. }) => assert_eq!(field, "definition"),
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_validate_matching_tool() {
        let input = NewSkill {
            name: "Lint".into(),
            description: String::new(),
            icon_emoji: "x".into(),
            skill_type: SkillType::Tool,
            definition: SkillDefinition::Tool {
                parameters: vec![],
                handler: "cargo clippy".into(),
            },
            enabled: true,
        };
        let skill = Skill::new("s1".into(), input, Utc::now());
        assert!(skill.validate().is_ok());
    }

    #[test]
    fn test_skill_type_from_str() {
        assert_eq!("Workflow".parse::<SkillType>().unwrap(), SkillType::Workflow);
        assert!("macro".parse::<SkillType>().is_err());
    }
}
