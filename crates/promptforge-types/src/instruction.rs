use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{ForgeError, ForgeResult};

pub const MIN_PRIORITY: u8 = 1;
pub const MAX_PRIORITY: u8 = 10;
pub const DEFAULT_PRIORITY: u8 = 5;

/// Clamp any integer into the valid priority range [1, 10]
pub fn clamp_priority(value: i64) -> u8 {
    // The clamp keeps the value inside u8 range, so the cast is lossless.
    value.clamp(i64::from(MIN_PRIORITY), i64::from(MAX_PRIORITY)) as u8
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstructionCategory {
    General,
    CodeStyle,
    Communication,
    Workflow,
    Security,
    Testing,
    Documentation,
    Custom,
}

impl InstructionCategory {
    pub const ALL: [InstructionCategory; 8] = [
        InstructionCategory::General,
        InstructionCategory::CodeStyle,
        InstructionCategory::Communication,
        InstructionCategory::Workflow,
        InstructionCategory::Security,
        InstructionCategory::Testing,
        InstructionCategory::Documentation,
        InstructionCategory::Custom,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            InstructionCategory::General => "general",
            InstructionCategory::CodeStyle => "code_style",
            InstructionCategory::Communication => "communication",
            InstructionCategory::Workflow => "workflow",
            InstructionCategory::Security => "security",
            InstructionCategory::Testing => "testing",
            InstructionCategory::Documentation => "documentation",
            InstructionCategory::Custom => "custom",
        }
    }
}

impl Default for InstructionCategory {
    fn default() -> Self {
        InstructionCategory::General
    }
}

impl fmt::Display for InstructionCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InstructionCategory {
    type Err = ForgeError;

    /// Case-insensitive; `code-style` and `codestyle` are accepted spellings
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace('-', "_");
        match normalized.as_str() {
            "codestyle" => Ok(InstructionCategory::CodeStyle),
            other => InstructionCategory::ALL
                .into_iter()
                .find(|c| c.as_str() == other)
                .ok_or_else(|| {
                    ForgeError::validation("category", format!("unknown category '{}'", s.trim()))
                }),
        }
    }
}

/// A standalone guideline document with a priority and a category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instruction {
    pub id: String,
    pub name: String,
    pub description: String,
    pub icon_emoji: String,
    pub category: InstructionCategory,
    pub content: String,
    pub priority: u8, // 1-10, higher = more important
    pub tags: Vec<String>,
    pub enabled: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Instruction {
    pub fn new(id: String, input: NewInstruction, now: DateTime<Utc>) -> Self {
        Self {
            id,
            name: input.name,
            description: input.description,
            icon_emoji: input.icon_emoji,
            category: input.category,
            content: input.content,
            priority: clamp_priority(i64::from(input.priority)),
            tags: input.tags,
            enabled: input.enabled,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn validate(&self) -> ForgeResult<()> {
        if self.name.trim().is_empty() {
            return Err(ForgeError::validation(
                "name",
                "instruction name cannot be empty",
            ));
        }
        Ok(())
    }
}

/// Input for creating a new instruction (no id, no timestamps)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewInstruction {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_icon")]
    pub icon_emoji: String,
    #[serde(default)]
    pub category: InstructionCategory,
    #[serde(default)]
    pub content: String,
    #[serde(default = "default_priority")]
    pub priority: u8,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_icon() -> String {
    "📋".to_string()
}

fn default_priority() -> u8 {
    DEFAULT_PRIORITY
}

fn default_enabled() -> bool {
    true
}

impl Default for NewInstruction {
    fn default() -> Self {
        Self {
            name: "New Instruction".to_string(),
            description: String::new(),
            icon_emoji: default_icon(),
            category: InstructionCategory::General,
            content: String::new(),
            priority: DEFAULT_PRIORITY,
            tags: Vec::new(),
            enabled: true,
        }
    }
}

impl From<Instruction> for NewInstruction {
    fn from(instruction: Instruction) -> Self {
        Self {
            name: instruction.name,
            description: instruction.description,
            icon_emoji: instruction.icon_emoji,
            category: instruction.category,
            content: instruction.content,
            priority: instruction.priority,
            tags: instruction.tags,
            enabled: instruction.enabled,
        }
    }
}
