//! Prompt Forge Types - Core records shared by every Prompt Forge crate
//!
//! Agents, skills and instructions are independent top-level records. An agent
//! refers to its skills and instructions by id only; nothing here owns anything
//! else, so deleting a skill can never corrupt an agent.

pub mod agent;
pub mod bundle;
pub mod error;
pub mod instruction;
pub mod settings;
pub mod skill;

pub use agent::{Agent, AgentSummary, NewAgent, Personality};
pub use bundle::{ExportBundle, BUNDLE_VERSION};
pub use error::{ForgeError, ForgeResult, ParseError, RecordKind};
pub use instruction::{
    clamp_priority, Instruction, InstructionCategory, NewInstruction, DEFAULT_PRIORITY,
    MAX_PRIORITY, MIN_PRIORITY,
};
pub use settings::{Settings, Theme, ThemeMode};
pub use skill::{NewSkill, Skill, SkillDefinition, SkillSummary, SkillType, ToolParameter, WorkflowStep};

/// Generate a fresh opaque record id
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
