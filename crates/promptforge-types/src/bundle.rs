use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Agent, Instruction, Settings, Skill};

/// Format version written into every export
pub const BUNDLE_VERSION: &str = "1.0";

/// Whole-store snapshot produced by export and consumed by import
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportBundle {
    pub agents: Vec<Agent>,
    pub skills: Vec<Skill>,
    pub instructions: Vec<Instruction>,
    pub settings: Settings,
    pub exported_at: DateTime<Utc>,
    pub version: String,
}
