//! Row decoding for the four record tables

use chrono::{DateTime, Utc};
use promptforge_types::{
    Agent, Instruction, InstructionCategory, Settings, Skill, SkillType, Theme, ThemeMode,
};
use serde::de::DeserializeOwned;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use crate::error::{Result, StoreError};

pub(crate) const AGENT_COLUMNS: &str = "id, name, description, avatar_emoji, personality_json, \
     system_prompt, skills_json, instructions_json, tags_json, usage_count, last_used_at, \
     created_at, updated_at";

pub(crate) const SKILL_COLUMNS: &str = "id, name, description, icon_emoji, skill_type, \
     definition_json, enabled, created_at, updated_at";

pub(crate) const INSTRUCTION_COLUMNS: &str = "id, name, description, icon_emoji, category, \
     content, priority, tags_json, enabled, created_at, updated_at";

pub(crate) const SETTINGS_COLUMNS: &str = "theme_mode, theme_accent_color, theme_emotional_ui, \
     mcp_server_port, mcp_server_enabled, auto_start_mcp, data_directory";

fn json_column<T: DeserializeOwned>(row: &SqliteRow, column: &str) -> Result<T> {
    let raw: String = row.try_get(column)?;
    Ok(serde_json::from_str(&raw)?)
}

fn parse_timestamp(column: &str, raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| StoreError::corrupt(column, e))
}

fn timestamp_column(row: &SqliteRow, column: &str) -> Result<DateTime<Utc>> {
    let raw: String = row.try_get(column)?;
    parse_timestamp(column, &raw)
}

pub(crate) fn agent_from_row(row: &SqliteRow) -> Result<Agent> {
    let usage_count: i64 = row.try_get("usage_count")?;
    let last_used_at = row
        .try_get::<Option<String>, _>("last_used_at")?
        .map(|raw| parse_timestamp("last_used_at", &raw))
        .transpose()?;

    Ok(Agent {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        avatar_emoji: row.try_get("avatar_emoji")?,
        personality: json_column(row, "personality_json")?,
        system_prompt: row.try_get("system_prompt")?,
        skills: json_column(row, "skills_json")?,
        instructions: json_column(row, "instructions_json")?,
        tags: json_column(row, "tags_json")?,
        usage_count: u64::try_from(usage_count)
            .map_err(|e| StoreError::corrupt("usage_count", e))?,
        last_used_at,
        created_at: timestamp_column(row, "created_at")?,
        updated_at: timestamp_column(row, "updated_at")?,
    })
}

pub(crate) fn skill_from_row(row: &SqliteRow) -> Result<Skill> {
    let skill_type: String = row.try_get("skill_type")?;
    let skill_type: SkillType = skill_type
        .parse()
        .map_err(|e| StoreError::corrupt("skill_type", e))?;

    Ok(Skill {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        icon_emoji: row.try_get("icon_emoji")?,
        skill_type,
        definition: json_column(row, "definition_json")?,
        enabled: row.try_get("enabled")?,
        created_at: timestamp_column(row, "created_at")?,
        updated_at: timestamp_column(row, "updated_at")?,
    })
}

pub(crate) fn instruction_from_row(row: &SqliteRow) -> Result<Instruction> {
    let category: String = row.try_get("category")?;
    let category: InstructionCategory = category
        .parse()
        .map_err(|e| StoreError::corrupt("category", e))?;
    let priority: i64 = row.try_get("priority")?;

    Ok(Instruction {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        icon_emoji: row.try_get("icon_emoji")?,
        category,
        content: row.try_get("content")?,
        priority: u8::try_from(priority).map_err(|e| StoreError::corrupt("priority", e))?,
        tags: json_column(row, "tags_json")?,
        enabled: row.try_get("enabled")?,
        created_at: timestamp_column(row, "created_at")?,
        updated_at: timestamp_column(row, "updated_at")?,
    })
}

pub(crate) fn settings_from_row(row: &SqliteRow) -> Result<Settings> {
    let mode: String = row.try_get("theme_mode")?;
    let mode: ThemeMode = mode
        .parse()
        .map_err(|e| StoreError::corrupt("theme_mode", e))?;
    let port: i64 = row.try_get("mcp_server_port")?;

    Ok(Settings {
        theme: Theme {
            mode,
            accent_color: row.try_get("theme_accent_color")?,
            emotional_ui: row.try_get("theme_emotional_ui")?,
        },
        mcp_server_port: u16::try_from(port)
            .map_err(|e| StoreError::corrupt("mcp_server_port", e))?,
        mcp_server_enabled: row.try_get("mcp_server_enabled")?,
        auto_start_mcp: row.try_get("auto_start_mcp")?,
        data_directory: row.try_get("data_directory")?,
    })
}
