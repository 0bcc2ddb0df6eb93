//! Prompt Forge Persistence - SQLite-backed store for agents, skills,
//! instructions and the settings singleton
//!
//! Every public operation is atomic on its own. `import_all` is the only
//! multi-table write and runs inside a single transaction.

mod error;
mod rows;
mod seed;
mod store;

pub use error::{Result, StoreError};
pub use seed::{default_agent, default_instructions, default_skills};
pub use store::Store;

use chrono::{DateTime, Utc};
use promptforge_types::{
    new_id, Agent, ExportBundle, Instruction, NewAgent, NewInstruction, NewSkill, RecordKind,
    Settings, Skill, BUNDLE_VERSION,
};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::{Executor, Sqlite, SqlitePool};
use std::path::Path;
use tracing::{debug, info};

use rows::{
    agent_from_row, instruction_from_row, settings_from_row, skill_from_row, AGENT_COLUMNS,
    INSTRUCTION_COLUMNS, SETTINGS_COLUMNS, SKILL_COLUMNS,
};

const MIGRATIONS: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS agents (
        id TEXT PRIMARY KEY,
        name TEXT NOT NULL,
        description TEXT NOT NULL DEFAULT '',
        avatar_emoji TEXT NOT NULL DEFAULT '',
        personality_json TEXT NOT NULL,
        system_prompt TEXT NOT NULL DEFAULT '',
        skills_json TEXT NOT NULL DEFAULT '[]',
        instructions_json TEXT NOT NULL DEFAULT '[]',
        tags_json TEXT NOT NULL DEFAULT '[]',
        usage_count INTEGER NOT NULL DEFAULT 0,
        last_used_at TEXT,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS skills (
        id TEXT PRIMARY KEY,
        name TEXT NOT NULL,
        description TEXT NOT NULL DEFAULT '',
        icon_emoji TEXT NOT NULL DEFAULT '',
        skill_type TEXT NOT NULL,
        definition_json TEXT NOT NULL,
        enabled INTEGER NOT NULL DEFAULT 1,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS instructions (
        id TEXT PRIMARY KEY,
        name TEXT NOT NULL,
        description TEXT NOT NULL DEFAULT '',
        icon_emoji TEXT NOT NULL DEFAULT '',
        category TEXT NOT NULL,
        content TEXT NOT NULL DEFAULT '',
        priority INTEGER NOT NULL DEFAULT 5,
        tags_json TEXT NOT NULL DEFAULT '[]',
        enabled INTEGER NOT NULL DEFAULT 1,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS settings (
        id INTEGER PRIMARY KEY CHECK (id = 1),
        theme_mode TEXT NOT NULL,
        theme_accent_color TEXT NOT NULL,
        theme_emotional_ui INTEGER NOT NULL,
        mcp_server_port INTEGER NOT NULL,
        mcp_server_enabled INTEGER NOT NULL,
        auto_start_mcp INTEGER NOT NULL,
        data_directory TEXT
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_agents_usage ON agents(usage_count DESC, name)",
    "CREATE INDEX IF NOT EXISTS idx_instructions_category ON instructions(category)",
];

/// Persistence service for storing records in SQLite
#[derive(Clone)]
pub struct PersistenceService {
    pool: SqlitePool,
}

impl PersistenceService {
    /// Open (creating if needed) the database at `database_path` and migrate it
    pub async fn new(database_path: impl AsRef<Path>) -> Result<Self> {
        let database_path = database_path.as_ref();
        let options = SqliteConnectOptions::new()
            .filename(database_path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal);

        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(options)
            .await?;

        let service = Self { pool };
        service.run_migrations().await?;

        info!(
            "Persistence service initialized with database: {}",
            database_path.display()
        );
        Ok(service)
    }

    /// Run database migrations
    async fn run_migrations(&self) -> Result<()> {
        for statement in MIGRATIONS {
            sqlx::query(statement).execute(&self.pool).await?;
        }

        debug!("Database migrations completed");
        Ok(())
    }

    /// True when no agents, skills or instructions exist yet (first run)
    pub async fn is_empty(&self) -> Result<bool> {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT (SELECT COUNT(*) FROM agents) + (SELECT COUNT(*) FROM skills) \
             + (SELECT COUNT(*) FROM instructions)",
        )
        .fetch_one(&self.pool)
        .await?;
        Ok(count == 0)
    }

    // ========================================================================
    // Agent Operations
    // ========================================================================

    /// All agents, most used first
    pub async fn list_agents(&self) -> Result<Vec<Agent>> {
        fetch_agents(&self.pool).await
    }

    pub async fn get_agent(&self, id: &str) -> Result<Option<Agent>> {
        let sql = format!("SELECT {AGENT_COLUMNS} FROM agents WHERE id = ?");
        let row = sqlx::query(&sql).bind(id).fetch_optional(&self.pool).await?;
        row.as_ref().map(agent_from_row).transpose()
    }

    pub async fn create_agent(&self, input: NewAgent) -> Result<Agent> {
        let agent = Agent::new(new_id(), input, Utc::now());
        agent.validate().map_err(StoreError::Invalid)?;
        insert_agent(&self.pool, &agent).await?;
        debug!(agent_id = %agent.id, "Created agent");
        Ok(agent)
    }

    /// Update the editable fields of an agent
    ///
    /// `usage_count` and `last_used_at` are left untouched: they only move
    /// through [`PersistenceService::record_agent_usage`], so a stale copy held
    /// by an editor can never roll an increment back.
    pub async fn update_agent(&self, agent: &Agent) -> Result<Agent> {
        agent.validate().map_err(StoreError::Invalid)?;

        let result = sqlx::query(
            r#"
            UPDATE agents SET name = ?, description = ?, avatar_emoji = ?, personality_json = ?,
                system_prompt = ?, skills_json = ?, instructions_json = ?, tags_json = ?,
                updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&agent.name)
        .bind(&agent.description)
        .bind(&agent.avatar_emoji)
        .bind(serde_json::to_string(&agent.personality.clone().clamped())?)
        .bind(&agent.system_prompt)
        .bind(serde_json::to_string(&agent.skills)?)
        .bind(serde_json::to_string(&agent.instructions)?)
        .bind(serde_json::to_string(&agent.tags)?)
        .bind(Utc::now().to_rfc3339())
        .bind(&agent.id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found(RecordKind::Agent, &agent.id));
        }

        self.get_agent(&agent.id)
            .await?
            .ok_or_else(|| StoreError::not_found(RecordKind::Agent, &agent.id))
    }

    pub async fn delete_agent(&self, id: &str) -> Result<()> {
        delete_row("agents", RecordKind::Agent, &self.pool, id).await
    }

    /// Atomically increment the usage counter and stamp `last_used_at`
    ///
    /// Returns the updated agent, or `None` when no agent has this id.
    pub async fn record_agent_usage(&self, id: &str, at: DateTime<Utc>) -> Result<Option<Agent>> {
        let sql = format!(
            "UPDATE agents SET usage_count = usage_count + 1, last_used_at = ? \
             WHERE id = ? RETURNING {AGENT_COLUMNS}"
        );
        let row = sqlx::query(&sql)
            .bind(at.to_rfc3339())
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(agent_from_row).transpose()
    }

    // ========================================================================
    // Skill Operations
    // ========================================================================

    /// All skills in creation order
    pub async fn list_skills(&self) -> Result<Vec<Skill>> {
        fetch_skills(&self.pool).await
    }

    pub async fn get_skill(&self, id: &str) -> Result<Option<Skill>> {
        let sql = format!("SELECT {SKILL_COLUMNS} FROM skills WHERE id = ?");
        let row = sqlx::query(&sql).bind(id).fetch_optional(&self.pool).await?;
        row.as_ref().map(skill_from_row).transpose()
    }

    pub async fn create_skill(&self, input: NewSkill) -> Result<Skill> {
        let skill = Skill::new(new_id(), input, Utc::now());
        skill.validate().map_err(StoreError::Invalid)?;
        insert_skill(&self.pool, &skill).await?;
        debug!(skill_id = %skill.id, "Created skill");
        Ok(skill)
    }

    pub async fn update_skill(&self, skill: &Skill) -> Result<Skill> {
        skill.validate().map_err(StoreError::Invalid)?;

        let result = sqlx::query(
            r#"
            UPDATE skills SET name = ?, description = ?, icon_emoji = ?, skill_type = ?,
                definition_json = ?, enabled = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&skill.name)
        .bind(&skill.description)
        .bind(&skill.icon_emoji)
        .bind(skill.skill_type.as_str())
        .bind(serde_json::to_string(&skill.definition)?)
        .bind(skill.enabled)
        .bind(Utc::now().to_rfc3339())
        .bind(&skill.id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found(RecordKind::Skill, &skill.id));
        }

        self.get_skill(&skill.id)
            .await?
            .ok_or_else(|| StoreError::not_found(RecordKind::Skill, &skill.id))
    }

    /// Delete a skill; agents referencing it keep a dangling id
    pub async fn delete_skill(&self, id: &str) -> Result<()> {
        delete_row("skills", RecordKind::Skill, &self.pool, id).await
    }

    // ========================================================================
    // Instruction Operations
    // ========================================================================

    /// All instructions in creation order
    pub async fn list_instructions(&self) -> Result<Vec<Instruction>> {
        fetch_instructions(&self.pool).await
    }

    pub async fn get_instruction(&self, id: &str) -> Result<Option<Instruction>> {
        let sql = format!("SELECT {INSTRUCTION_COLUMNS} FROM instructions WHERE id = ?");
        let row = sqlx::query(&sql).bind(id).fetch_optional(&self.pool).await?;
        row.as_ref().map(instruction_from_row).transpose()
    }

    pub async fn create_instruction(&self, input: NewInstruction) -> Result<Instruction> {
        let instruction = Instruction::new(new_id(), input, Utc::now());
        instruction.validate().map_err(StoreError::Invalid)?;
        insert_instruction(&self.pool, &instruction).await?;
        debug!(instruction_id = %instruction.id, "Created instruction");
        Ok(instruction)
    }

    pub async fn update_instruction(&self, instruction: &Instruction) -> Result<Instruction> {
        instruction.validate().map_err(StoreError::Invalid)?;

        let result = sqlx::query(
            r#"
            UPDATE instructions SET name = ?, description = ?, icon_emoji = ?, category = ?,
                content = ?, priority = ?, tags_json = ?, enabled = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&instruction.name)
        .bind(&instruction.description)
        .bind(&instruction.icon_emoji)
        .bind(instruction.category.as_str())
        .bind(&instruction.content)
        .bind(i64::from(promptforge_types::clamp_priority(i64::from(
            instruction.priority,
        ))))
        .bind(serde_json::to_string(&instruction.tags)?)
        .bind(instruction.enabled)
        .bind(Utc::now().to_rfc3339())
        .bind(&instruction.id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found(RecordKind::Instruction, &instruction.id));
        }

        self.get_instruction(&instruction.id)
            .await?
            .ok_or_else(|| StoreError::not_found(RecordKind::Instruction, &instruction.id))
    }

    /// Delete an instruction; agents referencing it keep a dangling id
    pub async fn delete_instruction(&self, id: &str) -> Result<()> {
        delete_row("instructions", RecordKind::Instruction, &self.pool, id).await
    }

    // ========================================================================
    // Settings Operations
    // ========================================================================

    /// The settings singleton; defaults until first saved
    pub async fn get_settings(&self) -> Result<Settings> {
        fetch_settings(&self.pool).await
    }

    pub async fn save_settings(&self, settings: &Settings) -> Result<Settings> {
        write_settings(&self.pool, settings).await?;
        Ok(settings.clone())
    }

    // ========================================================================
    // Export/Import Operations
    // ========================================================================

    /// Consistent snapshot of the whole store
    pub async fn export_all(&self) -> Result<ExportBundle> {
        let mut tx = self.pool.begin().await?;
        let agents = fetch_agents(&mut *tx).await?;
        let skills = fetch_skills(&mut *tx).await?;
        let instructions = fetch_instructions(&mut *tx).await?;
        let settings = fetch_settings(&mut *tx).await?;
        tx.commit().await?;

        Ok(ExportBundle {
            agents,
            skills,
            instructions,
            settings,
            exported_at: Utc::now(),
            version: BUNDLE_VERSION.to_string(),
        })
    }

    /// Replace all four collections with the bundle contents, all or nothing
    pub async fn import_all(&self, bundle: &ExportBundle) -> Result<()> {
        validate_bundle(bundle)?;

        let mut tx = self.pool.begin().await?;

        for table in ["agents", "skills", "instructions"] {
            sqlx::query(&format!("DELETE FROM {table}"))
                .execute(&mut *tx)
                .await?;
        }

        for agent in &bundle.agents {
            insert_agent(&mut *tx, agent).await?;
        }
        for skill in &bundle.skills {
            insert_skill(&mut *tx, skill).await?;
        }
        for instruction in &bundle.instructions {
            insert_instruction(&mut *tx, instruction).await?;
        }
        write_settings(&mut *tx, &bundle.settings).await?;

        tx.commit().await?;

        info!(
            "Imported {} agents, {} skills, {} instructions",
            bundle.agents.len(),
            bundle.skills.len(),
            bundle.instructions.len()
        );
        Ok(())
    }
}

fn validate_bundle(bundle: &ExportBundle) -> Result<()> {
    let major = bundle.version.split('.').next().unwrap_or_default();
    if major != "1" {
        return Err(StoreError::Invalid(promptforge_types::ForgeError::validation(
            "version",
            format!("unsupported bundle version '{}'", bundle.version),
        )));
    }

    for agent in &bundle.agents {
        agent.validate().map_err(StoreError::Invalid)?;
    }
    for skill in &bundle.skills {
        skill.validate().map_err(StoreError::Invalid)?;
    }
    for instruction in &bundle.instructions {
        instruction.validate().map_err(StoreError::Invalid)?;
    }
    Ok(())
}

// ============================================================================
// Executor-generic helpers (shared by pool calls and transactions)
// ============================================================================

async fn fetch_agents<'e, E>(executor: E) -> Result<Vec<Agent>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let sql = format!("SELECT {AGENT_COLUMNS} FROM agents ORDER BY usage_count DESC, name ASC");
    let rows = sqlx::query(&sql).fetch_all(executor).await?;
    rows.iter().map(agent_from_row).collect()
}

async fn fetch_skills<'e, E>(executor: E) -> Result<Vec<Skill>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let sql = format!("SELECT {SKILL_COLUMNS} FROM skills ORDER BY created_at ASC, id ASC");
    let rows = sqlx::query(&sql).fetch_all(executor).await?;
    rows.iter().map(skill_from_row).collect()
}

async fn fetch_instructions<'e, E>(executor: E) -> Result<Vec<Instruction>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let sql = format!(
        "SELECT {INSTRUCTION_COLUMNS} FROM instructions ORDER BY created_at ASC, id ASC"
    );
    let rows = sqlx::query(&sql).fetch_all(executor).await?;
    rows.iter().map(instruction_from_row).collect()
}

async fn fetch_settings<'e, E>(executor: E) -> Result<Settings>
where
    E: Executor<'e, Database = Sqlite>,
{
    let sql = format!("SELECT {SETTINGS_COLUMNS} FROM settings WHERE id = 1");
    let row = sqlx::query(&sql).fetch_optional(executor).await?;
    match row {
        Some(row) => settings_from_row(&row),
        None => Ok(Settings::default()),
    }
}

async fn write_settings<'e, E>(executor: E, settings: &Settings) -> Result<()>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query(
        r#"
        INSERT OR REPLACE INTO settings (id, theme_mode, theme_accent_color, theme_emotional_ui,
            mcp_server_port, mcp_server_enabled, auto_start_mcp, data_directory)
        VALUES (1, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(settings.theme.mode.as_str())
    .bind(&settings.theme.accent_color)
    .bind(settings.theme.emotional_ui)
    .bind(i64::from(settings.mcp_server_port))
    .bind(settings.mcp_server_enabled)
    .bind(settings.auto_start_mcp)
    .bind(&settings.data_directory)
    .execute(executor)
    .await?;
    Ok(())
}

async fn insert_agent<'e, E>(executor: E, agent: &Agent) -> Result<()>
where
    E: Executor<'e, Database = Sqlite>,
{
    let usage_count = i64::try_from(agent.usage_count).unwrap_or(i64::MAX);

    sqlx::query(
        r#"
        INSERT INTO agents (id, name, description, avatar_emoji, personality_json, system_prompt,
            skills_json, instructions_json, tags_json, usage_count, last_used_at, created_at,
            updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&agent.id)
    .bind(&agent.name)
    .bind(&agent.description)
    .bind(&agent.avatar_emoji)
    .bind(serde_json::to_string(&agent.personality)?)
    .bind(&agent.system_prompt)
    .bind(serde_json::to_string(&agent.skills)?)
    .bind(serde_json::to_string(&agent.instructions)?)
    .bind(serde_json::to_string(&agent.tags)?)
    .bind(usage_count)
    .bind(agent.last_used_at.map(|dt| dt.to_rfc3339()))
    .bind(agent.created_at.to_rfc3339())
    .bind(agent.updated_at.to_rfc3339())
    .execute(executor)
    .await?;
    Ok(())
}

async fn insert_skill<'e, E>(executor: E, skill: &Skill) -> Result<()>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query(
        r#"
        INSERT INTO skills (id, name, description, icon_emoji, skill_type, definition_json,
            enabled, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&skill.id)
    .bind(&skill.name)
    .bind(&skill.description)
    .bind(&skill.icon_emoji)
    .bind(skill.skill_type.as_str())
    .bind(serde_json::to_string(&skill.definition)?)
    .bind(skill.enabled)
    .bind(skill.created_at.to_rfc3339())
    .bind(skill.updated_at.to_rfc3339())
    .execute(executor)
    .await?;
    Ok(())
}

async fn insert_instruction<'e, E>(executor: E, instruction: &Instruction) -> Result<()>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query(
        r#"
        INSERT INTO instructions (id, name, description, icon_emoji, category, content, priority,
            tags_json, enabled, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&instruction.id)
    .bind(&instruction.name)
    .bind(&instruction.description)
    .bind(&instruction.icon_emoji)
    .bind(instruction.category.as_str())
    .bind(&instruction.content)
    .bind(i64::from(promptforge_types::clamp_priority(i64::from(
        instruction.priority,
    ))))
    .bind(serde_json::to_string(&instruction.tags)?)
    .bind(instruction.enabled)
    .bind(instruction.created_at.to_rfc3339())
    .bind(instruction.updated_at.to_rfc3339())
    .execute(executor)
    .await?;
    Ok(())
}

async fn delete_row<'e, E>(table: &str, kind: RecordKind, executor: E, id: &str) -> Result<()>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query(&format!("DELETE FROM {table} WHERE id = ?"))
        .bind(id)
        .execute(executor)
        .await?;

    if result.rows_affected() == 0 {
        return Err(StoreError::not_found(kind, id));
    }
    debug!(%kind, id, "Deleted record");
    Ok(())
}
