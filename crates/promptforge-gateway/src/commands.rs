//! Management commands: import/export through the codec and the store

use anyhow::{Context, Result};
use promptforge_codec::{
    parse_agent, parse_instruction, parse_skill, serialize_agent, serialize_instruction,
    serialize_skill,
};
use promptforge_persistence::PersistenceService;
use promptforge_types::{Agent, ExportBundle, ForgeError, Instruction, RecordKind, Skill};
use std::fs;
use std::path::Path;
use tracing::info;

fn read_file(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

pub async fn import_agent(store: &PersistenceService, path: &Path) -> Result<Agent> {
    let input = parse_agent(&read_file(path)?)
        .with_context(|| format!("Failed to parse agent from {}", path.display()))?;
    let agent = store.create_agent(input).await?;
    info!(id = %agent.id, "Imported agent '{}'", agent.name);
    Ok(agent)
}

pub async fn export_agent(store: &PersistenceService, id: &str) -> Result<String> {
    let agent = store
        .get_agent(id)
        .await?
        .ok_or_else(|| ForgeError::not_found(RecordKind::Agent, id))?;
    Ok(serialize_agent(&agent))
}

pub async fn import_instruction(store: &PersistenceService, path: &Path) -> Result<Instruction> {
    let input = parse_instruction(&read_file(path)?)
        .with_context(|| format!("Failed to parse instruction from {}", path.display()))?;
    let instruction = store.create_instruction(input).await?;
    info!(id = %instruction.id, "Imported instruction '{}'", instruction.name);
    Ok(instruction)
}

pub async fn export_instruction(store: &PersistenceService, id: &str) -> Result<String> {
    let instruction = store
        .get_instruction(id)
        .await?
        .ok_or_else(|| ForgeError::not_found(RecordKind::Instruction, id))?;
    Ok(serialize_instruction(&instruction))
}

pub async fn import_skill(store: &PersistenceService, path: &Path) -> Result<Skill> {
    let input = parse_skill(&read_file(path)?)
        .with_context(|| format!("Failed to parse skill from {}", path.display()))?;
    let skill = store.create_skill(input).await?;
    info!(id = %skill.id, "Imported skill '{}'", skill.name);
    Ok(skill)
}

pub async fn export_skill(store: &PersistenceService, id: &str) -> Result<String> {
    let skill = store
        .get_skill(id)
        .await?
        .ok_or_else(|| ForgeError::not_found(RecordKind::Skill, id))?;
    Ok(serialize_skill(&skill)?)
}

/// Full bundle as pretty JSON
pub async fn export_all(store: &PersistenceService) -> Result<String> {
    let bundle = store.export_all().await?;
    serde_json::to_string_pretty(&bundle).context("Failed to encode export bundle")
}

/// Replace everything with the bundle at `path`
pub async fn import_all(store: &PersistenceService, path: &Path) -> Result<ExportBundle> {
    let bundle: ExportBundle = serde_json::from_str(&read_file(path)?)
        .with_context(|| format!("{} is not an export bundle", path.display()))?;
    store.import_all(&bundle).await?;
    info!(
        agents = bundle.agents.len(),
        skills = bundle.skills.len(),
        instructions = bundle.instructions.len(),
        "Imported bundle"
    );
    Ok(bundle)
}

/// One-screen summary of the store
pub async fn status(store: &PersistenceService, database: &Path) -> Result<String> {
    let agents = store.list_agents().await?;
    let skills = store.list_skills().await?;
    let instructions = store.list_instructions().await?;
    let enabled = instructions.iter().filter(|i| i.enabled).count();

    let mut out = format!(
        "Database: {}\nAgents: {}\nSkills: {}\nInstructions: {} ({} enabled)\n",
        database.display(),
        agents.len(),
        skills.len(),
        instructions.len(),
        enabled
    );
    for agent in &agents {
        out.push_str(&format!(
            "  {} {} [{}] used {} times\n",
            agent.avatar_emoji, agent.name, agent.id, agent.usage_count
        ));
    }
    Ok(out)
}
