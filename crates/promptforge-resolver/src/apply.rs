use promptforge_types::{Agent, ForgeError, ForgeResult, Instruction, RecordKind, Skill};
use serde::Serialize;
use std::collections::HashMap;
use tracing::debug;

/// An agent with its skill and instruction references substituted in
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AppliedAgent {
    pub agent: Agent,
    pub resolved_skills: Vec<Skill>,
    pub resolved_instructions: Vec<Instruction>,
}

/// Resolve `agent_id` against the three collections
///
/// Skill and instruction ids that no longer exist are skipped, as are
/// disabled skills and instructions. The agent's own ordering is kept for both lists.
pub fn resolve_applied_agent(
    agent_id: &str,
    all_agents: &[Agent],
    all_skills: &[Skill],
    all_instructions: &[Instruction],
) -> ForgeResult<AppliedAgent> {
    let agent = all_agents
        .iter()
        .find(|a| a.id == agent_id)
        .ok_or_else(|| ForgeError::not_found(RecordKind::Agent, agent_id))?;

    let skills_by_id: HashMap<&str, &Skill> =
        all_skills.iter().map(|s| (s.id.as_str(), s)).collect();
    let instructions_by_id: HashMap<&str, &Instruction> = all_instructions
        .iter()
        .map(|i| (i.id.as_str(), i))
        .collect();

    let resolved_skills: Vec<Skill> = agent
        .skills
        .iter()
        .filter_map(|id| {
            let found = skills_by_id.get(id.as_str());
            if found.is_none() {
                debug!(agent_id, skill_id = %id, "Skipping dangling skill reference");
            }
            found.map(|s| (*s).clone())
        })
        .filter(|s| s.enabled)
        .collect();

    let resolved_instructions: Vec<Instruction> = agent
        .instructions
        .iter()
        .filter_map(|id| instructions_by_id.get(id.as_str()))
        .filter(|i| i.enabled)
        .map(|i| (*i).clone())
        .collect();

    Ok(AppliedAgent {
        agent: agent.clone(),
        resolved_skills,
        resolved_instructions,
    })
}
