//! Markdown rendering of resolved agents and instruction lists
//!
//! Layout of [`render_prompt`], each section separated by [`SECTION_DELIMITER`]:
//!
//! ```text
//! ## System Prompt
//! **Tone:** <tone> | **Verbosity:** <verbosity>
//! **Traits:** <traits>      (omitted when there are none)
//! <system prompt>
//! ---
//! ## Skill: <name>          (one per resolved skill, agent order)
//! <template | tool descriptor | workflow steps>
//! ---
//! ## Instruction: <name>    (one per resolved instruction, agent order)
//! <content>
//! ```

use promptforge_types::{
    Instruction, Personality, Skill, SkillDefinition, ToolParameter, WorkflowStep,
};

use crate::AppliedAgent;

/// Separator placed between rendered sections
pub const SECTION_DELIMITER: &str = "\n\n---\n\n";

/// Flatten an applied agent into one prompt string
pub fn render_prompt(applied: &AppliedAgent) -> String {
    let mut sections = Vec::with_capacity(
        1 + applied.resolved_skills.len() + applied.resolved_instructions.len(),
    );

    sections.push(format!(
        "## System Prompt\n\n{}{}",
        render_personality(&applied.agent.personality),
        applied.agent.system_prompt.trim()
    ));
    sections.extend(applied.resolved_skills.iter().map(render_skill));
    sections.extend(
        applied
            .resolved_instructions
            .iter()
            .map(|i| format!("## Instruction: {}\n\n{}", i.name, i.content.trim())),
    );

    sections.join(SECTION_DELIMITER)
}

fn render_personality(personality: &Personality) -> String {
    let mut out = format!(
        "**Tone:** {} | **Verbosity:** {}\n\n",
        personality.tone, personality.verbosity
    );
    if !personality.traits.is_empty() {
        out.push_str(&format!("**Traits:** {}\n\n", personality.traits.join(", ")));
    }
    out
}

fn render_skill(skill: &Skill) -> String {
    let body = match &skill.definition {
        SkillDefinition::Prompt { template } => template.trim().to_string(),
        SkillDefinition::Tool {
            parameters,
            handler,
        } => render_tool(handler, parameters),
        SkillDefinition::Workflow { steps } => render_workflow(steps),
    };
    format!("## Skill: {}\n\n{}", skill.name, body)
}

fn render_tool(handler: &str, parameters: &[ToolParameter]) -> String {
    let mut out = format!("Tool handler: `{handler}`");
    if parameters.is_empty() {
        return out;
    }

    out.push_str("\n\nParameters:");
    for param in parameters {
        let required = if param.required { ", required" } else { "" };
        out.push_str(&format!(
            "\n- `{}` ({}{})",
            param.name, param.param_type, required
        ));
        if !param.description.is_empty() {
            out.push_str(&format!(": {}", param.description));
        }
    }
    out
}

fn render_workflow(steps: &[WorkflowStep]) -> String {
    if steps.is_empty() {
        return "Workflow with no steps".to_string();
    }

    let mut out = String::from("Workflow steps:");
    for (n, step) in steps.iter().enumerate() {
        out.push_str(&format!("\n{}. {}", n + 1, step.name));
    }
    out
}

/// Markdown digest of an already resolved instruction list
pub fn render_instructions(instructions: &[Instruction]) -> String {
    if instructions.is_empty() {
        return "# Instructions\n\nNo enabled instructions.".to_string();
    }

    let mut out = String::from("# Instructions");
    for instruction in instructions {
        out.push_str(&format!(
            "\n\n## {} (priority {}, {})\n\n{}",
            instruction.name,
            instruction.priority,
            instruction.category,
            instruction.content.trim()
        ));
    }
    out
}
