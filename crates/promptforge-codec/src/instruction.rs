//! Instruction documents
//!
//! ```text
//! ---
//! name: Code Style Guidelines
//! category: code_style
//! priority: 7
//! tags:
//!   - "code"
//!   - "style"
//! ---
//!
//! <content>
//! ```

use promptforge_types::{
    clamp_priority, ForgeResult, Instruction, InstructionCategory, NewInstruction, ParseError,
    DEFAULT_PRIORITY,
};
use tracing::debug;

use crate::preamble::{
    field, first_title, list_field, parse_bool, split_preamble, trim_blank_lines, trim_body,
};

/// Parse an instruction document into a create input
///
/// Out-of-range priorities are clamped into [1, 10]; an unknown category
/// falls back to `general`.
pub fn parse_instruction(text: &str) -> ForgeResult<NewInstruction> {
    let doc = split_preamble(text)?;
    let mut instruction = NewInstruction::default();

    let preamble_name = doc.get("name").filter(|n| !n.trim().is_empty());
    match preamble_name {
        Some(name) => {
            instruction.name = name.to_string();
            instruction.content = trim_body(doc.body).to_string();
        }
        None => {
            let title = first_title(doc.body).ok_or(ParseError::MissingName)?;
            instruction.name = title.to_string();
            instruction.content = trim_blank_lines(&strip_first_title(doc.body)).to_string();
        }
    }

    if let Some(description) = doc.get("description") {
        instruction.description = description.to_string();
    }
    if let Some(icon) = doc.get("icon").or_else(|| doc.get("emoji")) {
        instruction.icon_emoji = icon.to_string();
    }
    if let Some(category) = doc.get("category") {
        instruction.category = category.parse().unwrap_or_else(|_| {
            debug!(category, "Unknown instruction category, using general");
            InstructionCategory::General
        });
    }
    if let Some(priority) = doc.get("priority") {
        let value: i64 = priority
            .trim()
            .parse()
            .map_err(|_| ParseError::InvalidValue {
                key: "priority".to_string(),
                value: priority.to_string(),
            })?;
        instruction.priority = clamp_priority(value);
    }
    if let Some(tags) = doc.list("tags") {
        instruction.tags = tags;
    }
    if let Some(enabled) = doc.get("enabled") {
        instruction.enabled = parse_bool("enabled", enabled)?;
    }

    Ok(instruction)
}

/// Render an instruction in the format read by [`parse_instruction`]
///
/// Keys holding their default value are left out of the preamble.
pub fn serialize_instruction(instruction: &Instruction) -> String {
    let mut out = String::from("---\n");
    out.push_str(&field("name", &instruction.name));
    if !instruction.description.is_empty() {
        out.push_str(&field("description", &instruction.description));
    }
    if instruction.category != InstructionCategory::General {
        out.push_str(&format!("category: {}\n", instruction.category));
    }
    if instruction.priority != DEFAULT_PRIORITY {
        out.push_str(&format!("priority: {}\n", instruction.priority));
    }
    if !instruction.tags.is_empty() {
        out.push_str(&list_field("tags", &instruction.tags));
    }
    if !instruction.enabled {
        out.push_str("enabled: false\n");
    }
    out.push_str("---\n\n");
    out.push_str(instruction.content.trim_end());
    out.push('\n');
    out
}

fn strip_first_title(body: &str) -> String {
    let mut removed = false;
    body.lines()
        .filter(|line| {
            if !removed && line.starts_with("# ") {
                removed = true;
                return false;
            }
            true
        })
        .collect::<Vec<_>>()
        .join("\n")
}
