//! Agent documents
//!
//! ```text
//! ---
//! name: Code Assistant
//! description: Writes clean code
//! tags:
//!   - "code"
//!   - "review"
//! ---
//!
//! # Code Assistant
//!
//! ## Personality
//!
//! tone: professional
//! verbosity: concise
//! creativity: 0.3
//! formality: 0.7
//! - analytical
//!
//! ## System Prompt
//!
//! You are a senior software engineer.
//! ```
//!
//! Everything after `## System Prompt` is taken verbatim, so the prompt
//! itself may contain `##` headings. Multi-line descriptions are written to
//! the preamble as a `description: |` block; a `## Description` section is
//! still read from hand-written documents.

use promptforge_types::{Agent, ForgeResult, NewAgent, ParseError, Personality};
use tracing::debug;

use crate::preamble::{
    field, first_title, list_field, single_line, split_preamble, trim_blank_lines, trim_body,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Preface,
    Description,
    Personality,
    Other,
}

fn classify(heading: &str) -> Option<Section> {
    match heading.trim().to_lowercase().as_str() {
        "description" | "about" | "overview" => Some(Section::Description),
        "personality" | "character" | "traits" => Some(Section::Personality),
        "system prompt" | "prompt" | "system" | "instructions" => None,
        _ => Some(Section::Other),
    }
}

/// Parse an agent document into a create input
pub fn parse_agent(text: &str) -> ForgeResult<NewAgent> {
    let doc = split_preamble(text)?;
    let mut agent = NewAgent::default();

    let mut title: Option<String> = None;
    let mut description: Vec<&str> = Vec::new();
    let mut personality: Option<Vec<&str>> = None;
    let mut unclaimed: Vec<String> = Vec::new();
    let mut system_prompt: Option<String> = None;

    let mut section = Section::Preface;
    let mut rest = doc.body;
    while !rest.is_empty() {
        let (line, tail) = match rest.find('\n') {
            Some(at) => (&rest[..at], &rest[at + 1..]),
            None => (rest, ""),
        };
        let line = line.strip_suffix('\r').unwrap_or(line);
        rest = tail;

        if let Some(heading) = line.strip_prefix("## ") {
            match classify(heading) {
                Some(next) => {
                    section = next;
                    if next == Section::Personality {
                        personality.get_or_insert_with(Vec::new);
                    }
                    if next == Section::Other {
                        unclaimed.push(line.to_string());
                    }
                }
                None => {
                    system_prompt = Some(trim_body(tail).to_string());
                    break;
                }
            }
            continue;
        }

        if title.is_none() && section == Section::Preface {
            if let Some(t) = line.strip_prefix("# ") {
                title = Some(t.trim().to_string());
                continue;
            }
        }

        match section {
            Section::Description => description.push(line),
            Section::Personality => {
                if let Some(lines) = personality.as_mut() {
                    lines.push(line);
                }
            }
            Section::Preface | Section::Other => unclaimed.push(line.to_string()),
        }
    }

    let name = doc
        .get("name")
        .filter(|n| !n.trim().is_empty())
        .map(str::to_string)
        .or(title)
        .or_else(|| first_title(doc.body).map(str::to_string))
        .ok_or(ParseError::MissingName)?;
    agent.name = name;

    agent.description = match doc.get("description") {
        Some(d) if !d.is_empty() => d.to_string(),
        _ => trim_blank_lines(&description.join("\n")).to_string(),
    };
    if let Some(tags) = doc.list("tags") {
        agent.tags = tags;
    }
    if let Some(avatar) = doc.get("avatar").or_else(|| doc.get("emoji")) {
        agent.avatar_emoji = avatar.to_string();
    }
    if let Some(lines) = personality {
        agent.personality = parse_personality(&lines)?;
    }
    let unclaimed = unclaimed.join("\n");
    agent.system_prompt = match system_prompt {
        Some(prompt) => {
            if !unclaimed.trim().is_empty() {
                debug!(
                    ignored = unclaimed.trim(),
                    "Text outside known sections ignored in favour of the system prompt"
                );
            }
            prompt
        }
        None => trim_blank_lines(&unclaimed).to_string(),
    };

    Ok(agent)
}

/// `key: value` dials and `- trait` bullets; a present section starts with no traits
fn parse_personality(lines: &[&str]) -> Result<Personality, ParseError> {
    let mut personality = Personality {
        traits: Vec::new(),
        ..Personality::default()
    };

    for line in lines {
        let line = line.trim();
        if let Some(item) = line.strip_prefix("- ").or_else(|| line.strip_prefix("* ")) {
            let item = item.trim();
            if !item.is_empty() {
                personality.traits.push(item.to_string());
            }
            continue;
        }

        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let key = key.trim().to_lowercase();
        let value = value.trim();
        match key.as_str() {
            "tone" => personality.tone = value.to_string(),
            "verbosity" => personality.verbosity = value.to_string(),
            "creativity" => personality.creativity = parse_dial(&key, value)?,
            "formality" => personality.formality = parse_dial(&key, value)?,
            _ => {}
        }
    }

    Ok(personality.clamped())
}

fn parse_dial(key: &str, value: &str) -> Result<f32, ParseError> {
    value.parse::<f32>().map_err(|_| ParseError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    })
}

/// Render an agent in the format read by [`parse_agent`]
pub fn serialize_agent(agent: &Agent) -> String {
    let mut out = String::from("---\n");
    out.push_str(&field("name", &agent.name));
    if !agent.description.is_empty() {
        out.push_str(&field("description", &agent.description));
    }
    if !agent.tags.is_empty() {
        out.push_str(&list_field("tags", &agent.tags));
    }
    out.push_str("---\n\n");

    out.push_str(&format!("# {}\n\n", single_line(agent.name.trim())));

    let p = &agent.personality;
    out.push_str("## Personality\n\n");
    out.push_str(&format!("tone: {}\n", p.tone));
    out.push_str(&format!("verbosity: {}\n", p.verbosity));
    out.push_str(&format!("creativity: {}\n", p.creativity));
    out.push_str(&format!("formality: {}\n", p.formality));
    for t in &p.traits {
        out.push_str(&format!("- {t}\n"));
    }

    out.push_str("\n## System Prompt\n\n");
    out.push_str(agent.system_prompt.trim_end());
    out.push('\n');
    out
}
