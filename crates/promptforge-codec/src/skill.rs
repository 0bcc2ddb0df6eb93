//! Skill import/export
//!
//! Skills carry structured definitions (tool parameters, workflow steps), so
//! their canonical text form is YAML. JSON is accepted too, and a plain
//! Markdown document is read as a prompt skill whose template is the whole text.

use promptforge_types::{
    ForgeError, ForgeResult, NewSkill, ParseError, Skill, SkillDefinition, SkillType,
};
use tracing::debug;

use crate::preamble::first_title;

/// Parse a skill from YAML, JSON or Markdown, in that order
pub fn parse_skill(text: &str) -> ForgeResult<NewSkill> {
    let skill = match serde_yaml::from_str::<NewSkill>(text) {
        Ok(skill) => skill,
        Err(yaml_err) => match serde_json::from_str::<NewSkill>(text) {
            Ok(skill) => skill,
            Err(json_err) => {
                debug!(%yaml_err, %json_err, "Skill is not structured, reading as Markdown");
                parse_markdown_skill(text)?
            }
        },
    };

    validate(&skill)?;
    Ok(skill)
}

/// YAML form of a skill, without id or timestamps
pub fn serialize_skill(skill: &Skill) -> ForgeResult<String> {
    serde_yaml::to_string(&NewSkill::from(skill.clone()))
        .map_err(|e| ForgeError::Parse(ParseError::Malformed(e.to_string())))
}

fn parse_markdown_skill(text: &str) -> Result<NewSkill, ParseError> {
    let name = first_title(text).ok_or(ParseError::MissingName)?;
    let mut skill = NewSkill::prompt(name, text.trim());

    for line in text.lines() {
        let line = line.trim();
        if let Some(description) = labelled(line, "Description") {
            skill.description = description.to_string();
        } else if let Some(kind) = labelled(line, "Type") {
            let kind: SkillType = kind.parse().map_err(|_| ParseError::InvalidValue {
                key: "type".to_string(),
                value: kind.to_string(),
            })?;
            if kind != SkillType::Prompt {
                // Markdown has no room for parameters or steps
                return Err(ParseError::InvalidValue {
                    key: "type".to_string(),
                    value: kind.to_string(),
                });
            }
        }
    }

    Ok(skill)
}

/// `Label: value` or `**Label:** value`
fn labelled<'a>(line: &'a str, label: &str) -> Option<&'a str> {
    let rest = line
        .strip_prefix("**")
        .and_then(|l| l.strip_prefix(label))
        .and_then(|l| l.strip_prefix(":**"))
        .or_else(|| line.strip_prefix(label).and_then(|l| l.strip_prefix(':')))?;
    Some(rest.trim())
}

fn validate(skill: &NewSkill) -> ForgeResult<()> {
    if skill.name.trim().is_empty() {
        return Err(ForgeError::validation("name", "skill name cannot be empty"));
    }
    let defined = skill.definition.skill_type();
    if defined != skill.skill_type {
        return Err(ForgeError::validation(
            "definition",
            format!(
                "definition type '{}' does not match skill_type '{}'",
                defined, skill.skill_type
            ),
        ));
    }
    if let SkillDefinition::Tool { handler, .. } = &skill.definition {
        if handler.trim().is_empty() {
            return Err(ForgeError::validation("handler", "tool handler cannot be empty"));
        }
    }
    Ok(())
}
