//! `---` delimited `key: value` preamble shared by every text format
//!
//! Lists are written one `- "item"` line per entry under an empty `key:`;
//! multi-line values as `key: |` followed by lines indented two spaces.

use promptforge_types::ParseError;
use regex::Regex;
use std::iter::Peekable;

const BLOCK_MARKER: &str = "|";
const BLOCK_INDENT: &str = "  ";

/// A preamble value
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum FieldValue {
    Text(String),
    List(Vec<String>),
}

/// A document split into its preamble fields and the remaining body
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Document<'a> {
    /// `None` when the text has no preamble block at all
    pub fields: Option<Vec<(String, FieldValue)>>,
    pub body: &'a str,
}

impl Document<'_> {
    fn field(&self, key: &str) -> Option<&FieldValue> {
        self.fields
            .as_ref()?
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    /// Text value of the last occurrence of `key` (keys are stored lowercased)
    pub fn get(&self, key: &str) -> Option<&str> {
        match self.field(key)? {
            FieldValue::Text(text) => Some(text.as_str()),
            FieldValue::List(_) => None,
        }
    }

    /// List value of `key`; a plain text value is read as a comma-separated list
    pub fn list(&self, key: &str) -> Option<Vec<String>> {
        match self.field(key)? {
            FieldValue::Text(text) => Some(split_list(text)),
            FieldValue::List(items) => Some(items.clone()),
        }
    }

    #[cfg(test)]
    pub fn has_preamble(&self) -> bool {
        self.fields.is_some()
    }
}

/// Split `text` into preamble and body
///
/// A preamble exists only when the very first line is exactly `---`; it then
/// runs to the next line that is exactly `---`.
pub(crate) fn split_preamble(text: &str) -> Result<Document<'_>, ParseError> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);

    let first_line = text.lines().next().unwrap_or_default();
    if first_line.trim_end() != "---" {
        return Ok(Document {
            fields: None,
            body: text,
        });
    }

    let preamble_re = Regex::new(r"(?ms)\A---[ \t]*\r?\n(.*?)^---[ \t]*\r?$\n?(.*)\z")
        .map_err(|e| ParseError::Malformed(format!("failed to compile regex: {e}")))?;

    let captures = preamble_re
        .captures(text)
        .ok_or(ParseError::UnterminatedPreamble)?;

    let block = captures.get(1).map(|m| m.as_str()).unwrap_or_default();
    let body = captures.get(2).map(|m| m.as_str()).unwrap_or_default();

    Ok(Document {
        fields: Some(parse_fields(block)),
        body,
    })
}

/// `key: value` lines, `- item` lists and `key: |` blocks; everything else is ignored
fn parse_fields(block: &str) -> Vec<(String, FieldValue)> {
    let mut fields: Vec<(String, FieldValue)> = Vec::new();
    let mut lines = block.lines().peekable();

    while let Some(line) = lines.next() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        if let Some(item) = trimmed.strip_prefix("- ") {
            let item = unquote(item.trim()).to_string();
            if let Some((_, value)) = fields.last_mut() {
                if matches!(value, FieldValue::Text(text) if text.is_empty()) {
                    *value = FieldValue::List(Vec::new());
                }
                if let FieldValue::List(items) = value {
                    items.push(item);
                }
            }
            continue;
        }

        if let Some((key, value)) = trimmed.split_once(':') {
            let key = key.trim().to_lowercase();
            let value = value.trim();
            let value = if value == BLOCK_MARKER {
                take_block(&mut lines)
            } else {
                unquote(value).to_string()
            };
            fields.push((key, FieldValue::Text(value)));
        }
    }

    fields
}

/// Indented lines following `key: |`; blank lines inside the block are kept
fn take_block<'a, I>(lines: &mut Peekable<I>) -> String
where
    I: Iterator<Item = &'a str>,
{
    let mut out: Vec<&str> = Vec::new();
    let mut blank = 0;

    while let Some(&line) = lines.peek() {
        if let Some(text) = line.strip_prefix(BLOCK_INDENT) {
            out.extend(std::iter::repeat("").take(blank));
            blank = 0;
            out.push(text);
        } else if line.trim().is_empty() {
            blank += 1;
        } else {
            break;
        }
        lines.next();
    }

    out.join("\n")
}

fn unquote(value: &str) -> &str {
    if value.len() >= 2 && value.starts_with('"') && value.ends_with('"') {
        &value[1..value.len() - 1]
    } else {
        value
    }
}

/// Inverse of the value handling in [`parse_fields`]
pub(crate) fn quote(value: &str) -> String {
    let value = single_line(value);
    let needs_quotes = value.trim() != value
        || value == BLOCK_MARKER
        || (value.len() >= 2 && value.starts_with('"') && value.ends_with('"'));
    if needs_quotes {
        format!("\"{value}\"")
    } else {
        value
    }
}

/// One preamble entry; multi-line values become an indented block
pub(crate) fn field(key: &str, value: &str) -> String {
    if !value.contains('\n') {
        return format!("{key}: {}\n", quote(value));
    }

    let mut out = format!("{key}: {BLOCK_MARKER}\n");
    for line in value.split('\n') {
        out.push_str(BLOCK_INDENT);
        out.push_str(line);
        out.push('\n');
    }
    out
}

/// A list entry, one quoted item per line
pub(crate) fn list_field(key: &str, items: &[String]) -> String {
    let mut out = format!("{key}:\n");
    for item in items {
        out.push_str(&format!("{BLOCK_INDENT}- \"{}\"\n", single_line(item)));
    }
    out
}

/// Body text after a serialized preamble: one separating line break is
/// dropped, as is trailing whitespace
pub(crate) fn trim_body(body: &str) -> &str {
    let body = body
        .strip_prefix("\r\n")
        .or_else(|| body.strip_prefix('\n'))
        .unwrap_or(body);
    body.trim_end()
}

/// Hand-written text: leading blank lines and trailing whitespace dropped
pub(crate) fn trim_blank_lines(text: &str) -> &str {
    let mut start = 0;
    for line in text.split_inclusive('\n') {
        if !line.trim().is_empty() {
            break;
        }
        start += line.len();
    }
    text[start..].trim_end()
}

/// Preamble values live on one line
pub(crate) fn single_line(value: &str) -> String {
    if !value.contains('\n') {
        return value.to_string();
    }
    value.lines().map(str::trim).collect::<Vec<_>>().join(" ")
}

/// Comma-separated list with empty entries dropped
pub(crate) fn split_list(value: &str) -> Vec<String> {
    let value = value.trim();
    let value = value
        .strip_prefix('[')
        .and_then(|v| v.strip_suffix(']'))
        .unwrap_or(value);

    value
        .split(',')
        .map(|item| unquote(item.trim()).trim().to_string())
        .filter(|item| !item.is_empty())
        .collect()
}

pub(crate) fn parse_bool(key: &str, value: &str) -> Result<bool, ParseError> {
    match value.trim().to_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Ok(true),
        "false" | "no" | "off" | "0" => Ok(false),
        _ => Err(ParseError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
        }),
    }
}

/// Text of the first `# ` heading
pub(crate) fn first_title(body: &str) -> Option<&str> {
    body.lines()
        .find_map(|line| line.strip_prefix("# "))
        .map(str::trim)
        .filter(|title| !title.is_empty())
}
