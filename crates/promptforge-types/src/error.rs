//! Error taxonomy shared by the resolver, codec, persistence and protocol layers

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// The four record kinds held by the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    Agent,
    Skill,
    Instruction,
    Settings,
}

impl RecordKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordKind::Agent => "agent",
            RecordKind::Skill => "skill",
            RecordKind::Instruction => "instruction",
            RecordKind::Settings => "settings",
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failures while reading the Markdown import format
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("no name found: add a `name:` preamble key or a `# Title` heading")]
    MissingName,

    #[error("preamble opened with `---` is never closed")]
    UnterminatedPreamble,

    #[error("invalid value for `{key}`: '{value}'")]
    InvalidValue { key: String, value: String },

    #[error("malformed document: {0}")]
    Malformed(String),
}

/// Top-level error type for Prompt Forge operations
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ForgeError {
    #[error("{kind} not found: '{key}'")]
    NotFound { kind: RecordKind, key: String },

    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("storage error: {0}")]
    Storage(String),
}

impl ForgeError {
    pub fn not_found(kind: RecordKind, key: impl Into<String>) -> Self {
        ForgeError::NotFound {
            kind,
            key: key.into(),
        }
    }

    pub fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ForgeError::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Stable machine-readable kind, part of the protocol surface
    pub fn kind(&self) -> &'static str {
        match self {
            ForgeError::NotFound { .. } => "not_found",
            ForgeError::Validation { .. } => "validation_error",
            ForgeError::Parse(_) => "parse_error",
            ForgeError::Storage(_) => "storage_error",
        }
    }
}

/// Convenient Result type alias
pub type ForgeResult<T> = std::result::Result<T, ForgeError>;
