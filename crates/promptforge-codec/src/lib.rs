//! Prompt Forge Codec - text import/export for records
//!
//! Agents and instructions use Markdown with an optional `---` preamble of
//! `key: value` lines. Parsing yields the `New*` create input: record ids and
//! timestamps are not part of the text format.
//!
//! Round trip: `parse_x(&serialize_x(&r))` reproduces every field the format
//! carries.

mod agent;
mod instruction;
mod preamble;
mod skill;

pub use agent::{parse_agent, serialize_agent};
pub use instruction::{parse_instruction, serialize_instruction};
pub use skill::{parse_skill, serialize_skill};
