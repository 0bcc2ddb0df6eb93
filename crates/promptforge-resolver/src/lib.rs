//! Prompt Forge Resolver
//!
//! Pure functions over raw record collections:
//! - `resolve_applied_agent` assembles an agent with its live skills and instructions
//! - `resolve_instructions` filters and priority-orders instructions
//! - `find_skill` looks a skill up by id, then by name
//! - `render_prompt` / `render_instructions` flatten the results into Markdown
//!
//! Nothing here touches storage; the usage side effect of applying an agent is
//! the caller's job.

mod apply;
mod instructions;
mod render;
mod skills;

pub use apply::{resolve_applied_agent, AppliedAgent};
pub use instructions::resolve_instructions;
pub use render::{render_instructions, render_prompt, SECTION_DELIMITER};
pub use skills::find_skill;
