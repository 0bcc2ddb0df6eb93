//! Prompt Forge MCP Server
//!
//! Exposes agents, skills and instructions to a single MCP client over a
//! line-delimited JSON-RPC 2.0 channel (stdio in production).
//!
//! ## Features
//!
//! - Tools: `list_agents`, `get_agent`, `apply_agent`, `list_skills`, `get_skill`, `get_instructions`
//! - Resources: one JSON document per agent plus an instruction digest
//! - Start/stop lifecycle with graceful drain of the in-flight request
//! - Bad requests fail alone; the channel stays open

#![deny(unsafe_code, dead_code, unused_imports, unused_variables, missing_docs)]

pub mod error;
pub mod protocol;
mod resources;
pub mod router;
pub mod server;
pub mod tools;

pub use error::ProtocolError;
pub use protocol::{JsonRpcError, JsonRpcRequest, JsonRpcResponse, ServerInfo};
pub use router::Router;
pub use server::{McpServer, ServerState, ServerStatus};
pub use tools::{ForgeTools, ToolOutcome};
