use async_trait::async_trait;
use chrono::{DateTime, Utc};
use promptforge_types::{Agent, Instruction, Skill};

use crate::error::Result;
use crate::PersistenceService;

/// Read side plus the usage write, as needed by the protocol server
///
/// Kept as a trait so servers can be tested against stores that fail on
/// demand.
#[async_trait]
pub trait Store: Send + Sync {
    async fn list_agents(&self) -> Result<Vec<Agent>>;

    async fn get_agent(&self, id: &str) -> Result<Option<Agent>>;

    async fn list_skills(&self) -> Result<Vec<Skill>>;

    async fn list_instructions(&self) -> Result<Vec<Instruction>>;

    /// Atomic increment; `None` when the agent does not exist
    async fn record_agent_usage(&self, id: &str, at: DateTime<Utc>) -> Result<Option<Agent>>;
}

#[async_trait]
impl Store for PersistenceService {
    async fn list_agents(&self) -> Result<Vec<Agent>> {
        PersistenceService::list_agents(self).await
    }

    async fn get_agent(&self, id: &str) -> Result<Option<Agent>> {
        PersistenceService::get_agent(self, id).await
    }

    async fn list_skills(&self) -> Result<Vec<Skill>> {
        PersistenceService::list_skills(self).await
    }

    async fn list_instructions(&self) -> Result<Vec<Instruction>> {
        PersistenceService::list_instructions(self).await
    }

    async fn record_agent_usage(&self, id: &str, at: DateTime<Utc>) -> Result<Option<Agent>> {
        PersistenceService::record_agent_usage(self, id, at).await
    }
}
