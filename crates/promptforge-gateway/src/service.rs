use crate::config::{database_in, Config};
use anyhow::{Context, Result};
use promptforge_mcp::{McpServer, ServerInfo};
use promptforge_persistence::PersistenceService;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info, warn};

/// Gateway service - wires configuration, store and server together
pub struct GatewayService {
    config: Config,
    database: PathBuf,
    explicit_database: bool,
}

impl GatewayService {
    /// Create a gateway; `db_path` from the command line wins over the config file
    pub fn new(config: Config, db_path: Option<PathBuf>) -> Self {
        let explicit_database = db_path.is_some();
        let database = db_path.unwrap_or_else(|| config.database_path());
        Self {
            config,
            database,
            explicit_database,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    fn server_info(&self) -> ServerInfo {
        ServerInfo {
            name: self.config.mcp.server_name.clone(),
            protocol_version: self.config.mcp.protocol_version.clone(),
            ..ServerInfo::default()
        }
    }

    /// Protocol-server-only mode: serve stdin/stdout until EOF or Ctrl+C
    pub async fn run_mcp(self) -> Result<()> {
        info!("Starting Prompt Forge MCP server");
        let store = open_store(&self.database).await?;

        let server = McpServer::new(Arc::new(store), self.server_info());
        let status = server.start(tokio::io::stdin(), tokio::io::stdout()).await;
        info!(
            tools = status.available_tools.len(),
            "MCP server listening on stdio"
        );

        let shutdown = async {
            if let Err(e) = signal::ctrl_c().await {
                error!("Failed to install Ctrl+C handler: {}", e);
                std::future::pending::<()>().await;
            }
            info!("Received shutdown signal");
        };

        tokio::select! {
            () = server.stopped() => {
                let status = server.stop().await;
                info!(served = status.served_requests, "Client disconnected");
            }
            () = shutdown => {
                info!("Shutting down gracefully...");
                let status = server.stop().await;
                info!(served = status.served_requests, "MCP server stopped");
                // The blocking stdin reader cannot be joined until another line arrives
                std::process::exit(0);
            }
        }

        Ok(())
    }

    /// Management mode: open the store, seed it on first run and apply a data-directory move
    pub async fn open_management_store(&self) -> Result<(PersistenceService, PathBuf)> {
        let store = open_store(&self.database).await?;
        if store.seed_defaults_if_empty().await? {
            info!("First run: default data created");
        }

        if self.explicit_database {
            return Ok((store, self.database.clone()));
        }

        let settings = store.get_settings().await?;
        let Some(dir) = settings.data_directory.filter(|d| !d.trim().is_empty()) else {
            return Ok((store, self.database.clone()));
        };

        let relocated = database_in(dir.trim());
        if relocated == self.database {
            return Ok((store, relocated));
        }

        let fresh = !relocated.exists();
        let target = open_store(&relocated).await?;
        if fresh {
            // Carry the current data over on the first start after the move
            let bundle = store.export_all().await?;
            target.import_all(&bundle).await?;
            info!(
                from = %self.database.display(),
                to = %relocated.display(),
                "Moved data to the configured data directory"
            );
        } else if target.seed_defaults_if_empty().await? {
            warn!("Configured data directory held an empty database; seeded defaults");
        }

        Ok((target, relocated))
    }
}

async fn open_store(path: &Path) -> Result<PersistenceService> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    PersistenceService::new(path)
        .await
        .with_context(|| format!("Failed to open database {}", path.display()))
}
