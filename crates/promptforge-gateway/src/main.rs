mod commands;
mod config;
mod service;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use config::Config;
use service::GatewayService;
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "promptforge", version, about = "Manage AI agents, skills and instructions")]
struct Cli {
    /// Run only the MCP server on stdin/stdout
    #[arg(short, long)]
    mcp: bool,

    /// Database file, overrides `[database] path`
    #[arg(long, value_name = "PATH", global = true)]
    db_path: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Import an agent from a Markdown file
    ImportAgent { file: PathBuf },
    /// Print an agent as Markdown
    ExportAgent { id: String },
    /// Import an instruction from a Markdown file
    ImportInstruction { file: PathBuf },
    /// Print an instruction as Markdown
    ExportInstruction { id: String },
    /// Import a skill from a YAML, JSON or Markdown file
    ImportSkill { file: PathBuf },
    /// Print a skill as YAML
    ExportSkill { id: String },
    /// Write every record as a JSON bundle
    ExportAll {
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Replace every record with a JSON bundle
    ImportAll { file: PathBuf },
    /// Show what the store holds
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = Config::load()?;
    promptforge_logging::init_logging(&config.logging.level, config.logging.format.parse()?)?;

    let gateway = GatewayService::new(config, cli.db_path);
    if cli.mcp {
        return gateway.run_mcp().await;
    }

    let (store, database) = gateway.open_management_store().await?;
    match cli.command.unwrap_or(Command::Status) {
        Command::ImportAgent { file } => {
            let agent = commands::import_agent(&store, &file).await?;
            println!("Imported agent {} ({})", agent.name, agent.id);
        }
        Command::ExportAgent { id } => print!("{}", commands::export_agent(&store, &id).await?),
        Command::ImportInstruction { file } => {
            let instruction = commands::import_instruction(&store, &file).await?;
            println!("Imported instruction {} ({})", instruction.name, instruction.id);
        }
        Command::ExportInstruction { id } => {
            print!("{}", commands::export_instruction(&store, &id).await?);
        }
        Command::ImportSkill { file } => {
            let skill = commands::import_skill(&store, &file).await?;
            println!("Imported skill {} ({})", skill.name, skill.id);
        }
        Command::ExportSkill { id } => print!("{}", commands::export_skill(&store, &id).await?),
        Command::ExportAll { output } => {
            let bundle = commands::export_all(&store).await?;
            match output {
                Some(path) => {
                    fs::write(&path, bundle)
                        .with_context(|| format!("Failed to write {}", path.display()))?;
                    println!("Exported to {}", path.display());
                }
                None => println!("{bundle}"),
            }
        }
        Command::ImportAll { file } => {
            let bundle = commands::import_all(&store, &file).await?;
            println!(
                "Imported {} agents, {} skills, {} instructions",
                bundle.agents.len(),
                bundle.skills.len(),
                bundle.instructions.len()
            );
        }
        Command::Status => {
            print!("{}", commands::status(&store, &database).await?);
            println!("\n# Effective configuration\n{}", gateway.config().to_toml()?);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mcp_flag_and_db_path() {
        let cli = Cli::parse_from(["promptforge", "-m", "--db-path", "/tmp/x.db"]);
        assert!(cli.mcp);
        assert_eq!(cli.db_path, Some(PathBuf::from("/tmp/x.db")));
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_subcommands_parse() {
        let cli = Cli::parse_from(["promptforge", "export-all", "--output", "out.json"]);
        assert!(!cli.mcp);
        assert!(matches!(
            cli.command,
            Some(Command::ExportAll { output: Some(ref p) }) if p == &PathBuf::from("out.json")
        ));

        let cli = Cli::parse_from(["promptforge", "import-instruction", "style.md"]);
        assert!(matches!(cli.command, Some(Command::ImportInstruction { .. })));
    }

    #[test]
    fn test_cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
