use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::PathBuf;

/// Default config template created when no config exists
const DEFAULT_CONFIG: &str = r#"
[database]
path = ""  # Empty: platform data dir. Set via PROMPTFORGE_DB_PATH env var

[logging]
level = "info"  # trace, debug, info, warn, error
format = "pretty"  # pretty or json

[mcp]
server_name = "prompt-forge"
protocol_version = "2024-11-05"
"#;

const APP_DIR: &str = "com.promptforge.app";
const DATABASE_FILE: &str = "promptforge.db";

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct DatabaseConfig {
    #[serde(default)]
    pub path: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_level")]
    pub level: String,
    #[serde(default = "default_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            format: default_format(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct McpConfig {
    #[serde(default = "default_server_name")]
    pub server_name: String,
    #[serde(default = "default_protocol_version")]
    pub protocol_version: String,
}

impl Default for McpConfig {
    fn default() -> Self {
        Self {
            server_name: default_server_name(),
            protocol_version: default_protocol_version(),
        }
    }
}

fn default_level() -> String {
    "info".to_string()
}

fn default_format() -> String {
    "pretty".to_string()
}

fn default_server_name() -> String {
    "prompt-forge".to_string()
}

fn default_protocol_version() -> String {
    "2024-11-05".to_string()
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub mcp: McpConfig,
}

impl Config {
    /// Get the global config path: ~/.promptforge/promptforge.toml
    fn global_config_path() -> anyhow::Result<PathBuf> {
        let home = dirs::home_dir().context("Could not find home directory")?;
        Ok(home.join(".promptforge").join("promptforge.toml"))
    }

    /// Ensure global config directory and file exist, creating defaults if needed
    fn ensure_global_config() -> anyhow::Result<PathBuf> {
        let config_path = Self::global_config_path()?;
        if let Some(config_dir) = config_path.parent() {
            if !config_dir.exists() {
                fs::create_dir_all(config_dir)?;
                eprintln!("Created config directory: {}", config_dir.display());
            }
        }

        if !config_path.exists() {
            fs::write(&config_path, DEFAULT_CONFIG.trim())?;
            eprintln!("Created default config: {}", config_path.display());
        }

        Ok(config_path)
    }

    /// Load configuration with layered approach:
    /// 1. Global config: ~/.promptforge/promptforge.toml (auto-created if missing)
    /// 2. Local override: ./promptforge.toml (optional)
    /// 3. Environment variables (highest priority)
    pub fn load() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let global_config_path = Self::ensure_global_config()?;

        let mut config_builder = config::Config::builder()
            .add_source(config::File::from(global_config_path))
            .add_source(config::File::with_name("promptforge").required(false))
            .add_source(config::Environment::with_prefix("PROMPTFORGE").separator("__"));

        // Convenience env var overrides
        if let Ok(path) = env::var("PROMPTFORGE_DB_PATH") {
            config_builder = config_builder.set_override("database.path", path)?;
        }

        if let Ok(level) = env::var("PROMPTFORGE_LOG_LEVEL") {
            config_builder = config_builder.set_override("logging.level", level)?;
        }

        let config: Self = config_builder
            .build()?
            .try_deserialize()
            .context("Invalid configuration")?;
        Ok(config)
    }

    /// Database file to open; an empty `[database] path` means the platform default
    pub fn database_path(&self) -> PathBuf {
        if self.database.path.trim().is_empty() {
            default_database_path()
        } else {
            PathBuf::from(self.database.path.trim())
        }
    }

    /// Render the effective configuration
    pub fn to_toml(&self) -> anyhow::Result<String> {
        toml::to_string_pretty(self).context("Failed to render configuration")
    }
}

/// `<data_local_dir>/com.promptforge.app/promptforge.db`
pub fn default_database_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
        .join(DATABASE_FILE)
}

/// Database file inside a relocated data directory
pub fn database_in(dir: &str) -> PathBuf {
    PathBuf::from(dir).join(DATABASE_FILE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_template_parses() {
        let config: Config = toml::from_str(DEFAULT_CONFIG).unwrap();
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.format, "pretty");
        assert_eq!(config.mcp.server_name, "prompt-forge");
        assert_eq!(config.mcp.protocol_version, "2024-11-05");
        assert!(config.database.path.is_empty());
    }

    #[test]
    fn test_missing_sections_use_defaults() {
        let config: Config = toml::from_str("[logging]\nlevel = \"debug\"\n").unwrap();
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.format, "pretty");
        assert_eq!(config.mcp.server_name, "prompt-forge");
    }

    #[test]
    fn test_empty_path_falls_back_to_data_dir() {
        let config = Config::default();
        let path = config.database_path();
        assert!(path.ends_with(PathBuf::from(APP_DIR).join(DATABASE_FILE)));

        let config: Config = toml::from_str("[database]\npath = \"/tmp/forge.db\"\n").unwrap();
        assert_eq!(config.database_path(), PathBuf::from("/tmp/forge.db"));
    }

    #[test]
    fn test_later_layers_override_earlier() {
        let config: Config = config::Config::builder()
            .add_source(config::File::from_str(DEFAULT_CONFIG, config::FileFormat::Toml))
            .add_source(config::File::from_str(
                "[logging]\nformat = \"json\"\n",
                config::FileFormat::Toml,
            ))
            .set_override("database.path", "/data/forge.db")
            .unwrap()
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(config.logging.format, "json");
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.database_path(), PathBuf::from("/data/forge.db"));
    }

    #[test]
    fn test_effective_config_renders_as_toml() {
        let rendered = Config::default().to_toml().unwrap();
        let reparsed: Config = toml::from_str(&rendered).unwrap();
        assert_eq!(reparsed.mcp.server_name, "prompt-forge");
    }
}
