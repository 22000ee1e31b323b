//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.graphmirror.toml` files.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Name of the configuration file looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = ".graphmirror.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Chat model settings.
    #[serde(default)]
    pub model: ModelConfig,

    /// Graph store settings.
    #[serde(default)]
    pub graph: GraphConfig,

    /// Directory service settings.
    #[serde(default)]
    pub directory: DirectoryConfig,
}

/// General application settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Default output file path for rendered results.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,

    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,
}

/// Chat model settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Chat completions endpoint for the primary model.
    #[serde(default)]
    pub endpoint: String,

    /// Chat completions endpoint for the alternate model.
    #[serde(default)]
    pub alternate_endpoint: String,

    /// API key sent in the `api-key` header.
    #[serde(default)]
    pub api_key: String,

    /// Temperature for statement generation and refinement.
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Token budget for query generation, validation and refinement.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Token budget for mutation generation and confirmation.
    #[serde(default = "default_action_max_tokens")]
    pub action_max_tokens: u32,

    /// Token budget for history compression.
    #[serde(default = "default_summary_max_tokens")]
    pub summary_max_tokens: u32,

    /// Request timeout in seconds.
    #[serde(default = "default_model_timeout")]
    pub timeout_seconds: u64,

    /// Run the validation pass over generated read statements.
    #[serde(default = "default_true")]
    pub validate_statements: bool,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            alternate_endpoint: String::new(),
            api_key: String::new(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            action_max_tokens: default_action_max_tokens(),
            summary_max_tokens: default_summary_max_tokens(),
            timeout_seconds: default_model_timeout(),
            validate_statements: true,
        }
    }
}

fn default_temperature() -> f32 {
    0.7
}

fn default_max_tokens() -> u32 {
    4000
}

fn default_action_max_tokens() -> u32 {
    2000
}

fn default_summary_max_tokens() -> u32 {
    150
}

fn default_model_timeout() -> u64 {
    30
}

fn default_true() -> bool {
    true
}

/// Graph store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphConfig {
    /// Base HTTP address of the store.
    #[serde(default = "default_graph_uri")]
    pub uri: String,

    /// Database name.
    #[serde(default = "default_database")]
    pub database: String,

    /// Basic-auth user.
    #[serde(default = "default_graph_username")]
    pub username: String,

    /// Basic-auth password.
    #[serde(default)]
    pub password: String,

    /// Per-statement timeout in seconds.
    #[serde(default = "default_statement_timeout")]
    pub statement_timeout_seconds: u64,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            uri: default_graph_uri(),
            database: default_database(),
            username: default_graph_username(),
            password: String::new(),
            statement_timeout_seconds: default_statement_timeout(),
        }
    }
}

impl GraphConfig {
    pub fn statement_timeout(&self) -> Duration {
        Duration::from_secs(self.statement_timeout_seconds)
    }
}

fn default_graph_uri() -> String {
    "http://localhost:7474".to_string()
}

fn default_database() -> String {
    "neo4j".to_string()
}

fn default_graph_username() -> String {
    "neo4j".to_string()
}

fn default_statement_timeout() -> u64 {
    30
}

/// Directory service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectoryConfig {
    /// Base address of the directory management API.
    #[serde(default = "default_directory_url")]
    pub base_url: String,

    /// Per-call timeout in seconds.
    #[serde(default = "default_directory_timeout")]
    pub timeout_seconds: u64,

    /// Mirror graph mutations to the directory.
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            base_url: default_directory_url(),
            timeout_seconds: default_directory_timeout(),
            enabled: true,
        }
    }
}

impl DirectoryConfig {
    /// Base address with a scheme; bare `host:port` values get `http://`.
    pub fn normalized_base_url(&self) -> String {
        let trimmed = self.base_url.trim().trim_end_matches('/');
        if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
            trimmed.to_string()
        } else {
            format!("http://{}", trimmed)
        }
    }
}

fn default_directory_url() -> String {
    "http://localhost:9093".to_string()
}

fn default_directory_timeout() -> u64 {
    10
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        Self::load_from_dir(Path::new("."))
    }

    /// Try to load `.graphmirror.toml` from a directory.
    pub fn load_from_dir(dir: &Path) -> Result<Option<Self>> {
        let config_path = dir.join(CONFIG_FILE_NAME);

        if config_path.exists() {
            Ok(Some(Self::load(&config_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments (and their environment variables) take precedence
    /// over config file settings, but only when explicitly provided.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref endpoint) = args.chat_endpoint {
            self.model.endpoint = endpoint.clone();
        }
        if let Some(ref endpoint) = args.chat_endpoint_alt {
            self.model.alternate_endpoint = endpoint.clone();
        }
        if let Some(ref key) = args.chat_api_key {
            self.model.api_key = key.clone();
        }
        if let Some(temperature) = args.temperature {
            self.model.temperature = temperature;
        }
        if let Some(timeout) = args.timeout {
            self.model.timeout_seconds = timeout;
        }
        if args.no_validate {
            self.model.validate_statements = false;
        }

        if let Some(ref uri) = args.graph_uri {
            self.graph.uri = uri.clone();
        }
        if let Some(ref database) = args.graph_database {
            self.graph.database = database.clone();
        }
        if let Some(ref username) = args.graph_username {
            self.graph.username = username.clone();
        }
        if let Some(ref password) = args.graph_password {
            self.graph.password = password.clone();
        }
        if let Some(timeout) = args.statement_timeout {
            self.graph.statement_timeout_seconds = timeout;
        }

        if let Some(ref base_url) = args.directory_url {
            self.directory.base_url = base_url.clone();
        }
        if args.no_sync {
            self.directory.enabled = false;
        }

        if args.verbose {
            self.general.verbose = true;
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.graph.uri, "http://localhost:7474");
        assert_eq!(config.graph.statement_timeout_seconds, 30);
        assert_eq!(config.directory.timeout_seconds, 10);
        assert_eq!(config.model.summary_max_tokens, 150);
        assert!(config.directory.enabled);
        assert!(config.model.validate_statements);
    }

    #[test]
    fn test_parse_config() {
        let toml_content = r#"
[model]
endpoint = "https://example.openai.azure.com/chat"
temperature = 0.2

[graph]
uri = "http://graph:7474"
database = "azure"

[directory]
base_url = "backend:9093"
enabled = false
"#;

        let config: Config = toml::from_str(toml_content).unwrap();
        assert_eq!(config.model.endpoint, "https://example.openai.azure.com/chat");
        assert_eq!(config.model.temperature, 0.2);
        assert_eq!(config.model.max_tokens, 4000);
        assert_eq!(config.graph.database, "azure");
        assert_eq!(config.graph.username, "neo4j");
        assert!(!config.directory.enabled);
        assert_eq!(config.directory.normalized_base_url(), "http://backend:9093");
    }

    #[test]
    fn test_normalized_base_url_keeps_scheme() {
        let config = DirectoryConfig {
            base_url: "https://directory.internal/".to_string(),
            ..DirectoryConfig::default()
        };
        assert_eq!(config.normalized_base_url(), "https://directory.internal");
    }

    #[test]
    fn test_default_toml_generation() {
        let toml_str = Config::default_toml();
        assert!(toml_str.contains("[general]"));
        assert!(toml_str.contains("[model]"));
        assert!(toml_str.contains("[graph]"));
        assert!(toml_str.contains("[directory]"));

        let reparsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(reparsed.graph.database, "neo4j");
    }

    #[test]
    fn test_load_from_dir() {
        let temp_dir = TempDir::new().unwrap();
        assert!(Config::load_from_dir(temp_dir.path()).unwrap().is_none());

        std::fs::write(
            temp_dir.path().join(CONFIG_FILE_NAME),
            "[graph]\nstatement_timeout_seconds = 5\n",
        )
        .unwrap();

        let config = Config::load_from_dir(temp_dir.path()).unwrap().unwrap();
        assert_eq!(config.graph.statement_timeout(), Duration::from_secs(5));
    }

    #[test]
    fn test_load_rejects_invalid_toml() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "[graph\nuri = ").unwrap();
        assert!(Config::load(&path).is_err());
    }
}
