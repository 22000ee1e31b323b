//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use crate::models::ModelVariant;
use clap::Parser;
use std::path::PathBuf;

/// GraphMirror - natural-language operations over an Azure AD graph
///
/// Turns a request into graph statements, runs them against the graph
/// store and mirrors membership/role mutations to the directory service.
///
/// Examples:
///   graphmirror "list all users"
///   graphmirror --action "assign user Deepak to the Front Desk group"
///   graphmirror "generate a full report" --output report.md
///   graphmirror "list all groups" --format json --output groups.json
///   graphmirror --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Natural-language request
    #[arg(value_name = "REQUEST", required_unless_present_any = ["init_config", "report"])]
    pub request: Option<String>,

    /// Generate mutations (CREATE/MERGE/SET/DELETE) instead of read queries
    #[arg(short, long)]
    pub action: bool,

    /// Run the full analytical report regardless of the request text
    #[arg(long, conflicts_with = "action")]
    pub report: bool,

    /// Prior conversation history passed to the model
    #[arg(long, value_name = "TEXT")]
    pub history: Option<String>,

    /// Model variant used to generate statements
    #[arg(short, long, default_value = "primary", value_name = "VARIANT")]
    pub model: ModelVariant,

    /// Session identifier attached to progress events (random if omitted)
    #[arg(long, value_name = "ID")]
    pub session_id: Option<String>,

    /// Write the rendered result to this file
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Output format (markdown, json)
    #[arg(long, default_value = "markdown", value_name = "FORMAT")]
    pub format: OutputFormat,

    /// Exit with code 2 if any statement or directory call failed
    #[arg(long)]
    pub strict: bool,

    /// Do not mirror mutations to the directory service
    #[arg(long)]
    pub no_sync: bool,

    /// Skip the validation pass over generated read statements
    #[arg(long)]
    pub no_validate: bool,

    /// Path to configuration file
    ///
    /// If not specified, looks for .graphmirror.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Generate a default .graphmirror.toml configuration file
    #[arg(long)]
    pub init_config: bool,

    // === Endpoint and credential overrides ===
    /// Chat completions endpoint for the primary model
    #[arg(long, value_name = "URL", env = "GRAPHMIRROR_CHAT_ENDPOINT")]
    pub chat_endpoint: Option<String>,

    /// Chat completions endpoint for the alternate model
    #[arg(long, value_name = "URL", env = "GRAPHMIRROR_CHAT_ENDPOINT_ALT")]
    pub chat_endpoint_alt: Option<String>,

    /// API key for the chat endpoints
    #[arg(long, value_name = "KEY", env = "GRAPHMIRROR_CHAT_API_KEY", hide_env_values = true)]
    pub chat_api_key: Option<String>,

    /// Temperature for model responses (0.0 - 2.0)
    #[arg(long)]
    pub temperature: Option<f32>,

    /// Chat request timeout in seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Graph store HTTP address
    #[arg(long, value_name = "URL", env = "GRAPH_URI")]
    pub graph_uri: Option<String>,

    /// Graph database name
    #[arg(long, value_name = "NAME", env = "GRAPH_DATABASE")]
    pub graph_database: Option<String>,

    /// Graph store user
    #[arg(long, value_name = "USER", env = "GRAPH_USERNAME")]
    pub graph_username: Option<String>,

    /// Graph store password
    #[arg(long, value_name = "PASSWORD", env = "GRAPH_PASSWORD", hide_env_values = true)]
    pub graph_password: Option<String>,

    /// Per-statement timeout in seconds
    #[arg(long, value_name = "SECS")]
    pub statement_timeout: Option<u64>,

    /// Directory service base address
    #[arg(long, value_name = "URL", env = "BACKEND_BASE_URL")]
    pub directory_url: Option<String>,
}

/// Output format for rendered results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Markdown format (default)
    #[default]
    Markdown,
    /// JSON format
    Json,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// The request text, empty if absent (should be validated first).
    pub fn request_text(&self) -> &str {
        self.request.as_deref().unwrap_or("")
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        if self.init_config {
            return Ok(());
        }

        if !self.report && self.request_text().trim().is_empty() {
            return Err("Request text must not be empty".to_string());
        }

        if let Some(temperature) = self.temperature {
            if !(0.0..=2.0).contains(&temperature) {
                return Err("Temperature must be between 0.0 and 2.0".to_string());
            }
        }

        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if self.timeout == Some(0) {
            return Err("Timeout must be at least 1 second".to_string());
        }

        if self.statement_timeout == Some(0) {
            return Err("Statement timeout must be at least 1 second".to_string());
        }

        for (name, url) in [
            ("Chat endpoint", &self.chat_endpoint),
            ("Alternate chat endpoint", &self.chat_endpoint_alt),
            ("Graph URI", &self.graph_uri),
        ] {
            if let Some(url) = url {
                if !url.starts_with("http://") && !url.starts_with("https://") {
                    return Err(format!("{} must start with 'http://' or 'https://'", name));
                }
            }
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_args() -> Args {
        Args::parse_from(["graphmirror", "list all users"])
    }

    #[test]
    fn test_defaults() {
        let args = make_args();
        assert_eq!(args.request_text(), "list all users");
        assert_eq!(args.model, ModelVariant::Primary);
        assert_eq!(args.format, OutputFormat::Markdown);
        assert!(!args.action);
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_action_and_variant_flags() {
        let args = Args::parse_from([
            "graphmirror",
            "--action",
            "--model",
            "alternate",
            "add Deepak to Front Desk",
        ]);
        assert!(args.action);
        assert_eq!(args.model, ModelVariant::Alternate);
    }

    #[test]
    fn test_report_conflicts_with_action() {
        let result = Args::try_parse_from(["graphmirror", "--action", "--report", "x"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_init_config_needs_no_request() {
        let args = Args::parse_from(["graphmirror", "--init-config"]);
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_report_needs_no_request() {
        let args = Args::parse_from(["graphmirror", "--report"]);
        assert!(args.report);
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_validation_blank_request() {
        let mut args = make_args();
        args.request = Some("   ".to_string());
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_conflicting_options() {
        let mut args = make_args();
        args.verbose = true;
        args.quiet = true;
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_invalid_graph_uri() {
        let mut args = make_args();
        args.graph_uri = Some("bolt://localhost:7687".to_string());
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_log_level() {
        let mut args = make_args();
        assert_eq!(args.log_level(), tracing::Level::INFO);

        args.verbose = true;
        assert_eq!(args.log_level(), tracing::Level::DEBUG);

        args.verbose = false;
        args.quiet = true;
        assert_eq!(args.log_level(), tracing::Level::ERROR);
    }
}
