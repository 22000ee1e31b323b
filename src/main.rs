//! GraphMirror - natural-language operations over an Azure AD graph
//!
//! A CLI tool that turns a request into graph statements, runs them
//! against the graph store, mirrors membership and role mutations to
//! the directory service and summarizes the outcome.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Runtime error (config, statement generation, output, etc.)
//!   2 - With --strict: a statement, directory call or report section failed

mod cli;
mod config;
mod directory;
mod error;
mod graph;
mod llm;
mod models;
mod pipeline;
mod progress;
mod report;

#[cfg(test)]
mod testing;

use anyhow::{Context, Result};
use chrono::Utc;
use cli::{Args, OutputFormat};
use config::{Config, CONFIG_FILE_NAME};
use directory::{DirectoryService, DisabledDirectory, HttpDirectoryClient};
use graph::{GraphStore, HttpGraphStore};
use llm::AzureChatClient;
use models::{BatchRequest, RequestMode, RunMetadata};
use pipeline::{Pipeline, PipelineOutput};
use progress::{spawn_spinner, ProgressSink};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse_args();

    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    if args.init_config {
        return handle_init_config();
    }

    init_logging(&args);

    info!("GraphMirror v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    match run(args).await {
        Ok(exit_code) => {
            std::process::exit(exit_code);
        }
        Err(e) => {
            error!("Request failed: {:#}", e);
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: write a default config file.
fn handle_init_config() -> Result<()> {
    let path = std::path::Path::new(CONFIG_FILE_NAME);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            CONFIG_FILE_NAME
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", CONFIG_FILE_NAME))?;

    println!("✅ Created {} with default settings.", CONFIG_FILE_NAME);
    println!("   Edit it to set the chat endpoints, graph store and directory service.");
    Ok(())
}

fn init_logging(args: &Args) {
    let level = args.log_level();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

/// Build the collaborators, run the request and close the store on every path.
async fn run(args: Args) -> Result<i32> {
    let mut config = load_config(&args)?;
    config.merge_with_args(&args);

    let store = Arc::new(
        HttpGraphStore::new(&config.graph).context("Failed to configure the graph store")?,
    );

    let result = run_with_store(&args, &config, store.clone()).await;
    store.close().await;
    result
}

async fn run_with_store(args: &Args, config: &Config, store: Arc<HttpGraphStore>) -> Result<i32> {
    let start_time = Instant::now();

    let directory: Arc<dyn DirectoryService> = if config.directory.enabled {
        Arc::new(
            HttpDirectoryClient::new(&config.directory)
                .context("Failed to configure the directory client")?,
        )
    } else {
        info!("Directory mirroring disabled");
        Arc::new(DisabledDirectory)
    };
    let model =
        Arc::new(AzureChatClient::new(&config.model).context("Failed to configure the chat client")?);

    let pipeline = Pipeline::new(store, directory, model, config);

    let session_id = args
        .session_id
        .clone()
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
    let mode = if args.action {
        RequestMode::Action
    } else {
        RequestMode::Query
    };
    let request = BatchRequest {
        request: args.request_text().to_string(),
        history: args.history.clone(),
        mode,
        variant: args.model,
        session_id: session_id.clone(),
    };

    if !args.quiet {
        println!("🔎 Request: {}", request.request);
        println!("   Mode: {} | Model: {} | Session: {}", mode, args.model, session_id);
        println!("   Graph: {}", config.graph.uri);
        if config.directory.enabled {
            println!("   Directory: {}", config.directory.normalized_base_url());
        }
        println!();
    }

    let (progress, events) = ProgressSink::channel(session_id.clone());
    let spinner = spawn_spinner(events, args.quiet);

    let output = pipeline.handle(&request, args.report, &progress).await;
    drop(progress);
    if let Err(e) = spinner.await {
        warn!("Progress display ended abnormally: {}", e);
    }
    let output = output?;

    let metadata = RunMetadata {
        request: request.request.clone(),
        session_id,
        generated_at: Utc::now(),
        duration_seconds: start_time.elapsed().as_secs_f64(),
    };

    let rendered = match (&output, args.format) {
        (PipelineOutput::Batch(response), OutputFormat::Markdown) => {
            report::generate_batch_markdown(response, &metadata)
        }
        (PipelineOutput::Report(full), OutputFormat::Markdown) => {
            report::generate_report_markdown(full, &metadata)
        }
        (PipelineOutput::Batch(response), OutputFormat::Json) => report::generate_json(response)?,
        (PipelineOutput::Report(full), OutputFormat::Json) => report::generate_json(full)?,
    };

    let output_path = args
        .output
        .clone()
        .or_else(|| config.general.output.as_ref().map(PathBuf::from));
    match output_path {
        Some(ref path) => {
            std::fs::write(path, &rendered)
                .with_context(|| format!("Failed to write output to {}", path.display()))?;
        }
        None => println!("{}", rendered),
    }

    let failed = match &output {
        PipelineOutput::Batch(response) => {
            if !args.quiet {
                println!("\n📊 Summary:");
                println!(
                    "   Statements: {} ({} failed)",
                    response.statements.len(),
                    response.failed_statements()
                );
                if response.fallback_used {
                    println!("   Fallback query used");
                }
                if !response.sync.is_empty() {
                    println!(
                        "   Directory calls: {} ({} failed)",
                        response.sync.len(),
                        response.failed_syncs()
                    );
                }
                println!("   Duration: {:.1}s", metadata.duration_seconds);
            }
            response.has_failures()
        }
        PipelineOutput::Report(full) => {
            if !args.quiet {
                println!("\n📊 Summary:");
                println!(
                    "   Sections: {} ({} failed)",
                    full.sections.len(),
                    full.failed_sections()
                );
                println!("   Duration: {:.1}s", metadata.duration_seconds);
            }
            full.failed_sections() > 0
        }
    };

    if let Some(ref path) = output_path {
        if !args.quiet {
            println!("\n✅ Done! Output saved to: {}", path.display());
        }
    }

    if args.strict && failed {
        eprintln!("\n⛔ Some statements or directory calls failed. Failing (exit code 2).");
        return Ok(2);
    }

    Ok(0)
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path);
    }

    match Config::load_default() {
        Ok(Some(config)) => {
            info!("Loaded default config from {}", CONFIG_FILE_NAME);
            Ok(config)
        }
        Ok(None) => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
        Err(e) => {
            warn!("Failed to load config: {}", e);
            Ok(Config::default())
        }
    }
}
