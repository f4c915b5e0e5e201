//! PromptGate - LLM Prompt Governance Service
//!
//! A supervised governance pipeline that redacts, policy-checks, and scores
//! every prompt before it reaches a model, with an append-only audit trail.

use anyhow::Result;
use clap::{Parser, Subcommand};
use promptgate::{
    api::build_app,
    audit::{AuditDispatcher, AuditQuery, AuditSink, AuditState, JsonlAuditSink, MemoryAuditSink},
    config::{AuditMode, default_config_path, PolicyMode, PromptgateConfig},
    pipeline::{PipelineState, ProcessRequest, Supervisor},
    policy::{HttpPolicyOracle, PolicyOracle, RulePolicyOracle},
    redaction::{PatternRedactor, Redactor},
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "promptgate")]
#[command(author = "PromptGate Team")]
#[command(version)]
#[command(about = "LLM Prompt Governance Service")]
struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "PROMPTGATE_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the PromptGate HTTP service
    Serve {
        /// Host to bind to (overrides the configuration file)
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on (overrides the configuration file)
        #[arg(long)]
        port: Option<u16>,
    },

    /// Run a single prompt through the governance pipeline
    Check {
        /// Prompt text to evaluate
        #[arg(short, long)]
        prompt: String,

        /// Caller identity recorded in the trace
        #[arg(long, default_value = "cli")]
        caller: String,
    },

    /// Write a default configuration file
    Init {
        /// Destination path (defaults to ~/.promptgate/config.toml)
        path: Option<PathBuf>,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("promptgate={},tower_http=debug", log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration: --config, else the default location, else defaults
    let config = PromptgateConfig::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Serve { host, port } => {
            run_serve(config, host, port).await?;
        }
        Commands::Check { prompt, caller } => {
            run_check(config, prompt, caller).await?;
        }
        Commands::Init { path, force } => {
            run_init(path, force)?;
        }
    }

    Ok(())
}

/// Assemble the pipeline components described by the configuration.
async fn build_components(
    config: &PromptgateConfig,
) -> Result<(Arc<Supervisor>, Arc<dyn AuditQuery>)> {
    let redactor: Arc<dyn Redactor> = Arc::new(PatternRedactor::from_config(&config.redaction)?);
    tracing::info!("Loaded {} redaction patterns", config.redaction.patterns.len());

    let oracle: Arc<dyn PolicyOracle> = match config.policy.mode {
        PolicyMode::Rule => {
            tracing::info!("Policy oracle: {} local rules", config.policy.rules.len());
            Arc::new(RulePolicyOracle::from_config(&config.policy))
        }
        PolicyMode::Http => {
            let endpoint = config.policy.endpoint.clone().ok_or_else(|| {
                anyhow::anyhow!("policy.endpoint is required when policy.mode is \"http\"")
            })?;
            tracing::info!("Policy oracle: remote endpoint {}", endpoint);
            Arc::new(HttpPolicyOracle::new(endpoint))
        }
    };

    let (sink, query): (Arc<dyn AuditSink>, Arc<dyn AuditQuery>) = match config.audit.mode {
        AuditMode::File => {
            let sink = Arc::new(JsonlAuditSink::new(config.audit.dir.clone()).await?);
            tracing::info!("Audit trail directory: {}", config.audit.dir.display());
            (sink.clone(), sink)
        }
        AuditMode::Memory => {
            tracing::warn!("Audit trail is in-memory only and is lost on restart");
            let sink = Arc::new(MemoryAuditSink::new());
            (sink.clone(), sink)
        }
    };

    let supervisor = Arc::new(Supervisor::new(
        redactor,
        oracle,
        AuditDispatcher::new(sink),
        &config.pipeline,
    ));

    Ok((supervisor, query))
}

async fn run_serve(
    config: PromptgateConfig,
    host: Option<String>,
    port: Option<u16>,
) -> Result<()> {
    tracing::info!("Starting PromptGate...");

    let host = host.unwrap_or_else(|| config.server.host.clone());
    let port = port.unwrap_or(config.server.port);

    let (supervisor, query) = build_components(&config).await?;

    let app = build_app(
        PipelineState { supervisor },
        AuditState { query },
        &config.server.allowed_origins,
    );

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("PromptGate is running on {}. Press Ctrl+C to stop.", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Shutting down...");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for shutdown signal: {}", e);
    }
}

async fn run_check(config: PromptgateConfig, prompt: String, caller: String) -> Result<()> {
    let (supervisor, _query) = build_components(&config).await?;

    let transaction = supervisor
        .process(ProcessRequest {
            prompt,
            caller_id: caller,
            transaction_id: None,
        })
        .await?;

    println!(
        "Decision: {} (risk {:.1})",
        transaction.disposition, transaction.risk_score
    );
    println!("{}", serde_json::to_string_pretty(&transaction)?);

    // Audit writes are detached; give them a moment to land before exit.
    tokio::time::sleep(std::time::Duration::from_millis(100)).await;

    Ok(())
}

fn run_init(path: Option<PathBuf>, force: bool) -> Result<()> {
    let path = path.unwrap_or_else(default_config_path);

    if path.exists() && !force {
        anyhow::bail!(
            "Configuration file {} already exists (use --force to overwrite)",
            path.display()
        );
    }

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let config = PromptgateConfig::default();
    std::fs::write(&path, toml::to_string_pretty(&config)?)?;

    println!("Wrote default configuration to {}", path.display());

    Ok(())
}
