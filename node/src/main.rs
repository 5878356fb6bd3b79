//! RAMP deployment node.
//!
//! Runs on both sides of a deployment:
//! 1. Production serves the deploy endpoint (`ramp-node serve`)
//! 2. Staging drives a batch against it (`ramp-node deploy`)
//!
//! Usage:
//!   ramp-node --environment production serve --port 4100
//!   ramp-node deploy --remote http://prod:4100 --batch batch.json

use std::{path::PathBuf, sync::Arc, time::Duration};
use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use ramp_engine::{
    BatchCoordinator, BatchStatus, EngineConfig, HttpLink, ProductionResponder,
};
use ramp_extension::ramp_types::Batch;
use ramp_extension::OptionStore;
use ramp_node::{build_registry, build_router, config::NodeConfig};
use ramp_storage::SqliteOptionStore;
use serde_json::Value;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "ramp-node")]
#[command(about = "RAMP staging-to-production deployment node")]
struct Args {
    /// Path to the config file
    #[arg(short, long, default_value = "ramp.toml")]
    config: PathBuf,

    /// Environment name (overrides config)
    #[arg(short, long)]
    environment: Option<String>,

    /// Option store database (overrides config)
    #[arg(short, long)]
    database: Option<PathBuf>,

    /// Enable verbose debug logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the production deploy endpoint
    Serve {
        /// HTTP port (overrides config)
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Deploy a batch from this node to production
    Deploy {
        /// Production node URL (overrides config)
        #[arg(short, long)]
        remote: Option<String>,

        /// Batch JSON file; rows listed under `extras` start selected
        #[arg(short, long)]
        batch: Option<PathBuf>,
    },
    /// Print a value from the option store
    GetOption { key: String },
    /// Write a value to the option store (JSON, or a plain string)
    SetOption { key: String, value: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let log_level = if args.verbose { Level::DEBUG } else { Level::INFO };
    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .compact()
        .init();

    let mut config = NodeConfig::load_from(&args.config);
    if let Some(environment) = args.environment {
        config.node.environment = environment;
    }
    if let Some(database) = args.database {
        config.node.database = database;
    }

    let store = Arc::new(
        SqliteOptionStore::open(&config.node.database, config.node.environment.clone())
            .with_context(|| format!("Failed to open option store {:?}", config.node.database))?,
    );

    match args.command {
        Command::Serve { port } => {
            let port = port.unwrap_or(config.node.port);
            serve(store, config.engine_config(), port).await
        }
        Command::Deploy { remote, batch } => {
            let remote = remote
                .or(config.node.remote_url.clone())
                .context("No production URL: pass --remote or set node.remote_url")?;
            deploy(store, config.engine_config(), &remote, batch).await
        }
        Command::GetOption { key } => {
            let value = store.get(&key).context("Failed to read option")?;
            match value {
                Some(v) => println!("{}", serde_json::to_string_pretty(&v)?),
                None => bail!("Option '{}' is not set in {}", key, config.node.environment),
            }
            Ok(())
        }
        Command::SetOption { key, value } => {
            let value = serde_json::from_str(&value).unwrap_or(Value::String(value));
            store.set(&key, value).context("Failed to write option")?;
            info!("Set '{}' in {}", key, config.node.environment);
            Ok(())
        }
    }
}

async fn serve(store: Arc<SqliteOptionStore>, engine: EngineConfig, port: u16) -> Result<()> {
    let registry = build_registry(store).context("Failed to register extensions")?;
    let environment = engine.environment.clone();
    let responder = Arc::new(ProductionResponder::new(Arc::new(registry), engine));
    let app = build_router(responder);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port))
        .await
        .with_context(|| format!("Failed to bind HTTP port {}", port))?;
    info!("Serving {} deploy endpoint on port {}", environment, port);
    axum::serve(listener, app).await.context("HTTP server failed")
}

async fn deploy(
    store: Arc<SqliteOptionStore>,
    engine: EngineConfig,
    remote: &str,
    batch_file: Option<PathBuf>,
) -> Result<()> {
    let batch = match batch_file {
        Some(path) => {
            let json = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read batch file {:?}", path))?;
            Batch::from_json(&json).context("Failed to parse batch file")?
        }
        None => Batch::new(),
    };

    let registry = Arc::new(build_registry(store).context("Failed to register extensions")?);
    let link = HttpLink::new(remote, Duration::from_millis(engine.remote_timeout_ms))
        .context("Failed to create production link")?;
    let mut coordinator = BatchCoordinator::new(registry, Arc::new(link), engine, batch);
    info!("Deploying batch {} to {}", coordinator.batch().id, remote);

    let hello = coordinator.handshake().await.context("Handshake failed")?;
    if !hello.is_matched() {
        warn!(
            "Extension mismatch with {}: missing on production {:?}, only on production {:?}",
            hello.environment, hello.missing_on_production, hello.only_on_production
        );
    }

    coordinator.compare().await.context("Comparison failed")?;
    let blocked = coordinator.preflight().await.context("Preflight failed")?.blocked;
    if !blocked {
        coordinator.transfer().await.context("Transfer failed")?;
    }

    let report = coordinator.report();
    println!("{}", serde_json::to_string_pretty(&report)?);

    match report.status() {
        BatchStatus::Succeeded => {
            info!("Batch {} deployed", report.batch_id);
            Ok(())
        }
        BatchStatus::ValidationBlocked => bail!("Batch {} blocked by preflight", report.batch_id),
        BatchStatus::TransferPartialFailure => {
            bail!("Batch {} transferred with failures", report.batch_id)
        }
        BatchStatus::InProgress => bail!("Batch {} did not finish", report.batch_id),
    }
}
