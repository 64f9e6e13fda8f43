//! Fleet Sentinel - Autonomous Fleet Telemetry Intelligence Service
//!
//! # Usage
//!
//! ```bash
//! # Run the service with defaults (data in ./data, models in ./models)
//! cargo run --release
//!
//! # Register a demo fleet, then feed it synthetic telemetry
//! cargo run --release -- seed --count 5
//! cargo run --release --bin simulation -- --vehicles 1,2,3
//! ```
//!
//! # Environment Variables
//!
//! - `FLEET_SENTINEL_CONFIG`: Path to the TOML config file
//! - `RUST_LOG`: Logging level (default: info)
//! - `RESET_DB`: Set to "true" to wipe all persistent data on startup

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use fleet_sentinel::api::{create_app, ApiState};
use fleet_sentinel::{config, BroadcastHub, FleetStore, IngestPipeline, ModelEnsemble};

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "fleet-sentinel")]
#[command(about = "Fleet Sentinel telemetry ingestion and predictive maintenance service")]
#[command(version)]
struct CliArgs {
    /// Override the server bind address (default from config, "0.0.0.0:8080")
    #[arg(short, long)]
    addr: Option<String>,

    /// Reset all persistent data (readings, verdicts, maintenance records)
    /// on startup. WARNING: This is destructive and cannot be undone!
    /// Can also be set via RESET_DB=true environment variable.
    #[arg(long)]
    reset_db: bool,

    #[command(subcommand)]
    command: Option<SubCommand>,
}

#[derive(clap::Subcommand, Debug)]
enum SubCommand {
    /// Register a demo fleet into the vehicle registry and exit
    Seed {
        /// Number of demo vehicles to register
        #[arg(long, default_value = "5")]
        count: usize,
    },
}

// ============================================================================
// Database Reset
// ============================================================================

/// Check if database reset is requested via CLI flag or environment variable.
fn should_reset_db(cli_flag: bool) -> bool {
    if cli_flag {
        return true;
    }
    if let Ok(val) = std::env::var("RESET_DB") {
        let val_lower = val.to_lowercase();
        return val_lower == "true" || val_lower == "1" || val_lower == "yes";
    }
    false
}

/// Safely remove the data directory and all its contents.
fn reset_data_directory(data_dir: &str) -> Result<()> {
    let data_path = std::path::Path::new(data_dir);

    if !data_path.exists() {
        info!("Data directory does not exist, nothing to reset");
        return Ok(());
    }

    warn!("RESET_DB requested - removing {}", data_path.display());
    std::fs::remove_dir_all(data_path).context("Failed to remove data directory")?;
    warn!("Data directory removed; a fresh store will be created on startup");

    Ok(())
}

// ============================================================================
// Seeding
// ============================================================================

/// Register `count` demo vehicles (idempotent only in the sense that each
/// run appends a fresh batch - intended for empty development stores).
fn seed_fleet(store: &FleetStore, count: usize) -> Result<()> {
    for i in 1..=count {
        let vehicle = store.register_vehicle(&format!("AV-{i:03}"), "Falcon Mk2")?;
        info!(id = vehicle.id, name = %vehicle.name, "Registered demo vehicle");
    }
    info!("Seeded {count} demo vehicles");
    Ok(())
}

// ============================================================================
// Task Names for Supervisor Logging
// ============================================================================

#[derive(Debug, Clone, Copy)]
enum TaskName {
    HttpServer,
}

impl std::fmt::Display for TaskName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::HttpServer => write!(f, "HttpServer"),
        }
    }
}

/// Spawn the HTTP server task into the JoinSet.
fn spawn_http_server(
    task_set: &mut JoinSet<Result<TaskName>>,
    listener: tokio::net::TcpListener,
    app: axum::Router,
    cancel_token: CancellationToken,
) {
    task_set.spawn(async move {
        info!("[HttpServer] Task starting");

        let result = axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                cancel_token.cancelled().await;
                info!("[HttpServer] Received shutdown signal");
            })
            .await;

        match result {
            Ok(()) => {
                info!("[HttpServer] Graceful shutdown complete");
                Ok(TaskName::HttpServer)
            }
            Err(e) => {
                error!("[HttpServer] Server error: {}", e);
                Err(anyhow::anyhow!("HTTP server error: {}", e))
            }
        }
    });
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let args = CliArgs::parse();

    // Load service configuration
    config::init(fleet_sentinel::SentinelConfig::load());
    let cfg = config::get();

    // Reset DB check - BEFORE any storage initialization
    if should_reset_db(args.reset_db) {
        reset_data_directory(&cfg.storage.data_dir)?;
    }

    info!("Fleet Sentinel - Telemetry Intelligence Service");

    let store = FleetStore::open(&cfg.storage.data_dir)
        .with_context(|| format!("Failed to open fleet store at {}", cfg.storage.data_dir))?;

    // Subcommand dispatch
    if let Some(SubCommand::Seed { count }) = args.command {
        seed_fleet(&store, count)?;
        return Ok(());
    }

    // Load the model ensemble once; degraded availability is a warning,
    // not a startup failure.
    let ensemble = Arc::new(ModelEnsemble::load(std::path::Path::new(&cfg.models.dir)));
    if ensemble.is_ready() {
        info!("Model ensemble ready");
    } else {
        warn!("Model ensemble partially available - affected scores will use defaults");
    }

    let hub = Arc::new(BroadcastHub::new(cfg.hub.channel_capacity));
    let pipeline = Arc::new(IngestPipeline::new(
        store.clone(),
        Arc::clone(&ensemble),
        Arc::clone(&hub),
        cfg.pipeline.max_concurrent_ingests,
    ));

    let state = ApiState::new(pipeline, store, ensemble, hub);
    let app = create_app(state);

    let server_addr = args.addr.unwrap_or_else(|| cfg.server.addr.clone());
    let listener = tokio::net::TcpListener::bind(&server_addr)
        .await
        .with_context(|| format!("Failed to bind to {server_addr}"))?;
    info!("HTTP server listening on {server_addr}");

    // Graceful shutdown via Ctrl+C
    let cancel_token = CancellationToken::new();
    let shutdown_token = cancel_token.clone();
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("Received Ctrl+C, initiating shutdown...");
        shutdown_token.cancel();
    });

    let mut task_set: JoinSet<Result<TaskName>> = JoinSet::new();
    spawn_http_server(&mut task_set, listener, app, cancel_token.clone());

    // Supervise: first task exit (clean or failed) ends the process.
    while let Some(joined) = task_set.join_next().await {
        match joined {
            Ok(Ok(name)) => info!("[{name}] Task finished"),
            Ok(Err(e)) => {
                error!("Task failed: {e}");
                cancel_token.cancel();
            }
            Err(e) => {
                error!("Task panicked: {e}");
                cancel_token.cancel();
            }
        }
    }

    info!("Fleet Sentinel shutdown complete");
    Ok(())
}
