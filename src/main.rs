//! API Monitor (v1)
//!
//! Continuously probes configured HTTP endpoints, evaluates latency and
//! error thresholds, and scans response history for security issues.
//!
//! # Architecture Overview
//!
//! ```text
//!                 ┌──────────────────────────────────────────────────────────┐
//!                 │                      API MONITOR                         │
//!                 │                                                          │
//!   monitor.toml ─┼─▶ config ──▶ InMemoryStore (seeded endpoints)            │
//!                 │                     │                                    │
//!                 │                     ▼                                    │
//!                 │  ┌───────────┐  ┌───────────┐    ┌──────────────────┐    │
//!                 │  │ scheduler │─▶│  monitor  │───▶│ prober/transport │────┼──▶ Endpoints
//!                 │  │  4 loops  │  │ registry  │    └──────────────────┘    │
//!                 │  │           │  │ evaluator │──▶ alerts / incidents      │
//!                 │  │           │─▶│ security  │──▶ alerts                  │
//!                 │  │           │─▶│ housekeep │──▶ snapshots / purge       │
//!                 │  └───────────┘  └───────────┘                            │
//!                 │                                                          │
//!                 │  ┌────────────────────────────────────────────────────┐  │
//!                 │  │ observability: tracing logs + Prometheus exporter  │  │
//!                 │  └────────────────────────────────────────────────────┘  │
//!                 └──────────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;

use api_monitor::config::{load_config, watcher::watch_config, EndpointConfig, MonitorConfig};
use api_monitor::lifecycle::signals::wait_for_shutdown_signal;
use api_monitor::observability::{logging, metrics};
use api_monitor::{InMemoryStore, MonitoringEngine};

#[derive(Parser, Debug)]
#[command(name = "api-monitor", version, about = "API health and security monitor")]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, default_value = "monitor.toml")]
    config: PathBuf,

    /// Validate the configuration and exit.
    #[arg(long)]
    check: bool,

    /// Do not reload endpoints when the config file changes.
    #[arg(long)]
    no_watch: bool,
}

fn seed_endpoints(store: &InMemoryStore, config: &MonitorConfig) {
    store.sync_endpoints(config.endpoints.iter().map(EndpointConfig::to_endpoint).collect());
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load_config(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("api-monitor: {e}");
            return ExitCode::FAILURE;
        }
    };
    if cli.check {
        println!("{}: ok ({} endpoints)", cli.config.display(), config.endpoints.len());
        return ExitCode::SUCCESS;
    }

    if let Err(e) = logging::init_logging(&config.observability) {
        eprintln!("api-monitor: failed to initialize logging: {e}");
    }
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "api-monitor starting");

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let store = Arc::new(InMemoryStore::new());
    seed_endpoints(&store, &config);
    tracing::info!(
        endpoints = config.endpoints.len(),
        performance_secs = config.scheduler.performance_interval_secs,
        security_secs = config.scheduler.security_interval_secs,
        "Configuration loaded"
    );

    let engine = match MonitoringEngine::with_defaults(config, store.clone()) {
        Ok(engine) => engine,
        Err(e) => {
            tracing::error!(error = %e, "Failed to build monitoring engine");
            return ExitCode::FAILURE;
        }
    };

    if !engine.start().await {
        tracing::error!("Monitoring did not start; check store and active endpoints");
        return ExitCode::FAILURE;
    }

    let _watcher = if cli.no_watch {
        None
    } else {
        match watch_config(&cli.config) {
            Ok((watcher, mut updates)) => {
                let store = store.clone();
                tokio::spawn(async move {
                    while let Some(config) = updates.recv().await {
                        seed_endpoints(&store, &config);
                    }
                });
                Some(watcher)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Config watcher unavailable, hot reload disabled");
                None
            }
        }
    };

    let signal = wait_for_shutdown_signal().await;
    tracing::info!(signal = signal, "Shutdown signal received");
    engine.shutdown().await;

    tracing::info!("Shutdown complete");
    ExitCode::SUCCESS
}
