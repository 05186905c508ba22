//! npi-dash - NPI tracker dashboard
//!
//! Serves the process readiness, milestone and sub-milestone trackers from
//! their published CSV exports, refreshing each on its own interval.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tokio::sync::broadcast;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use npi_common::config::ConfigResolver;
use npi_dash::refresh::{RefreshScheduler, EVENT_CHANNEL_CAPACITY};
use npi_dash::service::TrackerRegistry;
use npi_dash::source::HttpCsvSource;
use npi_dash::{build_router, AppState};

/// Command-line arguments
#[derive(Parser, Debug)]
#[command(name = "npi-dash")]
#[command(about = "NPI process readiness and milestone dashboards")]
#[command(version)]
struct Args {
    /// Path to configuration file (otherwise NPI_CONFIG, then the
    /// platform config dir)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Socket address to bind (overrides the config file)
    #[arg(short, long, env = "NPI_BIND")]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "npi_dash=info,npi_common=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Build identification right after tracing init
    info!(
        "Starting NPI Dashboard (npi-dash) v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let args = Args::parse();

    let resolver = ConfigResolver::new(args.config);
    let (config, source) = match resolver.resolve() {
        Ok(resolved) => resolved,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            return Err(e).context("Failed to load configuration");
        }
    };
    info!("Configuration source: {:?}", source);
    for tracker in &config.trackers {
        info!(
            "Tracker '{}' ({:?}): refresh every {}s",
            tracker.id,
            tracker.kind,
            tracker.refresh_interval_secs()
        );
    }

    let csv_source = HttpCsvSource::new(Duration::from_secs(config.http_timeout_secs))
        .context("Failed to build HTTP client")?;
    let registry = Arc::new(TrackerRegistry::new(&config, Arc::new(csv_source)));

    let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
    let refresh_tasks = RefreshScheduler::new(registry.clone(), events.clone()).start();

    let state = AppState::new(registry, events);
    let app = build_router(state);

    let bind_addr = args.bind.unwrap_or(config.bind_addr);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", bind_addr))?;
    info!("npi-dash listening on http://{}", bind_addr);
    info!("Health check: http://{}/health", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    for task in refresh_tasks {
        task.abort();
    }

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
