use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use smartpark::config::Config;
use smartpark::db::LoginSession;
use smartpark::inference::InferencePipeline;
use smartpark::AppState;

#[derive(Parser, Debug)]
#[command(name = "smartpark")]
#[command(author, version, about = "Parking lot allocation portal", long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "smartpark.toml")]
    config: PathBuf,

    /// Override log level
    #[arg(short, long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = Config::load(&cli.config)?;

    // Initialize logging
    let log_level = cli
        .log_level
        .as_ref()
        .unwrap_or(&config.logging.level)
        .clone();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_level)),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting SmartPark v{}", env!("CARGO_PKG_VERSION"));

    std::fs::create_dir_all(&config.server.data_dir).with_context(|| {
        format!(
            "Failed to create data directory {}",
            config.server.data_dir.display()
        )
    })?;

    // Initialize database
    let db = smartpark::db::init(&config.server.data_dir)
        .await
        .context("Failed to initialize database")?;

    let purged = LoginSession::purge_expired(&db)
        .await
        .context("Failed to purge expired login sessions")?;
    if purged > 0 {
        tracing::info!(purged, "Removed expired login sessions");
    }

    // Load the label classifier
    let pipeline = InferencePipeline::load(&config.model.artifacts_path).with_context(|| {
        format!(
            "Failed to load model artifacts from {}",
            config.model.artifacts_path.display()
        )
    })?;

    let mut state = AppState::new(config.clone(), db, Arc::new(pipeline));
    if config.metrics.enabled {
        let handle = smartpark::api::metrics::init_metrics()
            .context("Failed to install Prometheus recorder")?;
        state = state.with_metrics(handle);
    }

    let app = smartpark::api::create_router(Arc::new(state));

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    tracing::info!("Portal listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
