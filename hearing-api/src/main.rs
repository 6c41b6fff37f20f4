//! hearing-api - hearing profile prediction service
//!
//! Loads the trained model artifact at startup and serves
//! `POST /predict` classifications. Refuses to start without a usable model.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use hearing_api::{bind_listener, build_router, AppState};
use hearing_common::config::{ErrorContract, HearingConfig};
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments for hearing-api
#[derive(Parser, Debug)]
#[command(name = "hearing-api")]
#[command(about = "Hearing profile classification service")]
#[command(version)]
struct Args {
    /// TOML configuration file
    #[arg(short, long, env = "HEARING_CONFIG")]
    config: Option<PathBuf>,

    /// Model artifact produced by hearing-trainer
    #[arg(short, long, env = "HEARING_MODEL_PATH")]
    model: Option<PathBuf>,

    /// Address to bind
    #[arg(long, env = "HEARING_HOST")]
    host: Option<String>,

    /// Port to listen on
    #[arg(short, long, env = "HEARING_PORT")]
    port: Option<u16>,

    /// Failure reporting: always_ok or status_codes
    #[arg(long, env = "HEARING_ERROR_CONTRACT")]
    error_contract: Option<ErrorContract>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = HearingConfig::load(args.config.as_deref()).context("Failed to load configuration")?;

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("{},tower_http=debug", config.logging.level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting hearing-api v{}", env!("CARGO_PKG_VERSION"));

    let model_path = args.model.unwrap_or_else(|| config.model_path.clone());
    let host = args.host.unwrap_or_else(|| config.api.host.clone());
    let port = args.port.unwrap_or(config.api.port);
    let error_contract = args.error_contract.unwrap_or(config.api.error_contract);

    info!("Model artifact: {}", model_path.display());
    info!("Error contract: {:?}", error_contract);

    let state = match AppState::load(&model_path, error_contract) {
        Ok(state) => {
            info!("✓ Model loaded");
            state
        }
        Err(e) => {
            error!("Failed to load model: {}", e);
            return Err(e).context("Model artifact unavailable");
        }
    };

    let app = build_router(state);

    let listener = bind_listener(&host, port)
        .await
        .with_context(|| format!("Failed to bind to {}:{}", host, port))?;
    let addr = listener.local_addr().context("Failed to read bound address")?;
    info!("hearing-api listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

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
            Ok(mut sig) => {
                sig.recv().await;
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
