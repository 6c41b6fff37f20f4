//! hearing-api library - prediction service
//!
//! Loads the model artifact once at startup and serves single-patient
//! classifications over HTTP.

use std::path::Path;
use std::sync::Arc;

use axum::Router;
use hearing_common::config::ErrorContract;
use hearing_common::{ModelArtifact, Result};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod predictor;

pub use predictor::{PredictionResponse, Predictor};

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub predictor: Predictor,
    /// How prediction failures map onto HTTP status codes
    pub error_contract: ErrorContract,
}

impl AppState {
    pub fn new(model: Arc<ModelArtifact>, error_contract: ErrorContract) -> Self {
        Self {
            predictor: Predictor::new(model),
            error_contract,
        }
    }

    /// Load the artifact and build state. A missing or invalid artifact is
    /// an error; the service must not come up without a model.
    pub fn load(model_path: &Path, error_contract: ErrorContract) -> Result<Self> {
        let model = ModelArtifact::load(model_path)?;
        Ok(Self::new(Arc::new(model), error_contract))
    }
}

/// Bind the listening socket. `host` may be an IP literal or a resolvable name.
pub async fn bind_listener(host: &str, port: u16) -> std::io::Result<tokio::net::TcpListener> {
    tokio::net::TcpListener::bind((host, port)).await
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::{get, post};

    Router::new()
        .route("/", get(api::home))
        .route("/predict", post(api::predict))
        .merge(api::health_routes())
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        // Any origin may call the service
        .layer(CorsLayer::permissive())
}
