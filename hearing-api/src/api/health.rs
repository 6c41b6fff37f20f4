//! Liveness endpoints

use axum::{extract::State, routing::get, Json, Router};
use chrono::{DateTime, Utc};
use hearing_common::config::ErrorContract;
use serde::Serialize;

use crate::AppState;

#[derive(Debug, Serialize)]
pub struct HomeResponse {
    pub message: String,
}

/// Summary of the artifact the service is answering with
#[derive(Debug, Serialize)]
pub struct ModelStatus {
    pub format_version: u32,
    pub trees: usize,
    pub train_samples: usize,
    pub trained_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub error_contract: ErrorContract,
    pub model: ModelStatus,
}

/// GET /
pub async fn home() -> Json<HomeResponse> {
    Json(HomeResponse {
        message: "Hearing ML API is running".to_string(),
    })
}

/// GET /health
///
/// The service never starts without a model, so reaching this handler means
/// one is loaded; the body says which.
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let model = state.predictor.model();
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        error_contract: state.error_contract,
        model: ModelStatus {
            format_version: model.format_version,
            trees: model.forest().tree_count(),
            train_samples: model.train_samples,
            trained_at: model.trained_at,
        },
    })
}

pub fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
