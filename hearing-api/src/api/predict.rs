//! Prediction endpoint

use axum::{body::Bytes, extract::State, http::StatusCode, Json};
use hearing_common::config::ErrorContract;

use crate::predictor::PredictionResponse;
use crate::AppState;

/// POST /predict
///
/// Body is taken as raw bytes so that unparseable JSON is reported in the
/// `error` payload like any other failure instead of being rejected by an
/// extractor.
pub async fn predict(
    State(state): State<AppState>,
    body: Bytes,
) -> (StatusCode, Json<PredictionResponse>) {
    let prediction = state.predictor.evaluate_bytes(&body);

    let status = match (&prediction.result, state.error_contract) {
        (Ok(_), _) | (Err(_), ErrorContract::AlwaysOk) => StatusCode::OK,
        (Err(e), ErrorContract::StatusCodes) if e.is_client_fault() => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        (Err(_), ErrorContract::StatusCodes) => StatusCode::INTERNAL_SERVER_ERROR,
    };

    (status, Json(prediction.response()))
}
