//! Integration tests for hearing-api endpoints
//!
//! Tests cover:
//! - Liveness endpoints
//! - Successful classification
//! - Missing / non-numeric / unparseable input under both error contracts
//! - Classifier faults under both error contracts
//! - Startup refusal when the artifact is absent

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
};
use hearing_api::{bind_listener, build_router, AppState};
use hearing_common::config::ErrorContract;
use hearing_common::labels::LABELS;
use hearing_common::model::ForestParams;
use hearing_common::{ClassLabel, Classifier, FeatureVector, ModelArtifact, RandomForest};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::util::ServiceExt; // for `oneshot` method

/// Test helper: small forest over flat profiles, one level per class
fn test_artifact() -> ModelArtifact {
    let mut features = Vec::new();
    let mut labels = Vec::new();
    for label in ClassLabel::ALL {
        let level = 5.0 + 20.0 * label.index() as f64;
        for j in 0..8 {
            features.push(FeatureVector::new([level + j as f64; 6]));
            labels.push(label);
        }
    }
    let mut forest = RandomForest::new(ForestParams {
        n_trees: 10,
        ..ForestParams::default()
    });
    forest.fit(&features, &labels).expect("Should fit");
    ModelArtifact::new(forest, features.len()).expect("Should package")
}

/// Test helper: router with the given error contract
fn setup_app(contract: ErrorContract) -> axum::Router {
    build_router(AppState::new(Arc::new(test_artifact()), contract))
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

fn post_predict(body: impl Into<Body>) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri("/predict")
        .header(header::CONTENT_TYPE, "application/json")
        .body(body.into())
        .unwrap()
}

/// Test helper: Extract JSON body from response
async fn extract_json(body: Body) -> Value {
    let bytes = body.collect().await.expect("Should read body").to_bytes();
    serde_json::from_slice(&bytes).expect("Should parse JSON")
}

async fn predict(app: axum::Router, body: Value) -> (StatusCode, Value) {
    let response = app.oneshot(post_predict(body.to_string())).await.unwrap();
    let status = response.status();
    (status, extract_json(response.into_body()).await)
}

// =============================================================================
// Liveness
// =============================================================================

#[tokio::test]
async fn test_home_reports_running() {
    let app = setup_app(ErrorContract::AlwaysOk);
    let response = app.oneshot(get("/")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body, json!({"message": "Hearing ML API is running"}));
}

#[tokio::test]
async fn test_health_endpoint() {
    let app = setup_app(ErrorContract::AlwaysOk);
    let response = app.oneshot(get("/health")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["status"], "ok");
    assert!(body["version"].is_string());
    assert_eq!(body["error_contract"], "always_ok");
    assert_eq!(body["model"]["trees"], 10);
    assert_eq!(body["model"]["train_samples"], 40);
    assert!(body["model"]["trained_at"].is_string());
}

// =============================================================================
// Prediction
// =============================================================================

#[tokio::test]
async fn test_mild_thresholds_classified() {
    let (status, body) = predict(
        setup_app(ErrorContract::AlwaysOk),
        json!({
            "250Hz": 10, "500Hz": 10, "1000Hz": 15,
            "2000Hz": 15, "4000Hz": 20, "8000Hz": 20
        }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.get("error").is_none(), "unexpected error: {}", body);
    let label = body["classification"].as_str().expect("classification string");
    assert!(LABELS.contains(&label));
}

#[tokio::test]
async fn test_severe_profile_classified_severe() {
    let (_, body) = predict(
        setup_app(ErrorContract::AlwaysOk),
        json!({
            "250Hz": 88, "500Hz": 88, "1000Hz": 89,
            "2000Hz": 90, "4000Hz": 90, "8000Hz": 91
        }),
    )
    .await;
    assert_eq!(body["classification"], "Severe Loss");
}

#[tokio::test]
async fn test_missing_key_always_ok_contract() {
    let (status, body) = predict(
        setup_app(ErrorContract::AlwaysOk),
        json!({
            "250Hz": 10, "500Hz": 10, "1000Hz": 15,
            "2000Hz": 15, "4000Hz": 20
        }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.get("classification").is_none());
    assert!(body["error"].as_str().unwrap().contains("8000Hz"));
}

#[tokio::test]
async fn test_missing_key_status_code_contract() {
    let (status, body) = predict(
        setup_app(ErrorContract::StatusCodes),
        json!({ "250Hz": 10 }),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["error"].as_str().unwrap().contains("500Hz"));
}

#[tokio::test]
async fn test_non_numeric_value_is_error_payload() {
    let (status, body) = predict(
        setup_app(ErrorContract::AlwaysOk),
        json!({
            "250Hz": 10, "500Hz": 10, "1000Hz": "fifteen",
            "2000Hz": 15, "4000Hz": 20, "8000Hz": 20
        }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["error"].as_str().unwrap().contains("1000Hz"));
}

#[tokio::test]
async fn test_unparseable_body_is_error_payload() {
    let app = setup_app(ErrorContract::AlwaysOk);
    let response = app.oneshot(post_predict("{\"250Hz\": ")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    assert!(body["error"].is_string());
    assert!(body.get("classification").is_none());
}

/// Test helper: artifact whose forest has no trees, so every prediction
/// fails inside the classifier rather than on the input
fn treeless_artifact() -> Arc<ModelArtifact> {
    let mut raw = serde_json::to_value(test_artifact()).unwrap();
    raw["forest"]["trees"] = json!([]);
    Arc::new(serde_json::from_value(raw).expect("Should deserialize"))
}

#[tokio::test]
async fn test_inference_fault_under_both_contracts() {
    let valid = json!({
        "250Hz": 10, "500Hz": 10, "1000Hz": 15,
        "2000Hz": 15, "4000Hz": 20, "8000Hz": 20
    });

    for (contract, expected) in [
        (ErrorContract::AlwaysOk, StatusCode::OK),
        (ErrorContract::StatusCodes, StatusCode::INTERNAL_SERVER_ERROR),
    ] {
        let app = build_router(AppState::new(treeless_artifact(), contract));
        let (status, body) = predict(app, valid.clone()).await;

        assert_eq!(status, expected, "{:?}", contract);
        assert!(body.get("classification").is_none(), "{:?}: {}", contract, body);
        assert!(
            body["error"].as_str().unwrap().contains("not been fitted"),
            "{:?}: {}",
            contract,
            body
        );
    }
}

#[tokio::test]
async fn test_key_order_does_not_change_result() {
    let forward = r#"{"250Hz":40,"500Hz":42,"1000Hz":45,"2000Hz":47,"4000Hz":50,"8000Hz":52}"#;
    let reversed = r#"{"8000Hz":52,"4000Hz":50,"2000Hz":47,"1000Hz":45,"500Hz":42,"250Hz":40}"#;

    let a = setup_app(ErrorContract::AlwaysOk)
        .oneshot(post_predict(forward))
        .await
        .unwrap();
    let b = setup_app(ErrorContract::AlwaysOk)
        .oneshot(post_predict(reversed))
        .await
        .unwrap();

    assert_eq!(
        extract_json(a.into_body()).await,
        extract_json(b.into_body()).await
    );
}

#[tokio::test]
async fn test_cors_allows_any_origin() {
    let app = setup_app(ErrorContract::AlwaysOk);
    let request = Request::builder()
        .method(Method::GET)
        .uri("/")
        .header(header::ORIGIN, "http://localhost:3000")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(
        response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
        "*"
    );
}

// =============================================================================
// Startup
// =============================================================================

#[test]
fn test_startup_fails_without_artifact() {
    let dir = TempDir::new().unwrap();
    let result = AppState::load(&dir.path().join("hearing_model.json"), ErrorContract::AlwaysOk);
    assert!(matches!(
        result,
        Err(hearing_common::Error::ModelUnavailable { .. })
    ));
}

#[tokio::test]
async fn test_startup_from_saved_artifact() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("hearing_model.json");
    test_artifact().save(&path).unwrap();

    let state = AppState::load(&path, ErrorContract::AlwaysOk).expect("Should load");
    let (status, body) = predict(
        build_router(state),
        json!({
            "250Hz": 5, "500Hz": 5, "1000Hz": 6,
            "2000Hz": 6, "4000Hz": 7, "8000Hz": 7
        }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["classification"], "Normal");
}

#[tokio::test]
async fn test_bind_accepts_hostname() {
    let listener = bind_listener("localhost", 0).await.expect("Should bind by name");
    assert!(listener.local_addr().unwrap().ip().is_loopback());

    let listener = bind_listener("127.0.0.1", 0).await.expect("Should bind by address");
    assert_ne!(listener.local_addr().unwrap().port(), 0);
}
