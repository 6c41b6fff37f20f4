//! Runtime prediction handler
//!
//! Turns one patient's named thresholds into a clinical label. Every fault is
//! converted into an error payload here; nothing propagates past
//! [`Predictor::respond`].

use std::sync::Arc;

use hearing_common::{ClassLabel, Error, FeatureVector, ModelArtifact, Result};
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, warn};

/// Response body for `POST /predict`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum PredictionResponse {
    Classification { classification: String },
    Error { error: String },
}

impl PredictionResponse {
    pub fn is_error(&self) -> bool {
        matches!(self, PredictionResponse::Error { .. })
    }
}

/// Outcome of one request, keeping the fault for status-code mapping
#[derive(Debug)]
pub struct Prediction {
    pub result: Result<ClassLabel>,
}

impl Prediction {
    pub fn response(&self) -> PredictionResponse {
        match &self.result {
            Ok(label) => PredictionResponse::Classification {
                classification: label.name().to_string(),
            },
            Err(e) => PredictionResponse::Error {
                error: e.to_string(),
            },
        }
    }
}

/// Stateless classifier front end over a shared, read-only artifact
#[derive(Clone)]
pub struct Predictor {
    model: Arc<ModelArtifact>,
}

impl Predictor {
    pub fn new(model: Arc<ModelArtifact>) -> Self {
        Self { model }
    }

    pub fn model(&self) -> &ModelArtifact {
        &self.model
    }

    /// Build the feature vector, run a single-row prediction and decode the label
    pub fn classify(&self, input: &Map<String, Value>) -> Result<ClassLabel> {
        let features = FeatureVector::from_named(input)?;
        let label = self.model.predict(&features)?;
        debug!(?features, %label, "Classified audiogram");
        Ok(label)
    }

    /// Classify a request body of any JSON shape
    pub fn evaluate(&self, body: &Value) -> Prediction {
        let result = match body {
            Value::Object(map) => self.classify(map),
            _ => Err(Error::MalformedInput {
                key: "body".to_string(),
                reason: "expected a JSON object for".to_string(),
            }),
        };
        if let Err(e) = &result {
            warn!("Prediction failed: {}", e);
        }
        Prediction { result }
    }

    /// Classify raw request bytes; malformed JSON becomes an error payload too
    pub fn evaluate_bytes(&self, bytes: &[u8]) -> Prediction {
        match serde_json::from_slice::<Value>(bytes) {
            Ok(body) => self.evaluate(&body),
            Err(e) => {
                warn!("Prediction failed: unreadable body: {}", e);
                Prediction {
                    result: Err(Error::Json(e)),
                }
            }
        }
    }

    /// Payload-only form of [`Predictor::evaluate`]
    pub fn respond(&self, body: &Value) -> PredictionResponse {
        self.evaluate(body).response()
    }
}
