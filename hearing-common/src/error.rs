//! Common error types for the hearing classifier

use std::path::PathBuf;

use thiserror::Error;

/// Common result type for hearing classifier operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error taxonomy shared by the trainer and the prediction service
#[derive(Error, Debug)]
pub enum Error {
    /// Request is missing a frequency key or carries a non-numeric value
    #[error("Malformed input: {reason} '{key}'")]
    MalformedInput { key: String, reason: String },

    /// Model produced a class index with no clinical label
    #[error("Label index out of range: {0} (expected 0-4)")]
    LabelIndexOutOfRange(usize),

    /// Model artifact could not be loaded
    #[error("Model unavailable at {path}: {reason}")]
    ModelUnavailable { path: PathBuf, reason: String },

    /// Unexpected failure inside the classifier's predict call
    #[error("Inference error: {0}")]
    Inference(String),

    /// Classifier could not be fitted
    #[error("Training error: {0}")]
    Training(String),

    /// Training dataset missing or malformed
    #[error("Dataset error: {0}")]
    DatasetLoad(String),

    /// Model artifact could not be written
    #[error("Persist error at {path}: {reason}")]
    Persist { path: PathBuf, reason: String },

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encoding/decoding error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Shorthand for a missing frequency key
    pub fn missing_key(key: impl Into<String>) -> Self {
        Error::MalformedInput {
            key: key.into(),
            reason: "missing frequency".to_string(),
        }
    }

    /// Shorthand for a frequency value that is not a real number
    pub fn non_numeric(key: impl Into<String>) -> Self {
        Error::MalformedInput {
            key: key.into(),
            reason: "non-numeric value for".to_string(),
        }
    }

    /// True when the caller, not the service, caused the failure
    pub fn is_client_fault(&self) -> bool {
        matches!(self, Error::MalformedInput { .. } | Error::Json(_))
    }
}
