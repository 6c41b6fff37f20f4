//! # Hearing Common Library
//!
//! Shared code for the hearing classifier trainer and prediction service:
//! - Clinical label taxonomy (class index <-> category name)
//! - Feature vector contract (named frequencies -> ordered thresholds)
//! - Classifier capability and the random forest that implements it
//! - Model artifact persistence
//! - Configuration loading

pub mod config;
pub mod error;
pub mod features;
pub mod labels;
pub mod model;

pub use error::{Error, Result};
pub use features::{FeatureVector, Frequency};
pub use labels::ClassLabel;
pub use model::{Classifier, ModelArtifact, RandomForest};
