//! Persisted model artifact
//!
//! The artifact carries the feature order and label table it was trained with.
//! Loading refuses any artifact whose tables differ from the compiled ones, so
//! a drifted taxonomy fails at startup instead of mislabelling patients.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::info;

use super::{Classifier, RandomForest};
use crate::features::{FeatureVector, Frequency, FEATURE_COUNT};
use crate::labels::{ClassLabel, LABELS};
use crate::{Error, Result};

/// Bumped whenever the on-disk layout changes
pub const ARTIFACT_FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub format_version: u32,
    /// Feature column keys in training order
    pub feature_order: Vec<String>,
    /// Label names indexed by class code
    pub labels: Vec<String>,
    pub trained_at: DateTime<Utc>,
    pub train_samples: usize,
    forest: RandomForest,
}

impl ModelArtifact {
    /// Wrap a fitted forest together with the current taxonomy tables
    pub fn new(forest: RandomForest, train_samples: usize) -> Result<Self> {
        if !forest.is_fitted() {
            return Err(Error::Training("cannot package an unfitted classifier".to_string()));
        }
        Ok(Self {
            format_version: ARTIFACT_FORMAT_VERSION,
            feature_order: Frequency::keys().iter().map(|k| k.to_string()).collect(),
            labels: LABELS.iter().map(|l| l.to_string()).collect(),
            trained_at: Utc::now(),
            train_samples,
            forest,
        })
    }

    pub fn forest(&self) -> &RandomForest {
        &self.forest
    }

    /// Classify a single patient
    pub fn predict(&self, features: &FeatureVector) -> Result<ClassLabel> {
        let indices = self.forest.predict(std::slice::from_ref(features))?;
        let index = indices
            .first()
            .copied()
            .ok_or_else(|| Error::Inference("classifier returned no prediction".to_string()))?;
        ClassLabel::from_index(index)
    }

    /// Predict a batch, returning raw class indices
    pub fn predict_batch(&self, batch: &[FeatureVector]) -> Result<Vec<usize>> {
        self.forest.predict(batch)
    }

    pub fn feature_importances(&self) -> Option<[f64; FEATURE_COUNT]> {
        self.forest.feature_importances()
    }

    /// Write the artifact, replacing any previous one.
    ///
    /// Bytes go to a temp file in the destination directory which is then
    /// renamed over `path`; readers see either the old file or the new one.
    pub fn save(&self, path: &Path) -> Result<()> {
        let persist_err = |reason: String| Error::Persist {
            path: path.to_path_buf(),
            reason,
        };

        if !self.forest.is_finite() {
            return Err(persist_err(
                "classifier contains non-finite split thresholds".to_string(),
            ));
        }

        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };

        let mut tmp = NamedTempFile::new_in(&dir).map_err(|e| persist_err(e.to_string()))?;
        {
            let mut writer = BufWriter::new(tmp.as_file_mut());
            serde_json::to_writer(&mut writer, self).map_err(|e| persist_err(e.to_string()))?;
            writer.flush().map_err(|e| persist_err(e.to_string()))?;
        }
        tmp.as_file()
            .sync_all()
            .map_err(|e| persist_err(e.to_string()))?;
        tmp.persist(path).map_err(|e| persist_err(e.error.to_string()))?;

        info!("Model artifact written to {}", path.display());
        Ok(())
    }

    /// Read and validate an artifact
    pub fn load(path: &Path) -> Result<Self> {
        let unavailable = |reason: String| Error::ModelUnavailable {
            path: path.to_path_buf(),
            reason,
        };

        let file = File::open(path).map_err(|e| unavailable(e.to_string()))?;
        let artifact: ModelArtifact =
            serde_json::from_reader(BufReader::new(file)).map_err(|e| unavailable(e.to_string()))?;
        artifact.verify().map_err(unavailable)?;

        info!(
            "Loaded model artifact from {} ({} trees, trained {})",
            path.display(),
            artifact.forest.tree_count(),
            artifact.trained_at.to_rfc3339()
        );
        Ok(artifact)
    }

    fn verify(&self) -> std::result::Result<(), String> {
        if self.format_version != ARTIFACT_FORMAT_VERSION {
            return Err(format!(
                "unsupported format version {} (expected {})",
                self.format_version, ARTIFACT_FORMAT_VERSION
            ));
        }
        if !self.feature_order.iter().map(String::as_str).eq(Frequency::keys()) {
            return Err(format!(
                "feature order {:?} does not match {:?}",
                self.feature_order,
                Frequency::keys()
            ));
        }
        if !self.labels.iter().map(String::as_str).eq(LABELS) {
            return Err(format!("label table {:?} does not match {:?}", self.labels, LABELS));
        }
        if !self.forest.is_fitted() || !self.forest.trees_well_formed() {
            return Err("classifier payload is empty or corrupt".to_string());
        }
        Ok(())
    }
}
