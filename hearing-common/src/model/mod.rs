//! Classifier capability and model artifact
//!
//! The rest of the system only relies on [`Classifier::fit`] and
//! [`Classifier::predict`]; [`RandomForest`] is the implementation that ships
//! inside a [`ModelArtifact`].

mod artifact;
mod forest;
mod tree;

pub use artifact::{ModelArtifact, ARTIFACT_FORMAT_VERSION};
pub use forest::{ForestParams, MaxFeatures, RandomForest};
pub use tree::{DecisionTree, Node};

use crate::features::{FeatureVector, FEATURE_COUNT};
use crate::labels::ClassLabel;
use crate::Result;

/// Supervised multi-class classifier over audiogram feature vectors
pub trait Classifier {
    /// Train on rows whose columns follow [`crate::Frequency::ALL`]
    fn fit(&mut self, features: &[FeatureVector], labels: &[ClassLabel]) -> Result<()>;

    /// Predict one raw class index per row
    fn predict(&self, batch: &[FeatureVector]) -> Result<Vec<usize>>;

    /// Relative importance of each feature column, if the model tracks it
    fn feature_importances(&self) -> Option<[f64; FEATURE_COUNT]> {
        None
    }
}
