//! Bagged ensemble of CART trees
//!
//! Each tree sees a bootstrap sample and a random feature subset per split.
//! Per-tree seeds come from one `ChaCha8Rng`, so a fit is a pure function of
//! the data and [`ForestParams`].

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::tree::{DecisionTree, TreeParams};
use super::Classifier;
use crate::features::{FeatureVector, FEATURE_COUNT};
use crate::labels::{ClassLabel, CLASS_COUNT};
use crate::{Error, Result};

/// Number of features considered at each split
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaxFeatures {
    Sqrt,
    All,
    Count(usize),
}

impl MaxFeatures {
    fn resolve(self, n_features: usize) -> usize {
        let n = match self {
            MaxFeatures::Sqrt => (n_features as f64).sqrt() as usize,
            MaxFeatures::All => n_features,
            MaxFeatures::Count(k) => k.min(n_features),
        };
        n.max(1)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForestParams {
    pub n_trees: usize,
    pub seed: u64,
    pub max_features: MaxFeatures,
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    pub bootstrap: bool,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            n_trees: 200,
            seed: 42,
            max_features: MaxFeatures::Sqrt,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            bootstrap: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForest {
    params: ForestParams,
    trees: Vec<DecisionTree>,
    importances: Option<[f64; FEATURE_COUNT]>,
}

impl RandomForest {
    pub fn new(params: ForestParams) -> Self {
        Self {
            params,
            trees: Vec::new(),
            importances: None,
        }
    }

    pub fn params(&self) -> &ForestParams {
        &self.params
    }

    pub fn is_fitted(&self) -> bool {
        !self.trees.is_empty()
    }

    pub fn tree_count(&self) -> usize {
        self.trees.len()
    }

    pub(crate) fn trees_well_formed(&self) -> bool {
        self.trees.iter().all(DecisionTree::is_well_formed)
    }

    pub(crate) fn is_finite(&self) -> bool {
        self.trees.iter().all(DecisionTree::is_finite)
    }

    #[cfg(test)]
    pub(crate) fn from_trees(params: ForestParams, trees: Vec<DecisionTree>) -> Self {
        Self {
            params,
            trees,
            importances: None,
        }
    }

    /// Mean class distribution across all trees
    pub fn predict_proba(&self, x: &FeatureVector) -> Result<[f64; CLASS_COUNT]> {
        if !self.is_fitted() {
            return Err(Error::Inference("classifier has not been fitted".to_string()));
        }
        let mut total = [0.0; CLASS_COUNT];
        for tree in &self.trees {
            for (sum, p) in total.iter_mut().zip(tree.distribution(x)) {
                *sum += p;
            }
        }
        let n = self.trees.len() as f64;
        for p in total.iter_mut() {
            *p /= n;
        }
        Ok(total)
    }
}

impl Default for RandomForest {
    fn default() -> Self {
        Self::new(ForestParams::default())
    }
}

impl Classifier for RandomForest {
    fn fit(&mut self, features: &[FeatureVector], labels: &[ClassLabel]) -> Result<()> {
        if features.is_empty() {
            return Err(Error::Training("no training samples".to_string()));
        }
        if features.len() != labels.len() {
            return Err(Error::Training(format!(
                "{} feature rows but {} labels",
                features.len(),
                labels.len()
            )));
        }
        if let Some(row) = features
            .iter()
            .position(|x| x.as_slice().iter().any(|v| !v.is_finite()))
        {
            return Err(Error::Training(format!(
                "sample {} contains a non-finite threshold",
                row
            )));
        }
        if self.params.n_trees == 0 {
            return Err(Error::Training("n_trees must be at least 1".to_string()));
        }

        let tree_params = TreeParams {
            max_features: self.params.max_features.resolve(FEATURE_COUNT),
            max_depth: self.params.max_depth,
            min_samples_split: self.params.min_samples_split.max(2),
            min_samples_leaf: self.params.min_samples_leaf.max(1),
        };

        let n = features.len();
        let mut seeds = ChaCha8Rng::seed_from_u64(self.params.seed);
        let mut trees = Vec::with_capacity(self.params.n_trees);
        let mut importances = [0.0; FEATURE_COUNT];

        for _ in 0..self.params.n_trees {
            let mut rng = ChaCha8Rng::seed_from_u64(seeds.gen());
            let sample: Vec<usize> = if self.params.bootstrap {
                (0..n).map(|_| rng.gen_range(0..n)).collect()
            } else {
                (0..n).collect()
            };

            let mut tree_importances = [0.0; FEATURE_COUNT];
            let tree = DecisionTree::grow(
                features,
                labels,
                sample,
                &tree_params,
                &mut rng,
                &mut tree_importances,
            );

            let total: f64 = tree_importances.iter().sum();
            if total > 0.0 {
                for (acc, imp) in importances.iter_mut().zip(tree_importances) {
                    *acc += imp / total;
                }
            }
            trees.push(tree);
        }

        let total: f64 = importances.iter().sum();
        if total > 0.0 {
            for imp in importances.iter_mut() {
                *imp /= total;
            }
        }

        debug!(
            trees = trees.len(),
            samples = n,
            max_depth = trees.iter().map(DecisionTree::depth).max().unwrap_or(0),
            "Random forest fitted"
        );

        self.trees = trees;
        self.importances = Some(importances);
        Ok(())
    }

    fn predict(&self, batch: &[FeatureVector]) -> Result<Vec<usize>> {
        batch
            .iter()
            .map(|x| {
                let proba = self.predict_proba(x)?;
                let mut best = 0;
                for class in 1..CLASS_COUNT {
                    if proba[class] > proba[best] {
                        best = class;
                    }
                }
                Ok(best)
            })
            .collect()
    }

    fn feature_importances(&self) -> Option<[f64; FEATURE_COUNT]> {
        self.importances
    }
}
