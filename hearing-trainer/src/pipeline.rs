//! Offline training pipeline
//!
//! `Load -> Partition -> Fit -> Persist -> Evaluate`, strictly in that order.
//! Any failure aborts the run. The artifact is only written after a
//! successful fit, and the write itself is atomic.

use std::fmt;
use std::path::PathBuf;

use hearing_common::config::HearingConfig;
use hearing_common::model::{ForestParams, MaxFeatures};
use hearing_common::{ClassLabel, Classifier, ModelArtifact, RandomForest, Result};
use tracing::info;

use crate::dataset::Dataset;
use crate::report::EvaluationReport;
use crate::split::train_test_split;

/// Pipeline stage, used for progress logging
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Load,
    Partition,
    Fit,
    Persist,
    Evaluate,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Load => "load dataset",
            Stage::Partition => "partition",
            Stage::Fit => "fit",
            Stage::Persist => "persist",
            Stage::Evaluate => "evaluate",
        };
        f.write_str(name)
    }
}

/// Inputs for a single training run
#[derive(Debug, Clone, PartialEq)]
pub struct TrainerOptions {
    pub dataset_path: PathBuf,
    pub model_path: PathBuf,
    pub delimiter: u8,
    pub test_fraction: f64,
    pub seed: u64,
    pub n_trees: usize,
    pub max_depth: Option<usize>,
}

impl Default for TrainerOptions {
    fn default() -> Self {
        Self::from(&HearingConfig::default())
    }
}

impl From<&HearingConfig> for TrainerOptions {
    fn from(config: &HearingConfig) -> Self {
        Self {
            dataset_path: config.dataset_path.clone(),
            model_path: config.model_path.clone(),
            delimiter: config.training.delimiter as u8,
            test_fraction: config.training.test_fraction,
            seed: config.training.seed,
            n_trees: config.training.n_trees,
            max_depth: config.training.max_depth,
        }
    }
}

impl TrainerOptions {
    pub fn forest_params(&self) -> ForestParams {
        ForestParams {
            n_trees: self.n_trees,
            seed: self.seed,
            max_features: MaxFeatures::Sqrt,
            max_depth: self.max_depth,
            ..ForestParams::default()
        }
    }
}

/// Result of a completed run
#[derive(Debug)]
pub struct TrainingOutcome {
    pub model_path: PathBuf,
    pub train_samples: usize,
    pub test_samples: usize,
    /// Held-out predictions, in evaluation-set order
    pub test_predictions: Vec<ClassLabel>,
    pub report: EvaluationReport,
}

pub struct Trainer {
    options: TrainerOptions,
}

impl Trainer {
    pub fn new(options: TrainerOptions) -> Self {
        Self { options }
    }

    /// Run the pipeline from the configured dataset file
    pub fn run(&self) -> Result<TrainingOutcome> {
        enter(Stage::Load);
        let dataset = Dataset::load_csv(&self.options.dataset_path, self.options.delimiter)?;
        self.run_with(dataset)
    }

    /// Run the pipeline on an already loaded dataset
    pub fn run_with(&self, dataset: Dataset) -> Result<TrainingOutcome> {
        let counts = dataset.class_counts();
        for label in ClassLabel::ALL {
            info!("  {:>20}: {} samples", label.name(), counts[label.index()]);
        }

        enter(Stage::Partition);
        let split = train_test_split(
            dataset.samples(),
            self.options.test_fraction,
            self.options.seed,
        )?;
        info!(
            "{} training samples, {} evaluation samples",
            split.train.len(),
            split.test.len()
        );

        enter(Stage::Fit);
        let params = self.options.forest_params();
        let mut forest = RandomForest::new(params);
        forest.fit(&split.train.features, &split.train.labels)?;
        info!("Fitted random forest with {} trees", forest.tree_count());

        enter(Stage::Persist);
        let artifact = ModelArtifact::new(forest, split.train.len())?;
        artifact.save(&self.options.model_path)?;

        enter(Stage::Evaluate);
        let test_predictions = artifact
            .predict_batch(&split.test.features)?
            .into_iter()
            .map(ClassLabel::from_index)
            .collect::<Result<Vec<_>>>()?;
        let report = EvaluationReport::new(
            &split.test.labels,
            &test_predictions,
            artifact.feature_importances(),
        );
        info!(
            "Held-out accuracy: {:.3}",
            report.classification.accuracy
        );

        Ok(TrainingOutcome {
            model_path: self.options.model_path.clone(),
            train_samples: split.train.len(),
            test_samples: split.test.len(),
            test_predictions,
            report,
        })
    }
}

fn enter(stage: Stage) {
    info!("Stage: {}", stage);
}
