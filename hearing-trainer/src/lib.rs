//! hearing-trainer library - offline model training
//!
//! Loads a labelled audiogram dataset, partitions it, fits the random forest,
//! writes the model artifact and prints an evaluation report.

pub mod dataset;
pub mod pipeline;
pub mod report;
pub mod split;
pub mod synth;

pub use dataset::{AudiogramSample, Dataset};
pub use pipeline::{Stage, Trainer, TrainerOptions, TrainingOutcome};
pub use report::EvaluationReport;
