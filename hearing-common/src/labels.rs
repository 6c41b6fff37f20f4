//! Clinical label taxonomy
//!
//! The index of each category is the integer class code used in the training
//! dataset's `Label` column and in the classifier's output space. Training-time
//! encoding and runtime decoding both go through this table.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Number of clinical categories
pub const CLASS_COUNT: usize = 5;

/// Category names indexed by class code
pub const LABELS: [&str; CLASS_COUNT] = [
    "Normal",
    "Mild Sloping Loss",
    "Noise-Induced Loss",
    "Moderate Loss",
    "Severe Loss",
];

/// Hearing profile category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "usize", into = "usize")]
pub enum ClassLabel {
    Normal = 0,
    MildSlopingLoss = 1,
    NoiseInducedLoss = 2,
    ModerateLoss = 3,
    SevereLoss = 4,
}

impl ClassLabel {
    /// All categories in class-code order
    pub const ALL: [ClassLabel; CLASS_COUNT] = [
        ClassLabel::Normal,
        ClassLabel::MildSlopingLoss,
        ClassLabel::NoiseInducedLoss,
        ClassLabel::ModerateLoss,
        ClassLabel::SevereLoss,
    ];

    /// Decode a class index produced by the classifier
    pub fn from_index(index: usize) -> Result<Self> {
        Self::ALL
            .get(index)
            .copied()
            .ok_or(Error::LabelIndexOutOfRange(index))
    }

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        LABELS[self.index()]
    }
}

impl fmt::Display for ClassLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl TryFrom<usize> for ClassLabel {
    type Error = Error;

    fn try_from(index: usize) -> Result<Self> {
        Self::from_index(index)
    }
}

impl From<ClassLabel> for usize {
    fn from(label: ClassLabel) -> usize {
        label.index()
    }
}
