//! Held-out evaluation: classification report, confusion matrix and feature
//! importance ranking. Rendered as text for the operator; nothing here is
//! persisted or read back by the prediction service.

use std::fmt;

use hearing_common::features::FEATURE_COUNT;
use hearing_common::labels::CLASS_COUNT;
use hearing_common::{ClassLabel, Frequency};

/// Counts of (actual, predicted) pairs; rows are actual classes
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfusionMatrix {
    counts: [[usize; CLASS_COUNT]; CLASS_COUNT],
}

impl ConfusionMatrix {
    pub fn from_predictions(actual: &[ClassLabel], predicted: &[ClassLabel]) -> Self {
        let mut counts = [[0usize; CLASS_COUNT]; CLASS_COUNT];
        for (a, p) in actual.iter().zip(predicted) {
            counts[a.index()][p.index()] += 1;
        }
        Self { counts }
    }

    pub fn get(&self, actual: ClassLabel, predicted: ClassLabel) -> usize {
        self.counts[actual.index()][predicted.index()]
    }

    pub fn total(&self) -> usize {
        self.counts.iter().flatten().sum()
    }

    pub fn correct(&self) -> usize {
        (0..CLASS_COUNT).map(|i| self.counts[i][i]).sum()
    }

    fn actual_total(&self, class: usize) -> usize {
        self.counts[class].iter().sum()
    }

    fn predicted_total(&self, class: usize) -> usize {
        self.counts.iter().map(|row| row[class]).sum()
    }
}

impl fmt::Display for ConfusionMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Confusion Matrix (rows: actual, columns: predicted)")?;
        write!(f, "{:>20}", "")?;
        for class in 0..CLASS_COUNT {
            write!(f, "{:>6}", class)?;
        }
        writeln!(f)?;
        for label in ClassLabel::ALL {
            write!(f, "{:>17} {:>2}", label.name(), label.index())?;
            for count in self.counts[label.index()] {
                write!(f, "{:>6}", count)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassMetrics {
    pub label: ClassLabel,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: usize,
}

/// Per-class precision / recall / F1 with accuracy and averages
#[derive(Debug, Clone, PartialEq)]
pub struct ClassificationReport {
    /// Classes that appear in either the actual or predicted labels
    pub classes: Vec<ClassMetrics>,
    pub accuracy: f64,
    pub macro_avg: (f64, f64, f64),
    pub weighted_avg: (f64, f64, f64),
    pub total: usize,
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

impl ClassificationReport {
    pub fn from_confusion(matrix: &ConfusionMatrix) -> Self {
        let mut classes = Vec::new();
        for label in ClassLabel::ALL {
            let i = label.index();
            let support = matrix.actual_total(i);
            let predicted = matrix.predicted_total(i);
            if support == 0 && predicted == 0 {
                continue;
            }
            let tp = matrix.counts[i][i];
            let precision = ratio(tp, predicted);
            let recall = ratio(tp, support);
            let f1 = if precision + recall > 0.0 {
                2.0 * precision * recall / (precision + recall)
            } else {
                0.0
            };
            classes.push(ClassMetrics {
                label,
                precision,
                recall,
                f1,
                support,
            });
        }

        let total = matrix.total();
        let n_classes = classes.len().max(1) as f64;
        let macro_avg = (
            classes.iter().map(|c| c.precision).sum::<f64>() / n_classes,
            classes.iter().map(|c| c.recall).sum::<f64>() / n_classes,
            classes.iter().map(|c| c.f1).sum::<f64>() / n_classes,
        );
        let weight = |metric: fn(&ClassMetrics) -> f64| {
            if total == 0 {
                0.0
            } else {
                classes
                    .iter()
                    .map(|c| metric(c) * c.support as f64)
                    .sum::<f64>()
                    / total as f64
            }
        };
        let weighted_avg = (
            weight(|c| c.precision),
            weight(|c| c.recall),
            weight(|c| c.f1),
        );

        Self {
            accuracy: ratio(matrix.correct(), total),
            classes,
            macro_avg,
            weighted_avg,
            total,
        }
    }
}

impl fmt::Display for ClassificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{:>20} {:>9} {:>9} {:>9} {:>9}",
            "", "precision", "recall", "f1-score", "support"
        )?;
        writeln!(f)?;
        for c in &self.classes {
            writeln!(
                f,
                "{:>20} {:>9.2} {:>9.2} {:>9.2} {:>9}",
                c.label.name(),
                c.precision,
                c.recall,
                c.f1,
                c.support
            )?;
        }
        writeln!(f)?;
        writeln!(
            f,
            "{:>20} {:>9} {:>9} {:>9.2} {:>9}",
            "accuracy", "", "", self.accuracy, self.total
        )?;
        for (name, (p, r, f1)) in [("macro avg", self.macro_avg), ("weighted avg", self.weighted_avg)] {
            writeln!(
                f,
                "{:>20} {:>9.2} {:>9.2} {:>9.2} {:>9}",
                name, p, r, f1, self.total
            )?;
        }
        Ok(())
    }
}

/// Features sorted by descending importance
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureImportance {
    pub ranking: Vec<(Frequency, f64)>,
}

impl FeatureImportance {
    pub fn new(importances: [f64; FEATURE_COUNT]) -> Self {
        let mut ranking: Vec<(Frequency, f64)> = Frequency::ALL.into_iter().zip(importances).collect();
        // stable sort keeps column order among ties
        ranking.sort_by(|a, b| b.1.total_cmp(&a.1));
        Self { ranking }
    }
}

impl fmt::Display for FeatureImportance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const BAR_WIDTH: f64 = 40.0;
        writeln!(f, "Feature Importance")?;
        for (freq, importance) in &self.ranking {
            let bar = "#".repeat((importance * BAR_WIDTH).round() as usize);
            writeln!(f, "{:>7} {:>6.3} {}", freq.key(), importance, bar)?;
        }
        Ok(())
    }
}

/// Everything produced by the evaluation stage
#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationReport {
    pub classification: ClassificationReport,
    pub confusion: ConfusionMatrix,
    pub importance: Option<FeatureImportance>,
}

impl EvaluationReport {
    pub fn new(
        actual: &[ClassLabel],
        predicted: &[ClassLabel],
        importances: Option<[f64; FEATURE_COUNT]>,
    ) -> Self {
        let confusion = ConfusionMatrix::from_predictions(actual, predicted);
        Self {
            classification: ClassificationReport::from_confusion(&confusion),
            confusion,
            importance: importances.map(FeatureImportance::new),
        }
    }
}

impl fmt::Display for EvaluationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Classification Report:")?;
        writeln!(f)?;
        writeln!(f, "{}", self.classification)?;
        writeln!(f, "{}", self.confusion)?;
        if let Some(importance) = &self.importance {
            write!(f, "{}", importance)?;
        }
        Ok(())
    }
}
