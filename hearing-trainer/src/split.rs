//! Seeded train / evaluation partitioning

use hearing_common::{ClassLabel, Error, FeatureVector, Result};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::dataset::AudiogramSample;

/// Feature matrix and label column for one side of the split
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Partition {
    pub features: Vec<FeatureVector>,
    pub labels: Vec<ClassLabel>,
}

impl Partition {
    fn from_rows(samples: &[AudiogramSample], rows: &[usize]) -> Self {
        rows.iter()
            .map(|&row| (samples[row].thresholds, samples[row].label))
            .unzip::<_, _, Vec<_>, Vec<_>>()
            .into()
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

impl From<(Vec<FeatureVector>, Vec<ClassLabel>)> for Partition {
    fn from((features, labels): (Vec<FeatureVector>, Vec<ClassLabel>)) -> Self {
        Self { features, labels }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrainTestSplit {
    pub train: Partition,
    pub test: Partition,
}

/// Shuffle row indices with a seeded RNG and hold out the first
/// `ceil(n * test_fraction)` rows for evaluation.
pub fn train_test_split(
    samples: &[AudiogramSample],
    test_fraction: f64,
    seed: u64,
) -> Result<TrainTestSplit> {
    if !(test_fraction > 0.0 && test_fraction < 1.0) {
        return Err(Error::Training(format!(
            "test fraction must be in (0, 1), got {}",
            test_fraction
        )));
    }

    let n = samples.len();
    let n_test = (n as f64 * test_fraction).ceil() as usize;
    if n < 2 || n_test >= n {
        return Err(Error::Training(format!(
            "{} samples cannot be split with test fraction {}",
            n, test_fraction
        )));
    }

    let mut rows: Vec<usize> = (0..n).collect();
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    rows.shuffle(&mut rng);

    let (test_rows, train_rows) = rows.split_at(n_test);
    Ok(TrainTestSplit {
        train: Partition::from_rows(samples, train_rows),
        test: Partition::from_rows(samples, test_rows),
    })
}
