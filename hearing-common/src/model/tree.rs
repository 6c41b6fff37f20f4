//! CART decision tree grown with the Gini criterion

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::features::{FeatureVector, FEATURE_COUNT};
use crate::labels::{ClassLabel, CLASS_COUNT};

/// Tree node stored in a flat arena; children are indices into it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Node {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        /// Class probabilities at this leaf
        distribution: [f64; CLASS_COUNT],
    },
}

/// Growth limits for a single tree
#[derive(Debug, Clone, Copy)]
pub(crate) struct TreeParams {
    pub max_features: usize,
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    nodes: Vec<Node>,
}

struct Split {
    feature: usize,
    threshold: f64,
    decrease: f64,
}

impl DecisionTree {
    /// Grow a tree on the rows listed in `sample` (indices may repeat).
    ///
    /// Weighted impurity decrease per feature is added to `importances`.
    pub(crate) fn grow<R: Rng>(
        features: &[FeatureVector],
        labels: &[ClassLabel],
        sample: Vec<usize>,
        params: &TreeParams,
        rng: &mut R,
        importances: &mut [f64; FEATURE_COUNT],
    ) -> Self {
        let mut nodes = vec![placeholder()];
        let mut pending = vec![(0usize, sample, 0usize)];

        while let Some((slot, rows, depth)) = pending.pop() {
            let counts = class_counts(labels, &rows);
            let n = rows.len();
            let impurity = gini(&counts, n);

            let splittable = impurity > 0.0
                && n >= params.min_samples_split
                && n >= 2 * params.min_samples_leaf
                && params.max_depth.map_or(true, |max| depth < max);

            let split = if splittable {
                best_split(features, labels, &rows, &counts, impurity, params, rng)
            } else {
                None
            };

            match split {
                None => nodes[slot] = leaf(&counts, n),
                Some(split) => {
                    importances[split.feature] += split.decrease;
                    let (left_rows, right_rows): (Vec<usize>, Vec<usize>) = rows
                        .into_iter()
                        .partition(|&row| features[row][split.feature] <= split.threshold);

                    let left = nodes.len();
                    nodes.push(placeholder());
                    let right = nodes.len();
                    nodes.push(placeholder());
                    nodes[slot] = Node::Split {
                        feature: split.feature,
                        threshold: split.threshold,
                        left,
                        right,
                    };

                    pending.push((right, right_rows, depth + 1));
                    pending.push((left, left_rows, depth + 1));
                }
            }
        }

        Self { nodes }
    }

    /// Class distribution of the leaf `x` falls into
    pub fn distribution(&self, x: &FeatureVector) -> &[f64; CLASS_COUNT] {
        let mut index = 0;
        loop {
            match &self.nodes[index] {
                Node::Leaf { distribution } => return distribution,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    index = if x[*feature] <= *threshold { *left } else { *right };
                }
            }
        }
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn depth(&self) -> usize {
        fn walk(nodes: &[Node], index: usize) -> usize {
            match &nodes[index] {
                Node::Leaf { .. } => 0,
                Node::Split { left, right, .. } => 1 + walk(nodes, *left).max(walk(nodes, *right)),
            }
        }
        walk(&self.nodes, 0)
    }

    /// All split thresholds and leaf probabilities are finite numbers
    pub(crate) fn is_finite(&self) -> bool {
        self.nodes.iter().all(|node| match node {
            Node::Split { threshold, .. } => threshold.is_finite(),
            Node::Leaf { distribution } => distribution.iter().all(|p| p.is_finite()),
        })
    }

    #[cfg(test)]
    pub(crate) fn from_nodes(nodes: Vec<Node>) -> Self {
        Self { nodes }
    }

    /// Structural check used when a tree is read back from disk
    pub(crate) fn is_well_formed(&self) -> bool {
        if self.nodes.is_empty() {
            return false;
        }
        self.nodes.iter().enumerate().all(|(i, node)| match node {
            Node::Leaf { .. } => true,
            Node::Split {
                feature,
                left,
                right,
                ..
            } => {
                *feature < FEATURE_COUNT
                    && *left > i
                    && *right > i
                    && *left < self.nodes.len()
                    && *right < self.nodes.len()
            }
        })
    }
}

fn placeholder() -> Node {
    Node::Leaf {
        distribution: [0.0; CLASS_COUNT],
    }
}

fn leaf(counts: &[usize; CLASS_COUNT], n: usize) -> Node {
    let mut distribution = [0.0; CLASS_COUNT];
    if n > 0 {
        for (p, &c) in distribution.iter_mut().zip(counts) {
            *p = c as f64 / n as f64;
        }
    }
    Node::Leaf { distribution }
}

fn class_counts(labels: &[ClassLabel], rows: &[usize]) -> [usize; CLASS_COUNT] {
    let mut counts = [0usize; CLASS_COUNT];
    for &row in rows {
        counts[labels[row].index()] += 1;
    }
    counts
}

fn gini(counts: &[usize; CLASS_COUNT], n: usize) -> f64 {
    if n == 0 {
        return 0.0;
    }
    let n = n as f64;
    1.0 - counts
        .iter()
        .map(|&c| {
            let p = c as f64 / n;
            p * p
        })
        .sum::<f64>()
}

/// Search a random subset of features for the split with the largest
/// weighted impurity decrease. Constant features do not use up the budget.
fn best_split<R: Rng>(
    features: &[FeatureVector],
    labels: &[ClassLabel],
    rows: &[usize],
    counts: &[usize; CLASS_COUNT],
    impurity: f64,
    params: &TreeParams,
    rng: &mut R,
) -> Option<Split> {
    let n = rows.len();
    let parent = n as f64 * impurity;

    let mut order: Vec<usize> = (0..FEATURE_COUNT).collect();
    order.shuffle(rng);

    let mut best: Option<Split> = None;
    let mut visited = 0;

    for feature in order {
        if visited >= params.max_features && best.is_some() {
            break;
        }

        let mut column: Vec<(f64, usize)> = rows
            .iter()
            .map(|&row| (features[row][feature], labels[row].index()))
            .collect();
        column.sort_by(|a, b| a.0.total_cmp(&b.0));

        if column[0].0 == column[n - 1].0 {
            continue;
        }
        visited += 1;

        let mut left = [0usize; CLASS_COUNT];
        for pos in 0..n - 1 {
            left[column[pos].1] += 1;
            if column[pos].0 == column[pos + 1].0 {
                continue;
            }
            let n_left = pos + 1;
            let n_right = n - n_left;
            if n_left < params.min_samples_leaf || n_right < params.min_samples_leaf {
                continue;
            }

            let mut right = [0usize; CLASS_COUNT];
            for class in 0..CLASS_COUNT {
                right[class] = counts[class] - left[class];
            }
            let decrease = parent
                - n_left as f64 * gini(&left, n_left)
                - n_right as f64 * gini(&right, n_right);

            if best.as_ref().map_or(true, |b| decrease > b.decrease) {
                let (lo, hi) = (column[pos].0, column[pos + 1].0);
                let mut threshold = lo + (hi - lo) / 2.0;
                if threshold >= hi || !threshold.is_finite() {
                    threshold = lo;
                }
                best = Some(Split {
                    feature,
                    threshold,
                    decrease,
                });
            }
        }
    }

    best
}
