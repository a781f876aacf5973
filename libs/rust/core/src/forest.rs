//! Bagged decision-tree classifier.
//!
//! Each site fits one of these on its local dataset. Trees are grown with
//! exhaustive gini split search and trained on bootstrap resamples drawn
//! from a seeded RNG, so a fixed seed reproduces the same model bit for bit.
//! Every node keeps its class distribution, which is what both probability
//! prediction and decision-path attribution read.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::schema::{FeatureRow, FEATURE_COUNT};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct Node {
    pub(crate) feature: usize,
    pub(crate) threshold: f64,
    pub(crate) left: Option<usize>,
    pub(crate) right: Option<usize>,
    /// Class distribution of the training samples routed through this node.
    pub(crate) value: [f64; 2],
}

impl Node {
    pub(crate) fn is_leaf(&self) -> bool {
        self.left.is_none()
    }
}

/// A single decision tree. Nodes live in an arena with the root at index 0.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTree {
    pub(crate) nodes: Vec<Node>,
}

struct Split {
    feature: usize,
    threshold: f64,
    impurity: f64,
}

impl DecisionTree {
    pub fn fit(features: &[FeatureRow], labels: &[usize], indices: &[usize], max_depth: usize) -> Self {
        let mut tree = DecisionTree { nodes: Vec::new() };
        if !indices.is_empty() {
            tree.build(features, labels, indices, 0, max_depth);
        }
        tree
    }

    /// Single-leaf tree with a fixed class distribution.
    #[cfg(test)]
    pub(crate) fn constant(value: [f64; 2]) -> Self {
        DecisionTree {
            nodes: vec![Node { feature: 0, threshold: 0.0, left: None, right: None, value }],
        }
    }

    fn build(
        &mut self,
        features: &[FeatureRow],
        labels: &[usize],
        indices: &[usize],
        depth: usize,
        max_depth: usize,
    ) -> usize {
        let counts = class_counts(labels, indices);
        let n = indices.len() as f64;
        let value = [counts[0] as f64 / n, counts[1] as f64 / n];
        let id = self.nodes.len();
        self.nodes.push(Node { feature: 0, threshold: 0.0, left: None, right: None, value });

        let pure = counts[0] == 0 || counts[1] == 0;
        if depth >= max_depth || indices.len() < 2 || pure {
            return id;
        }
        let Some(split) = best_split(features, labels, indices, &counts) else {
            return id;
        };

        let (left_idx, right_idx): (Vec<usize>, Vec<usize>) = indices
            .iter()
            .partition(|&&i| features[i][split.feature] <= split.threshold);
        let left = self.build(features, labels, &left_idx, depth + 1, max_depth);
        let right = self.build(features, labels, &right_idx, depth + 1, max_depth);

        let node = &mut self.nodes[id];
        node.feature = split.feature;
        node.threshold = split.threshold;
        node.left = Some(left);
        node.right = Some(right);
        id
    }

    /// Class probabilities at the leaf this row routes to.
    pub fn predict_proba(&self, row: &FeatureRow) -> [f64; 2] {
        let Some(mut node) = self.nodes.first() else {
            return [0.0, 0.0];
        };
        while let (Some(l), Some(r)) = (node.left, node.right) {
            let next = if row[node.feature] <= node.threshold { l } else { r };
            node = &self.nodes[next];
        }
        node.value
    }
}

/// Bagged ensemble of decision trees.
///
/// Trained models are immutable values: the only capability they expose is
/// producing a class-probability vector for a canonical-order feature row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomForest {
    pub(crate) trees: Vec<DecisionTree>,
}

impl RandomForest {
    /// Fit `n_trees` trees, each on a full-size bootstrap resample.
    ///
    /// Tree `t` draws from a RNG seeded with `seed + t`, so the whole
    /// ensemble is reproducible for a fixed seed.
    pub fn fit(
        features: &[FeatureRow],
        labels: &[usize],
        n_trees: usize,
        max_depth: usize,
        seed: u64,
    ) -> Self {
        let n = features.len();
        if n == 0 {
            return RandomForest { trees: Vec::new() };
        }
        let mut trees = Vec::with_capacity(n_trees);
        for t in 0..n_trees {
            let mut rng = StdRng::seed_from_u64(seed.wrapping_add(t as u64));
            let bootstrap: Vec<usize> = (0..n).map(|_| rng.gen_range(0..n)).collect();
            trees.push(DecisionTree::fit(features, labels, &bootstrap, max_depth));
        }
        RandomForest { trees }
    }

    /// Mean of the per-tree class probabilities.
    pub fn predict_proba(&self, row: &FeatureRow) -> [f64; 2] {
        if self.trees.is_empty() {
            return [0.0, 0.0];
        }
        let mut acc = [0.0, 0.0];
        for tree in &self.trees {
            let p = tree.predict_proba(row);
            acc[0] += p[0];
            acc[1] += p[1];
        }
        let n = self.trees.len() as f64;
        [acc[0] / n, acc[1] / n]
    }

    pub fn tree_count(&self) -> usize {
        self.trees.len()
    }
}

fn class_counts(labels: &[usize], indices: &[usize]) -> [usize; 2] {
    let mut counts = [0usize; 2];
    for &i in indices {
        counts[labels[i].min(1)] += 1;
    }
    counts
}

fn gini(counts: &[usize; 2]) -> f64 {
    let n = (counts[0] + counts[1]) as f64;
    if n == 0.0 {
        return 0.0;
    }
    let p0 = counts[0] as f64 / n;
    let p1 = counts[1] as f64 / n;
    1.0 - p0 * p0 - p1 * p1
}

/// Exhaustive split search: every feature, every midpoint between distinct
/// consecutive sorted values. Returns the split with the lowest weighted
/// child impurity, or None when nothing improves on the parent.
fn best_split(
    features: &[FeatureRow],
    labels: &[usize],
    indices: &[usize],
    parent_counts: &[usize; 2],
) -> Option<Split> {
    let n = indices.len() as f64;
    let parent = gini(parent_counts);
    let mut best: Option<Split> = None;

    for feature in 0..FEATURE_COUNT {
        let mut vals: Vec<(f64, usize)> =
            indices.iter().map(|&i| (features[i][feature], labels[i].min(1))).collect();
        vals.sort_by(|a, b| a.0.total_cmp(&b.0));

        let mut left = [0usize; 2];
        for i in 0..vals.len() - 1 {
            left[vals[i].1] += 1;
            if vals[i].0 == vals[i + 1].0 {
                continue;
            }
            let right = [parent_counts[0] - left[0], parent_counts[1] - left[1]];
            let nl = (i + 1) as f64;
            let weighted = (nl * gini(&left) + (n - nl) * gini(&right)) / n;
            let bar = best.as_ref().map(|s| s.impurity).unwrap_or(parent - 1e-12);
            if weighted < bar {
                best = Some(Split {
                    feature,
                    threshold: (vals[i].0 + vals[i + 1].0) / 2.0,
                    impurity: weighted,
                });
            }
        }
    }
    best
}
