//! Decision tree classifier
//!
//! CART-style tree grown by minimising weighted Gini impurity. Sample weights
//! let the same tree serve as a bagged forest member (unit weights over a
//! bootstrap sample) and as a boosting stump (AdaBoost weights, depth 1).
//!
//! Nodes live in a flat arena with the root at index 0.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::matrix::FeatureMatrix;

/// Smallest impurity decrease that still counts as a split
const MIN_GAIN: f64 = 1e-12;

/// A single node in the tree arena
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) enum TreeNode {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        class: usize,
    },
}

/// Growth limits for a single tree
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TreeParams {
    /// Maximum depth; unlimited when `None`
    pub max_depth: Option<usize>,
    /// Nodes with fewer samples become leaves
    pub min_samples_split: usize,
    /// Features examined per split; all when `None`
    pub max_features: Option<usize>,
}

impl Default for TreeParams {
    fn default() -> Self {
        Self {
            max_depth: None,
            min_samples_split: 2,
            max_features: None,
        }
    }
}

/// A fitted decision tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    nodes: Vec<TreeNode>,
}

impl DecisionTree {
    /// Fit on the rows listed in `indices` (duplicates allowed), weighting
    /// each occurrence by `weights[row]`
    ///
    /// `labels` must lie in `0..n_classes`; `indices` must be non-empty.
    pub(crate) fn fit_weighted<R: Rng + ?Sized>(
        x: &FeatureMatrix,
        labels: &[usize],
        weights: &[f64],
        indices: &[usize],
        n_classes: usize,
        params: &TreeParams,
        rng: &mut R,
    ) -> Self {
        let mut builder = TreeBuilder {
            x,
            labels,
            weights,
            n_classes: n_classes.max(1),
            params,
            rng,
            nodes: Vec::new(),
        };
        let mut indices = indices.to_vec();
        builder.build(&mut indices, 0);
        Self { nodes: builder.nodes }
    }

    /// Predict the class of a single row
    pub fn predict(&self, row: &[f64]) -> usize {
        let mut idx = 0;
        loop {
            match &self.nodes[idx] {
                TreeNode::Leaf { class } => return *class,
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    idx = if row[*feature] <= *threshold { *left } else { *right };
                }
            }
        }
    }

    /// Number of nodes in the arena
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Depth of the deepest leaf (root only = 0)
    pub fn depth(&self) -> usize {
        fn walk(nodes: &[TreeNode], idx: usize) -> usize {
            match &nodes[idx] {
                TreeNode::Leaf { .. } => 0,
                TreeNode::Split { left, right, .. } => 1 + walk(nodes, *left).max(walk(nodes, *right)),
            }
        }
        walk(&self.nodes, 0)
    }
}

struct TreeBuilder<'a, R: ?Sized> {
    x: &'a FeatureMatrix,
    labels: &'a [usize],
    weights: &'a [f64],
    n_classes: usize,
    params: &'a TreeParams,
    rng: &'a mut R,
    nodes: Vec<TreeNode>,
}

impl<R: Rng + ?Sized> TreeBuilder<'_, R> {
    /// Grow the subtree for `indices`, returning its arena index
    fn build(&mut self, indices: &mut [usize], depth: usize) -> usize {
        let counts = self.class_weights(indices);
        let majority = argmax(&counts);

        let depth_reached = self.params.max_depth.is_some_and(|max| depth >= max);
        let pure = counts.iter().filter(|&&w| w > 0.0).count() <= 1;
        if depth_reached || pure || indices.len() < self.params.min_samples_split.max(2) {
            return self.push(TreeNode::Leaf { class: majority });
        }

        let Some((feature, threshold)) = self.best_split(indices, &counts) else {
            return self.push(TreeNode::Leaf { class: majority });
        };

        let split_at = partition(indices, |i| self.x.value(i, feature) <= threshold);
        if split_at == 0 || split_at == indices.len() {
            return self.push(TreeNode::Leaf { class: majority });
        }

        // Reserve the split slot so the root stays at index 0
        let node_idx = self.push(TreeNode::Leaf { class: majority });
        let (left_indices, right_indices) = indices.split_at_mut(split_at);
        let left = self.build(left_indices, depth + 1);
        let right = self.build(right_indices, depth + 1);
        self.nodes[node_idx] = TreeNode::Split {
            feature,
            threshold,
            left,
            right,
        };
        node_idx
    }

    fn push(&mut self, node: TreeNode) -> usize {
        self.nodes.push(node);
        self.nodes.len() - 1
    }

    fn class_weights(&self, indices: &[usize]) -> Vec<f64> {
        let mut counts = vec![0.0; self.n_classes];
        for &i in indices {
            counts[self.labels[i]] += self.weights[i];
        }
        counts
    }

    /// Every feature, shuffled when only a subset is examined per split
    fn feature_order(&mut self) -> Vec<usize> {
        let n_features = self.x.n_features();
        match self.params.max_features {
            Some(m) if m > 0 && m < n_features => {
                rand::seq::index::sample(&mut *self.rng, n_features, n_features).into_vec()
            }
            _ => (0..n_features).collect(),
        }
    }

    /// Best `(feature, threshold)` by weighted Gini decrease
    ///
    /// Examines `max_features` features, and keeps going through the rest
    /// only while no valid split has been found.
    fn best_split(&mut self, indices: &[usize], parent_counts: &[f64]) -> Option<(usize, f64)> {
        let total: f64 = parent_counts.iter().sum();
        if total <= 0.0 {
            return None;
        }
        let parent_gini = gini(parent_counts, total);
        let limit = self.params.max_features.unwrap_or(usize::MAX).max(1);

        let mut best: Option<(usize, f64)> = None;
        let mut best_gain = MIN_GAIN;
        let mut sorted: Vec<(f64, usize, f64)> = Vec::with_capacity(indices.len());

        for (visited, feature) in self.feature_order().into_iter().enumerate() {
            if visited >= limit && best.is_some() {
                break;
            }
            sorted.clear();
            sorted.extend(
                indices
                    .iter()
                    .map(|&i| (self.x.value(i, feature), self.labels[i], self.weights[i])),
            );
            sorted.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));

            let mut left = vec![0.0; self.n_classes];
            let mut left_total = 0.0;
            for pos in 0..sorted.len() - 1 {
                let (value, label, weight) = sorted[pos];
                left[label] += weight;
                left_total += weight;

                let next_value = sorted[pos + 1].0;
                if next_value <= value {
                    continue;
                }

                let right_total = total - left_total;
                if left_total <= 0.0 || right_total <= 0.0 {
                    continue;
                }
                let right: Vec<f64> = parent_counts
                    .iter()
                    .zip(&left)
                    .map(|(p, l)| p - l)
                    .collect();
                let weighted = (left_total * gini(&left, left_total)
                    + right_total * gini(&right, right_total))
                    / total;
                let gain = parent_gini - weighted;

                if gain > best_gain {
                    best_gain = gain;
                    best = Some((feature, (value + next_value) / 2.0));
                }
            }
        }

        best
    }
}

fn gini(counts: &[f64], total: f64) -> f64 {
    1.0 - counts.iter().map(|c| (c / total) * (c / total)).sum::<f64>()
}

/// Index of the largest entry; ties go to the lowest index
pub(crate) fn argmax(values: &[f64]) -> usize {
    let mut best = 0;
    for (idx, value) in values.iter().enumerate() {
        if *value > values[best] {
            best = idx;
        }
    }
    best
}

/// Move entries satisfying `pred` to the front, returning how many there are
fn partition(indices: &mut [usize], pred: impl Fn(usize) -> bool) -> usize {
    let mut split = 0;
    for pos in 0..indices.len() {
        if pred(indices[pos]) {
            indices.swap(split, pos);
            split += 1;
        }
    }
    split
}
