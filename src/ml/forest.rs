//! Bagged decision-tree ensemble (random forest) for response classification.

use std::collections::BTreeMap;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config::ForestConfig;
use crate::error::{ColloquyError, Result};
use crate::ml::classifier::{LabelId, Prediction, ResponseClassifier};
use crate::ml::features::FeatureVector;

/// Multiplier used to spread per-tree seeds (golden-ratio increment).
const SEED_STRIDE: u64 = 0x9E37_79B9_7F4A_7C15;

/// Random forest classifier over count vectors.
///
/// Each tree sees a bootstrap sample of the rows and a random subset of the
/// feature columns. Trees are fitted in parallel, but every tree draws from its
/// own generator derived from the configured seed and its index, so the fitted
/// forest does not depend on thread scheduling.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomForestClassifier {
    /// Ensemble hyperparameters.
    config: ForestConfig,
    /// Fitted trees.
    trees: Vec<DecisionTree>,
    /// Feature-vector width seen during fitting.
    n_features: usize,
}

impl RandomForestClassifier {
    /// Create an unfitted forest.
    pub fn new(config: ForestConfig) -> Self {
        Self {
            config,
            trees: Vec::new(),
            n_features: 0,
        }
    }

    /// Get the ensemble configuration.
    pub fn config(&self) -> &ForestConfig {
        &self.config
    }

    /// Fitted trees.
    pub fn trees(&self) -> &[DecisionTree] {
        &self.trees
    }

    /// Number of columns each tree is allowed to split on.
    fn features_per_tree(&self, n_features: usize) -> usize {
        ((self.config.max_features * n_features as f64).ceil() as usize).clamp(1, n_features)
    }

    /// Fit one tree with its own generator.
    fn fit_tree(
        &self,
        tree_idx: usize,
        features: &[FeatureVector],
        labels: &[LabelId],
    ) -> Result<DecisionTree> {
        let seed = self.config.seed ^ (tree_idx as u64).wrapping_add(1).wrapping_mul(SEED_STRIDE);
        let mut rng = StdRng::seed_from_u64(seed);
        let n_rows = features.len();

        let rows: Vec<usize> = if self.config.bootstrap {
            (0..n_rows).map(|_| rng.random_range(0..n_rows)).collect()
        } else {
            (0..n_rows).collect()
        };

        let mut columns =
            rand::seq::index::sample(&mut rng, self.n_features, self.features_per_tree(self.n_features))
                .into_vec();
        columns.sort_unstable();

        DecisionTree::fit(
            features,
            labels,
            &rows,
            &columns,
            self.config.max_depth,
            self.config.min_samples_split,
        )
    }
}

impl ResponseClassifier for RandomForestClassifier {
    fn fit(&mut self, features: &[FeatureVector], labels: &[LabelId]) -> Result<()> {
        self.config
            .validate()
            .map_err(|e| ColloquyError::training(e.to_string()))?;
        validate_matrix(features, labels)?;

        self.n_features = features[0].len();
        let trees = (0..self.config.n_estimators)
            .into_par_iter()
            .map(|tree_idx| self.fit_tree(tree_idx, features, labels))
            .collect::<Result<Vec<_>>>();

        match trees {
            Ok(trees) => {
                log::debug!(
                    "fitted {} trees ({} nodes) on {} rows x {} columns",
                    trees.len(),
                    trees.iter().map(DecisionTree::node_count).sum::<usize>(),
                    features.len(),
                    self.n_features
                );
                self.trees = trees;
                Ok(())
            }
            Err(e) => {
                self.trees.clear();
                self.n_features = 0;
                Err(e)
            }
        }
    }

    fn predict(&self, features: &FeatureVector) -> Option<Prediction> {
        if self.trees.is_empty() || features.len() != self.n_features {
            return None;
        }

        let mut votes: BTreeMap<LabelId, usize> = BTreeMap::new();
        for tree in &self.trees {
            if let Some(label) = tree.predict(features) {
                *votes.entry(label).or_insert(0) += 1;
            }
        }

        let total_votes = votes.values().sum();
        majority(&votes).map(|(label, votes)| Prediction {
            label,
            votes,
            total_votes,
        })
    }

    fn is_trained(&self) -> bool {
        !self.trees.is_empty()
    }

    fn name(&self) -> &str {
        "random_forest"
    }

    fn hyperparameters(&self) -> BTreeMap<String, f64> {
        BTreeMap::from([
            ("n_estimators".to_string(), self.config.n_estimators as f64),
            ("max_features".to_string(), self.config.max_features),
            ("max_depth".to_string(), self.config.max_depth as f64),
            (
                "min_samples_split".to_string(),
                self.config.min_samples_split as f64,
            ),
            ("seed".to_string(), self.config.seed as f64),
        ])
    }
}

/// Reject matrices no tree can learn from.
fn validate_matrix(features: &[FeatureVector], labels: &[LabelId]) -> Result<()> {
    if features.is_empty() {
        return Err(ColloquyError::training("feature matrix has no rows"));
    }
    if features.len() != labels.len() {
        return Err(ColloquyError::training(format!(
            "feature matrix has {} rows but {} labels were given",
            features.len(),
            labels.len()
        )));
    }

    let width = features[0].len();
    if width == 0 {
        return Err(ColloquyError::training("feature matrix has no columns"));
    }
    if features.iter().any(|row| row.len() != width) {
        return Err(ColloquyError::training("feature rows have differing lengths"));
    }
    if features.iter().all(FeatureVector::is_zero) {
        return Err(ColloquyError::training("every feature row is all zero"));
    }

    let mut classes: Vec<LabelId> = labels.to_vec();
    classes.sort_unstable();
    classes.dedup();
    if classes.len() < 2 {
        return Err(ColloquyError::training(format!(
            "need at least 2 classes, got {}",
            classes.len()
        )));
    }

    Ok(())
}

/// Label with the most votes; ties go to the lowest label id.
fn majority(counts: &BTreeMap<LabelId, usize>) -> Option<(LabelId, usize)> {
    let mut best: Option<(LabelId, usize)> = None;
    for (&label, &count) in counts {
        match best {
            Some((_, best_count)) if count <= best_count => {}
            _ => best = Some((label, count)),
        }
    }
    best
}

/// Gini impurity of a label histogram.
fn gini(counts: &BTreeMap<LabelId, usize>, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let total = total as f64;
    1.0 - counts
        .values()
        .map(|&c| {
            let p = c as f64 / total;
            p * p
        })
        .sum::<f64>()
}

/// Classification tree splitting on count thresholds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTree {
    root: Option<Box<TreeNode>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct TreeNode {
    /// Feature index for split (-1 for leaf).
    feature_idx: i32,
    /// Threshold value for split; values `<=` go left.
    threshold: f64,
    /// Majority label of the rows that reached this node.
    label: LabelId,
    /// Left child.
    left: Option<Box<TreeNode>>,
    /// Right child.
    right: Option<Box<TreeNode>>,
}

impl TreeNode {
    fn leaf(label: LabelId) -> Box<Self> {
        Box::new(TreeNode {
            feature_idx: -1,
            threshold: 0.0,
            label,
            left: None,
            right: None,
        })
    }
}

/// Best split found for a node.
struct Split {
    feature_idx: usize,
    threshold: f64,
    left: Vec<usize>,
    right: Vec<usize>,
}

impl Default for DecisionTree {
    fn default() -> Self {
        Self::new()
    }
}

impl DecisionTree {
    /// Create a new empty decision tree.
    pub fn new() -> Self {
        Self { root: None }
    }

    /// Fit a tree on the given rows (repeats allowed) using only `columns`.
    pub fn fit(
        features: &[FeatureVector],
        labels: &[LabelId],
        rows: &[usize],
        columns: &[usize],
        max_depth: usize,
        min_samples_split: usize,
    ) -> Result<Self> {
        if features.len() != labels.len() {
            return Err(ColloquyError::training(
                "features and labels length mismatch",
            ));
        }
        if let Some(&row) = rows.iter().find(|&&row| row >= features.len()) {
            return Err(ColloquyError::training(format!(
                "row index {row} out of range"
            )));
        }

        let root = Self::build_tree(
            features,
            labels,
            rows,
            columns,
            0,
            max_depth,
            min_samples_split,
        );

        Ok(Self { root })
    }

    /// Predict a label, or `None` for an unfitted tree.
    pub fn predict(&self, features: &FeatureVector) -> Option<LabelId> {
        self.root
            .as_ref()
            .map(|root| Self::predict_node(root, features))
    }

    /// Number of nodes in the tree.
    pub fn node_count(&self) -> usize {
        fn count(node: &Option<Box<TreeNode>>) -> usize {
            match node {
                Some(node) => 1 + count(&node.left) + count(&node.right),
                None => 0,
            }
        }
        count(&self.root)
    }

    /// Recursively build the tree.
    ///
    /// Stops splitting when the node is pure, the maximum depth is reached,
    /// too few rows remain, or no split lowers the impurity.
    fn build_tree(
        features: &[FeatureVector],
        labels: &[LabelId],
        rows: &[usize],
        columns: &[usize],
        depth: usize,
        max_depth: usize,
        min_samples_split: usize,
    ) -> Option<Box<TreeNode>> {
        let histogram = Self::histogram(labels, rows);
        let (label, _) = majority(&histogram)?;

        if histogram.len() == 1 || depth >= max_depth || rows.len() < min_samples_split {
            return Some(TreeNode::leaf(label));
        }

        let parent_impurity = gini(&histogram, rows.len());
        match Self::find_best_split(features, labels, rows, columns, parent_impurity) {
            Some(split) => {
                let left = Self::build_tree(
                    features,
                    labels,
                    &split.left,
                    columns,
                    depth + 1,
                    max_depth,
                    min_samples_split,
                );
                let right = Self::build_tree(
                    features,
                    labels,
                    &split.right,
                    columns,
                    depth + 1,
                    max_depth,
                    min_samples_split,
                );

                Some(Box::new(TreeNode {
                    feature_idx: split.feature_idx as i32,
                    threshold: split.threshold,
                    label,
                    left,
                    right,
                }))
            }
            None => Some(TreeNode::leaf(label)),
        }
    }

    fn histogram(labels: &[LabelId], rows: &[usize]) -> BTreeMap<LabelId, usize> {
        let mut histogram = BTreeMap::new();
        for &row in rows {
            *histogram.entry(labels[row]).or_insert(0) += 1;
        }
        histogram
    }

    /// Find the split with the lowest weighted Gini impurity.
    ///
    /// Candidate thresholds are midpoints between consecutive distinct values
    /// of each allowed column. Only splits that strictly improve on the parent
    /// impurity are returned; the first best split wins ties.
    fn find_best_split(
        features: &[FeatureVector],
        labels: &[LabelId],
        rows: &[usize],
        columns: &[usize],
        parent_impurity: f64,
    ) -> Option<Split> {
        let n = rows.len();
        let mut best_impurity = parent_impurity - f64::EPSILON;
        let mut best: Option<(usize, f64, usize)> = None;
        let mut best_order: Vec<(u32, usize)> = Vec::new();

        for &column in columns {
            let mut values: Vec<(u32, usize)> =
                rows.iter().map(|&row| (features[row].get(column), row)).collect();
            values.sort_unstable();

            if values[0].0 == values[n - 1].0 {
                continue;
            }

            let mut left_counts: BTreeMap<LabelId, usize> = BTreeMap::new();
            let mut right_counts = Self::histogram(labels, rows);

            for i in 1..n {
                let moved = labels[values[i - 1].1];
                *left_counts.entry(moved).or_insert(0) += 1;
                if let Some(count) = right_counts.get_mut(&moved) {
                    *count -= 1;
                    if *count == 0 {
                        right_counts.remove(&moved);
                    }
                }

                if values[i - 1].0 == values[i].0 {
                    continue;
                }

                let impurity = (i as f64 * gini(&left_counts, i)
                    + (n - i) as f64 * gini(&right_counts, n - i))
                    / n as f64;

                if impurity < best_impurity {
                    best_impurity = impurity;
                    let threshold = (values[i - 1].0 as f64 + values[i].0 as f64) / 2.0;
                    best = Some((column, threshold, i));
                    best_order.clone_from(&values);
                }
            }
        }

        best.map(|(feature_idx, threshold, cut)| Split {
            feature_idx,
            threshold,
            left: best_order[..cut].iter().map(|&(_, row)| row).collect(),
            right: best_order[cut..].iter().map(|&(_, row)| row).collect(),
        })
    }

    fn predict_node(node: &TreeNode, features: &FeatureVector) -> LabelId {
        if node.feature_idx < 0 {
            return node.label;
        }

        let value = features.get(node.feature_idx as usize) as f64;
        let child = if value <= node.threshold {
            &node.left
        } else {
            &node.right
        };

        match child {
            Some(child) => Self::predict_node(child, features),
            None => node.label,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fv(counts: &[u32]) -> FeatureVector {
        FeatureVector::from(counts.to_vec())
    }

    /// Three classes, each identified by one dedicated column.
    fn separable() -> (Vec<FeatureVector>, Vec<LabelId>) {
        let features = vec![
            fv(&[1, 0, 0]),
            fv(&[2, 0, 0]),
            fv(&[0, 1, 0]),
            fv(&[0, 2, 0]),
            fv(&[0, 0, 1]),
            fv(&[0, 0, 3]),
        ];
        let labels = vec![0, 0, 1, 1, 2, 2];
        (features, labels)
    }

    #[test]
    fn test_decision_tree_creation() {
        let tree = DecisionTree::new();
        assert!(tree.root.is_none());
        assert_eq!(tree.predict(&fv(&[1, 0])), None);
        assert_eq!(tree.node_count(), 0);
    }

    #[test]
    fn test_decision_tree_fits_separable_data() {
        let (features, labels) = separable();
        let rows: Vec<usize> = (0..features.len()).collect();
        let tree = DecisionTree::fit(&features, &labels, &rows, &[0, 1, 2], 8, 2).unwrap();

        for (row, label) in features.iter().zip(&labels) {
            assert_eq!(tree.predict(row), Some(*label));
        }
        assert!(tree.node_count() >= 5);
    }

    #[test]
    fn test_decision_tree_max_depth_limits_growth() {
        let (features, labels) = separable();
        let rows: Vec<usize> = (0..features.len()).collect();
        let tree = DecisionTree::fit(&features, &labels, &rows, &[0, 1, 2], 1, 2).unwrap();
        assert_eq!(tree.node_count(), 3);
    }

    #[test]
    fn test_decision_tree_pure_node_is_leaf() {
        let features = vec![fv(&[1, 0]), fv(&[0, 1])];
        let labels = vec![4, 4];
        let tree = DecisionTree::fit(&features, &labels, &[0, 1], &[0, 1], 8, 2).unwrap();
        assert_eq!(tree.node_count(), 1);
        assert_eq!(tree.predict(&fv(&[0, 0])), Some(4));
    }

    #[test]
    fn test_decision_tree_rejects_bad_rows() {
        let features = vec![fv(&[1])];
        let labels = vec![0];
        assert!(DecisionTree::fit(&features, &labels, &[3], &[0], 4, 2).is_err());
    }

    #[test]
    fn test_majority_breaks_ties_by_lowest_label() {
        let counts = BTreeMap::from([(5, 3), (2, 3), (9, 1)]);
        assert_eq!(majority(&counts), Some((2, 3)));
        assert_eq!(majority(&BTreeMap::new()), None);
    }

    #[test]
    fn test_gini() {
        let pure = BTreeMap::from([(0, 4)]);
        assert_eq!(gini(&pure, 4), 0.0);

        let even = BTreeMap::from([(0, 2), (1, 2)]);
        assert!((gini(&even, 4) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_forest_fits_separable_data() {
        let (features, labels) = separable();
        let config = ForestConfig {
            bootstrap: false,
            max_features: 1.0,
            ..ForestConfig::default()
        };
        let mut forest = RandomForestClassifier::new(config);
        forest.fit(&features, &labels).unwrap();

        assert!(forest.is_trained());
        assert_eq!(forest.trees().len(), 25);
        for (row, label) in features.iter().zip(&labels) {
            let prediction = forest.predict(row).unwrap();
            assert_eq!(prediction.label, *label);
            assert_eq!(prediction.total_votes, 25);
        }
    }

    #[test]
    fn test_forest_is_reproducible() {
        let (features, labels) = separable();
        let mut a = RandomForestClassifier::new(ForestConfig::default());
        let mut b = RandomForestClassifier::new(ForestConfig::default());
        a.fit(&features, &labels).unwrap();
        b.fit(&features, &labels).unwrap();

        for probe in [
            fv(&[1, 1, 0]),
            fv(&[0, 1, 1]),
            fv(&[3, 0, 3]),
            fv(&[0, 0, 0]),
        ] {
            assert_eq!(a.predict(&probe), b.predict(&probe));
        }
    }

    #[test]
    fn test_forest_rejects_degenerate_matrices() {
        let mut forest = RandomForestClassifier::new(ForestConfig::default());

        assert!(forest.fit(&[], &[]).is_err());
        assert!(forest.fit(&[fv(&[]), fv(&[])], &[0, 1]).is_err());
        assert!(forest.fit(&[fv(&[0, 0]), fv(&[0, 0])], &[0, 1]).is_err());
        assert!(forest.fit(&[fv(&[1, 0]), fv(&[0, 1])], &[0, 0]).is_err());
        assert!(forest.fit(&[fv(&[1, 0]), fv(&[0, 1])], &[0]).is_err());
        assert!(forest.fit(&[fv(&[1, 0]), fv(&[1])], &[0, 1]).is_err());

        let result = forest.fit(&[fv(&[0, 0]), fv(&[0, 0])], &[0, 1]);
        assert!(matches!(result, Err(ColloquyError::Training(_))));
        assert!(!forest.is_trained());
    }

    #[test]
    fn test_forest_predict_requires_matching_width() {
        let (features, labels) = separable();
        let mut forest = RandomForestClassifier::new(ForestConfig::default());
        assert_eq!(forest.predict(&fv(&[1, 0, 0])), None);

        forest.fit(&features, &labels).unwrap();
        assert_eq!(forest.predict(&fv(&[1, 0])), None);
        assert!(forest.predict(&fv(&[1, 0, 0])).is_some());
    }

    #[test]
    fn test_features_per_tree() {
        let forest = RandomForestClassifier::new(ForestConfig::default());
        assert_eq!(forest.features_per_tree(10), 8);
        assert_eq!(forest.features_per_tree(3), 3);
        assert_eq!(forest.features_per_tree(1), 1);
    }

    #[test]
    fn test_hyperparameters() {
        let forest = RandomForestClassifier::new(ForestConfig::default());
        let params = forest.hyperparameters();
        assert_eq!(params["n_estimators"], 25.0);
        assert_eq!(params["max_features"], 0.8);
        assert_eq!(forest.name(), "random_forest");
    }
}
