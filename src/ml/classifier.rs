//! Response classifier trait definition.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::ml::features::FeatureVector;

/// Integer id of a distinct response text.
pub type LabelId = u32;

/// Outcome of a vote-based prediction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prediction {
    /// Winning label.
    pub label: LabelId,
    /// Votes cast for the winning label.
    pub votes: usize,
    /// Votes cast in total.
    pub total_votes: usize,
}

impl Prediction {
    /// Fraction of the votes won by the predicted label.
    pub fn vote_share(&self) -> f64 {
        if self.total_votes == 0 {
            0.0
        } else {
            self.votes as f64 / self.total_votes as f64
        }
    }
}

/// Response classifier trait.
///
/// Any multi-class model over count vectors fits behind this seam: a random
/// forest, naive Bayes or a logistic baseline. Implementations must be
/// deterministic for a fixed configuration and training set.
pub trait ResponseClassifier: Send + Sync {
    /// Fit the model on feature matrix `features` and parallel labels `labels`.
    ///
    /// Fails with a training error when the matrix is degenerate (no rows, no
    /// columns, all-zero rows, or fewer than two classes).
    fn fit(&mut self, features: &[FeatureVector], labels: &[LabelId]) -> Result<()>;

    /// Predict the label for a feature vector.
    ///
    /// Returns `None` when the model is untrained or the vector does not have
    /// the width the model was fitted on.
    fn predict(&self, features: &FeatureVector) -> Option<Prediction>;

    /// Check if the model has been fitted.
    fn is_trained(&self) -> bool;

    /// Get the name of this classifier for debugging and logging.
    fn name(&self) -> &str;

    /// Hyperparameters worth recording in model metadata.
    fn hyperparameters(&self) -> BTreeMap<String, f64> {
        BTreeMap::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vote_share() {
        let prediction = Prediction {
            label: 3,
            votes: 15,
            total_votes: 25,
        };
        assert!((prediction.vote_share() - 0.6).abs() < f64::EPSILON);

        let empty = Prediction {
            label: 0,
            votes: 0,
            total_votes: 0,
        };
        assert_eq!(empty.vote_share(), 0.0);
    }
}
