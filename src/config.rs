//! Engine configuration.
//!
//! All settings have defaults matching the built-in storefront assistant, so an
//! empty JSON object is a valid configuration file.
//!
//! ```
//! use colloquy::config::{EngineConfig, LabelPolicy};
//!
//! let config = EngineConfig::from_json(r#"{ "forest": { "n_estimators": 10 } }"#).unwrap();
//! assert_eq!(config.forest.n_estimators, 10);
//! assert_eq!(config.forest.seed, 42);
//! assert_eq!(config.label_policy, LabelPolicy::Stable);
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::chat::seed::default_fallbacks;
use crate::error::{ColloquyError, Result};

/// Hyperparameters of the bagged decision-tree ensemble.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForestConfig {
    /// Number of trees in the ensemble.
    pub n_estimators: usize,
    /// Fraction of the feature columns each tree may split on, in `(0, 1]`.
    pub max_features: f64,
    /// Draw each tree's rows with replacement.
    pub bootstrap: bool,
    /// Maximum tree depth.
    pub max_depth: usize,
    /// Minimum rows required to split a node.
    pub min_samples_split: usize,
    /// Random seed for reproducible results.
    pub seed: u64,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            n_estimators: 25,
            max_features: 0.8,
            bootstrap: true,
            max_depth: 12,
            min_samples_split: 2,
            seed: 42,
        }
    }
}

impl ForestConfig {
    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.n_estimators == 0 {
            return Err(ColloquyError::config("n_estimators must be > 0"));
        }
        if !(self.max_features > 0.0 && self.max_features <= 1.0) {
            return Err(ColloquyError::config(format!(
                "max_features must be in (0, 1], got {}",
                self.max_features
            )));
        }
        if self.max_depth == 0 {
            return Err(ColloquyError::config("max_depth must be > 0"));
        }
        if self.min_samples_split < 2 {
            return Err(ColloquyError::config("min_samples_split must be >= 2"));
        }
        Ok(())
    }
}

/// How response texts are numbered for the classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LabelPolicy {
    /// A response keeps the id it was first given for the lifetime of the engine.
    #[default]
    Stable,
    /// Ids are reassigned in first-seen order on every retrain.
    PerRetrain,
}

/// Configuration of one chat engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Ensemble hyperparameters.
    pub forest: ForestConfig,
    /// Label numbering policy.
    pub label_policy: LabelPolicy,
    /// Minimum share of tree votes the winning label needs before the
    /// classifier tier answers (0.0 disables the check).
    pub min_vote_share: f64,
    /// Generic responses used when nothing else matches. Must not be empty.
    pub fallback_responses: Vec<String>,
    /// Seed for fallback selection; `None` draws from OS entropy.
    pub fallback_seed: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            forest: ForestConfig::default(),
            label_policy: LabelPolicy::default(),
            min_vote_share: 0.0,
            fallback_responses: default_fallbacks(),
            fallback_seed: None,
        }
    }
}

impl EngineConfig {
    /// Parse a configuration from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: EngineConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration from a JSON file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Set the fallback seed.
    pub fn with_fallback_seed(mut self, seed: u64) -> Self {
        self.fallback_seed = Some(seed);
        self
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        self.forest.validate()?;

        if !(0.0..=1.0).contains(&self.min_vote_share) {
            return Err(ColloquyError::config(format!(
                "min_vote_share must be in [0, 1], got {}",
                self.min_vote_share
            )));
        }
        if self.fallback_responses.is_empty() {
            return Err(ColloquyError::config(
                "at least one fallback response is required",
            ));
        }
        if self.fallback_responses.iter().any(|r| r.trim().is_empty()) {
            return Err(ColloquyError::config("fallback responses must not be blank"));
        }
        Ok(())
    }
}
