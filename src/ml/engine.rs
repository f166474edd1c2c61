//! Classifier training and the trained-model snapshot.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::config::{ForestConfig, LabelPolicy};
use crate::error::Result;
use crate::ml::classifier::{LabelId, Prediction, ResponseClassifier};
use crate::ml::exemplar::ExemplarStore;
use crate::ml::features::{FeatureVector, FeatureVectorizer};
use crate::ml::forest::RandomForestClassifier;
use crate::ml::labels::LabelRegistry;
use crate::ml::vocabulary::Vocabulary;

/// Builds a fresh, unfitted classifier for each training pass.
pub type ClassifierFactory =
    Arc<dyn Fn(&ForestConfig) -> Box<dyn ResponseClassifier> + Send + Sync>;

/// The default factory: a [`RandomForestClassifier`].
pub fn random_forest_factory() -> ClassifierFactory {
    Arc::new(|config: &ForestConfig| {
        Box::new(RandomForestClassifier::new(config.clone())) as Box<dyn ResponseClassifier>
    })
}

/// Metadata recorded for every trained model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelMetadata {
    /// Classifier name.
    pub classifier: String,
    /// Training timestamp.
    pub trained_at: chrono::DateTime<chrono::Utc>,
    /// Number of exemplars the model was fitted on.
    pub training_examples: usize,
    /// Number of distinct responses (classes).
    pub label_count: usize,
    /// Feature-vector width.
    pub vocabulary_size: usize,
    /// Training time in milliseconds.
    pub training_time_ms: u64,
    /// Classifier hyperparameters.
    pub hyperparameters: BTreeMap<String, f64>,
}

/// A fitted classifier bundled with everything needed to interpret it: the
/// vocabulary that defines its feature space and the label to response map.
pub struct TrainedModel {
    classifier: Box<dyn ResponseClassifier>,
    vocabulary: Vocabulary,
    responses: BTreeMap<LabelId, String>,
    metadata: ModelMetadata,
}

impl std::fmt::Debug for TrainedModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrainedModel")
            .field("classifier", &self.classifier.name())
            .field("vocabulary_size", &self.vocabulary.len())
            .field("labels", &self.responses.len())
            .finish()
    }
}

impl TrainedModel {
    /// Vote on a feature vector built against [`TrainedModel::vocabulary`].
    pub fn predict(&self, features: &FeatureVector) -> Option<Prediction> {
        self.classifier.predict(features)
    }

    /// Response text of a label.
    pub fn response(&self, label: LabelId) -> Option<&str> {
        self.responses.get(&label).map(String::as_str)
    }

    /// The vocabulary the model was fitted against.
    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    /// Labels known to the model.
    pub fn labels(&self) -> impl Iterator<Item = LabelId> + '_ {
        self.responses.keys().copied()
    }

    /// Training metadata.
    pub fn metadata(&self) -> &ModelMetadata {
        &self.metadata
    }
}

/// Trains response classifiers from an exemplar store.
///
/// The engine owns the label registry, so label numbering follows the
/// configured [`LabelPolicy`] across training passes.
pub struct ClassifierEngine {
    config: ForestConfig,
    vectorizer: Arc<FeatureVectorizer>,
    labels: LabelRegistry,
    factory: ClassifierFactory,
}

impl std::fmt::Debug for ClassifierEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClassifierEngine")
            .field("config", &self.config)
            .field("vectorizer", &self.vectorizer)
            .field("labels", &self.labels.len())
            .finish()
    }
}

impl ClassifierEngine {
    /// Create an engine that trains random forests.
    pub fn new(
        config: ForestConfig,
        policy: LabelPolicy,
        vectorizer: Arc<FeatureVectorizer>,
    ) -> Self {
        Self::with_factory(config, policy, vectorizer, random_forest_factory())
    }

    /// Create an engine that trains classifiers built by `factory`.
    pub fn with_factory(
        config: ForestConfig,
        policy: LabelPolicy,
        vectorizer: Arc<FeatureVectorizer>,
        factory: ClassifierFactory,
    ) -> Self {
        Self {
            config,
            vectorizer,
            labels: LabelRegistry::new(policy),
            factory,
        }
    }

    /// Get the label registry.
    pub fn labels(&self) -> &LabelRegistry {
        &self.labels
    }

    /// Train a model on `store`, vectorized against `vocabulary`.
    ///
    /// Returns `Ok(None)` when the store holds fewer than two distinct
    /// responses: there is nothing to discriminate, so no model is built.
    /// Returns an error when the classifier cannot be fitted; the caller keeps
    /// whatever model it had before.
    pub fn train(
        &mut self,
        store: &ExemplarStore,
        vocabulary: &Vocabulary,
    ) -> Result<Option<TrainedModel>> {
        let start_time = Instant::now();
        let assignment = self.labels.assign(store.responses());

        if assignment.distinct() < 2 {
            log::debug!(
                "skipping classifier training: {} distinct response(s)",
                assignment.distinct()
            );
            return Ok(None);
        }

        let features = store
            .inputs()
            .map(|input| self.vectorizer.vectorize(input, vocabulary))
            .collect::<Result<Vec<_>>>()?;

        let mut classifier = (self.factory)(&self.config);
        classifier.fit(&features, &assignment.labels)?;

        let metadata = ModelMetadata {
            classifier: classifier.name().to_string(),
            trained_at: chrono::Utc::now(),
            training_examples: store.len(),
            label_count: assignment.distinct(),
            vocabulary_size: vocabulary.len(),
            training_time_ms: start_time.elapsed().as_millis() as u64,
            hyperparameters: classifier.hyperparameters(),
        };

        Ok(Some(TrainedModel {
            classifier,
            vocabulary: vocabulary.clone(),
            responses: assignment.responses,
            metadata,
        }))
    }
}
