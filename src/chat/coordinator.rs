//! Write path: teaching new exemplars and swapping in retrained knowledge.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::chat::engine::{ChatEngine, KnowledgeSnapshot};
use crate::error::Result;
use crate::ml::exemplar::{Exemplar, StoreChange};

/// What happened to the classifier during a training pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum ModelUpdate {
    /// A new model was trained and installed.
    Retrained {
        /// Distinct responses the model can predict.
        label_count: usize,
    },
    /// Fewer than two distinct responses; the classifier tier is disabled.
    Skipped {
        /// Distinct responses in the store.
        distinct_responses: usize,
    },
    /// Training failed and the previous model stays active.
    Retained {
        /// Training error message.
        error: String,
    },
    /// The store did not change, so nothing was retrained.
    Unchanged,
}

impl fmt::Display for ModelUpdate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelUpdate::Retrained { label_count } => {
                write!(f, "model retrained with {label_count} labels")
            }
            ModelUpdate::Skipped { distinct_responses } => write!(
                f,
                "classifier skipped with {distinct_responses} distinct response(s)"
            ),
            ModelUpdate::Retained { error } => write!(f, "previous model kept: {error}"),
            ModelUpdate::Unchanged => f.write_str("no changes"),
        }
    }
}

/// Result of a teaching call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainingOutcome {
    /// One entry per taught pair, in call order.
    pub changes: Vec<StoreChange>,
    /// Classifier outcome.
    pub model: ModelUpdate,
    /// Exemplars stored after the call.
    pub exemplar_count: usize,
    /// Vocabulary size after the call.
    pub vocabulary_size: usize,
    /// Snapshot version visible after the call.
    pub version: u64,
}

/// Write-side view of a [`ChatEngine`].
///
/// Teaching is serialized by the engine's trainer lock. The new exemplar store,
/// vocabulary and model are built off to the side and published with a single
/// pointer swap, so concurrent resolutions never observe a half-trained state.
#[derive(Debug, Clone, Copy)]
pub struct TrainingCoordinator<'a> {
    engine: &'a ChatEngine,
}

impl<'a> TrainingCoordinator<'a> {
    /// Create a coordinator over `engine`.
    pub fn new(engine: &'a ChatEngine) -> Self {
        Self { engine }
    }

    /// Teach one pair and retrain before returning.
    pub fn add_exemplar(&self, input: &str, response: &str) -> Result<TrainingOutcome> {
        self.add_exemplars(&[(input, response)])
    }

    /// Teach several pairs with a single retrain.
    ///
    /// Every pair is validated before anything is stored: one invalid pair
    /// rejects the whole batch and leaves the engine untouched.
    pub fn add_exemplars<I, R>(&self, pairs: &[(I, R)]) -> Result<TrainingOutcome>
    where
        I: AsRef<str>,
        R: AsRef<str>,
    {
        let exemplars = pairs
            .iter()
            .map(|(input, response)| Exemplar::new(input.as_ref(), response.as_ref()))
            .collect::<Result<Vec<_>>>()?;

        let start_time = Instant::now();
        let mut trainer = self.engine.trainer.lock();
        let current = self.engine.snapshot();

        let mut exemplars_next = current.exemplars.clone();
        let changes: Vec<StoreChange> = exemplars
            .into_iter()
            .map(|exemplar| exemplars_next.insert(exemplar))
            .collect();

        if changes.iter().all(|change| *change == StoreChange::Unchanged) {
            log::debug!(
                "session {}: nothing new to learn",
                self.engine.session_id
            );
            return Ok(TrainingOutcome {
                changes,
                model: ModelUpdate::Unchanged,
                exemplar_count: current.exemplars.len(),
                vocabulary_size: current.vocabulary.len(),
                version: current.version,
            });
        }

        let vocabulary = self
            .engine
            .vectorizer
            .build_vocabulary(exemplars_next.inputs())?;

        let (model, update) = match trainer.train(&exemplars_next, &vocabulary) {
            Ok(Some(model)) => {
                let label_count = model.metadata().label_count;
                (Some(Arc::new(model)), ModelUpdate::Retrained { label_count })
            }
            Ok(None) => {
                let distinct_responses =
                    exemplars_next.responses().collect::<HashSet<_>>().len();
                (None, ModelUpdate::Skipped { distinct_responses })
            }
            Err(e) => {
                log::warn!(
                    "session {}: retraining failed, keeping previous model: {e}",
                    self.engine.session_id
                );
                (
                    current.model.clone(),
                    ModelUpdate::Retained {
                        error: e.to_string(),
                    },
                )
            }
        };

        let next = KnowledgeSnapshot {
            exemplars: exemplars_next,
            vocabulary,
            model,
            version: current.version + 1,
        };
        let outcome = TrainingOutcome {
            changes,
            model: update,
            exemplar_count: next.exemplars.len(),
            vocabulary_size: next.vocabulary.len(),
            version: next.version,
        };

        *self.engine.snapshot.write() = Arc::new(next);
        drop(trainer);

        log::info!(
            "session {}: snapshot v{} published in {:?} ({} exemplars, {} terms, {})",
            self.engine.session_id,
            outcome.version,
            start_time.elapsed(),
            outcome.exemplar_count,
            outcome.vocabulary_size,
            outcome.model
        );

        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::chat::resolver::{Resolution, Tier};
    use crate::config::{EngineConfig, ForestConfig, LabelPolicy};
    use crate::error::ColloquyError;
    use crate::ml::classifier::{LabelId, Prediction, ResponseClassifier};
    use crate::ml::engine::ClassifierFactory;
    use crate::ml::features::FeatureVector;

    fn engine(pairs: &[(&str, &str)]) -> ChatEngine {
        ChatEngine::new(EngineConfig::default().with_fallback_seed(1), pairs).unwrap()
    }

    /// Fits successfully on the first pass only.
    struct Flaky {
        fail: bool,
    }

    impl ResponseClassifier for Flaky {
        fn fit(&mut self, _: &[FeatureVector], _: &[LabelId]) -> Result<()> {
            if self.fail {
                Err(ColloquyError::training("flaky classifier"))
            } else {
                Ok(())
            }
        }
        fn predict(&self, _: &FeatureVector) -> Option<Prediction> {
            Some(Prediction {
                label: 0,
                votes: 1,
                total_votes: 1,
            })
        }
        fn is_trained(&self) -> bool {
            !self.fail
        }
        fn name(&self) -> &str {
            "flaky"
        }
    }

    fn flaky_factory() -> ClassifierFactory {
        let calls = Arc::new(AtomicUsize::new(0));
        Arc::new(move |_: &ForestConfig| {
            let fail = calls.fetch_add(1, Ordering::SeqCst) > 0;
            Box::new(Flaky { fail }) as Box<dyn ResponseClassifier>
        })
    }

    #[test]
    fn test_add_exemplar_retrains() {
        let engine = engine(&[("hello", "Hi"), ("bye", "Bye")]);

        let outcome = engine
            .coordinator()
            .add_exemplar("Opening Hours", "9 to 6.")
            .unwrap();
        assert_eq!(outcome.changes, vec![StoreChange::Inserted]);
        assert_eq!(outcome.model, ModelUpdate::Retrained { label_count: 3 });
        assert_eq!(outcome.exemplar_count, 3);
        assert_eq!(outcome.vocabulary_size, 4);
        assert_eq!(outcome.version, 2);

        let snapshot = engine.snapshot();
        assert_eq!(snapshot.version(), 2);
        assert_eq!(snapshot.exemplars().get("opening hours"), Some("9 to 6."));
        let model = snapshot.model().unwrap();
        assert_eq!(model.vocabulary(), snapshot.vocabulary());
    }

    #[test]
    fn test_overwrite_replaces_response() {
        let engine = engine(&[("hello", "Hi"), ("bye", "Bye")]);

        let outcome = engine.coordinator().add_exemplar("HELLO", "Howdy").unwrap();
        assert_eq!(
            outcome.changes,
            vec![StoreChange::Overwritten {
                previous: "Hi".to_string()
            }]
        );
        assert_eq!(outcome.exemplar_count, 2);
        assert_eq!(engine.resolve("hello"), "Howdy");
    }

    #[test]
    fn test_unchanged_pair_keeps_snapshot() {
        let engine = engine(&[("hello", "Hi"), ("bye", "Bye")]);
        let before = engine.snapshot();

        let outcome = engine.coordinator().add_exemplar("hello", "Hi").unwrap();
        assert_eq!(outcome.model, ModelUpdate::Unchanged);
        assert_eq!(outcome.version, 1);
        assert!(Arc::ptr_eq(&before, &engine.snapshot()));
    }

    #[test]
    fn test_invalid_batch_stores_nothing() {
        let engine = engine(&[("hello", "Hi"), ("bye", "Bye")]);

        let result = engine
            .coordinator()
            .add_exemplars(&[("warranty", "One year."), ("   ", "orphan")]);
        assert!(matches!(result, Err(ColloquyError::Validation(_))));
        assert_eq!(engine.stats().exemplars, 2);
        assert_eq!(engine.stats().version, 1);
    }

    #[test]
    fn test_single_response_skips_classifier() {
        let engine = engine(&[("help", "Ask away.")]);
        assert!(engine.snapshot().model().is_none());

        let outcome = engine.coordinator().add_exemplar("support", "Ask away.").unwrap();
        assert_eq!(
            outcome.model,
            ModelUpdate::Skipped {
                distinct_responses: 1
            }
        );
        assert!(engine.snapshot().model().is_none());
        assert_eq!(engine.snapshot().vocabulary().len(), 2);
    }

    #[test]
    fn test_failed_training_retains_previous_model() {
        let engine = ChatEngine::with_factory(
            EngineConfig::default(),
            &[("hello", "Hi"), ("bye", "Bye")],
            flaky_factory(),
        )
        .unwrap();
        let previous = engine.snapshot().model.clone().unwrap();

        let outcome = engine.coordinator().add_exemplar("warranty", "One year.").unwrap();
        assert!(matches!(outcome.model, ModelUpdate::Retained { .. }));

        let snapshot = engine.snapshot();
        assert_eq!(snapshot.exemplars().len(), 3);
        assert_eq!(snapshot.vocabulary().len(), 3);
        let model = snapshot.model.clone().unwrap();
        assert!(Arc::ptr_eq(&previous, &model));
        assert_eq!(model.vocabulary().len(), 2);

        // The new pair is still reachable through the exact tier.
        assert_eq!(engine.resolve("warranty"), "One year.");
    }

    /// Remembers the width it was fitted on and only answers queries of that width.
    struct WidthBound {
        width: usize,
        fail: bool,
    }

    impl ResponseClassifier for WidthBound {
        fn fit(&mut self, features: &[FeatureVector], _: &[LabelId]) -> Result<()> {
            if self.fail {
                return Err(ColloquyError::training("width-bound classifier"));
            }
            self.width = features.first().map_or(0, FeatureVector::len);
            Ok(())
        }
        fn predict(&self, features: &FeatureVector) -> Option<Prediction> {
            (features.len() == self.width).then_some(Prediction {
                label: 1,
                votes: 1,
                total_votes: 1,
            })
        }
        fn is_trained(&self) -> bool {
            !self.fail
        }
        fn name(&self) -> &str {
            "width-bound"
        }
    }

    #[test]
    fn test_retained_model_uses_its_own_vocabulary() {
        let calls = Arc::new(AtomicUsize::new(0));
        let factory: ClassifierFactory = Arc::new(move |_: &ForestConfig| {
            let fail = calls.fetch_add(1, Ordering::SeqCst) > 0;
            Box::new(WidthBound { width: 0, fail }) as Box<dyn ResponseClassifier>
        });
        let engine = ChatEngine::with_factory(
            EngineConfig::default(),
            &[("hello", "A"), ("bye", "B")],
            factory,
        )
        .unwrap();

        let outcome = engine.coordinator().add_exemplar("warranty", "C").unwrap();
        assert!(matches!(outcome.model, ModelUpdate::Retained { .. }));
        assert_eq!(engine.snapshot().vocabulary().len(), 3);

        // Features sized to the grown vocabulary would be rejected and the
        // query would drop to the substring tier instead.
        assert_eq!(
            engine.resolve_detailed("hello bye"),
            Resolution {
                response: "B".to_string(),
                tier: Tier::Classifier,
            }
        );
    }

    #[test]
    fn test_degenerate_inputs_keep_exact_tier() {
        let engine = engine(&[("???", "Question marks."), ("!!!", "Exclamations.")]);
        assert!(engine.snapshot().model().is_none());
        assert_eq!(engine.resolve("???"), "Question marks.");
    }

    #[test]
    fn test_stable_labels_across_retrains() {
        let engine = engine(&[("hello", "Hi"), ("bye", "Bye")]);
        engine.add_exemplar("hey", "Hi").unwrap();
        engine.add_exemplar("thanks", "You're welcome!").unwrap();

        let trainer = engine.trainer.lock();
        assert_eq!(trainer.labels().policy(), LabelPolicy::Stable);
        assert_eq!(trainer.labels().get("Hi"), Some(0));
        assert_eq!(trainer.labels().get("Bye"), Some(1));
        assert_eq!(trainer.labels().get("You're welcome!"), Some(2));
    }

    #[test]
    fn test_model_update_display() {
        assert_eq!(
            ModelUpdate::Retrained { label_count: 3 }.to_string(),
            "model retrained with 3 labels"
        );
        assert_eq!(ModelUpdate::Unchanged.to_string(), "no changes");
    }
}
