//! Machine learning components of the response engine.
//!
//! The pipeline runs leaf-first: exemplars are tokenized into a
//! [`Vocabulary`](vocabulary::Vocabulary), vectorized into count
//! [`FeatureVector`](features::FeatureVector)s, and fitted by a
//! [`ResponseClassifier`](classifier::ResponseClassifier) into a
//! [`TrainedModel`](engine::TrainedModel).

pub mod classifier;
pub mod engine;
pub mod exemplar;
pub mod features;
pub mod forest;
pub mod labels;
pub mod vocabulary;

pub use classifier::{LabelId, Prediction, ResponseClassifier};
pub use engine::{ClassifierEngine, ClassifierFactory, ModelMetadata, TrainedModel};
pub use exemplar::{Exemplar, ExemplarStore, StoreChange, normalize_input};
pub use features::{FeatureVector, FeatureVectorizer};
pub use forest::{DecisionTree, RandomForestClassifier};
pub use labels::{LabelAssignment, LabelRegistry};
pub use vocabulary::Vocabulary;
