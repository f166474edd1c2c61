//! The per-session chat engine and its knowledge snapshots.

use std::collections::HashSet;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::analysis::tokenizer::normalizing::NormalizingTokenizer;
use crate::chat::coordinator::{TrainingCoordinator, TrainingOutcome};
use crate::chat::resolver::{Resolution, ResponseResolver};
use crate::chat::seed::storefront_seed;
use crate::config::EngineConfig;
use crate::error::Result;
use crate::ml::engine::{ClassifierEngine, ClassifierFactory, ModelMetadata, TrainedModel};
use crate::ml::exemplar::{Exemplar, ExemplarStore};
use crate::ml::features::FeatureVectorizer;
use crate::ml::vocabulary::Vocabulary;

/// Everything a resolution reads, frozen at one point in time.
///
/// Snapshots are immutable. A retrain builds a complete new snapshot and swaps
/// it in, so readers always see an exemplar store, vocabulary and model that
/// belong together.
#[derive(Debug, Default)]
pub struct KnowledgeSnapshot {
    pub(crate) exemplars: ExemplarStore,
    pub(crate) vocabulary: Vocabulary,
    pub(crate) model: Option<Arc<TrainedModel>>,
    pub(crate) version: u64,
}

impl KnowledgeSnapshot {
    /// Exemplars in insertion order.
    pub fn exemplars(&self) -> &ExemplarStore {
        &self.exemplars
    }

    /// Vocabulary built from the current exemplars.
    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    /// The model answering the classifier tier, if any.
    ///
    /// After a failed retrain this is the previous model, which carries its
    /// own (older) vocabulary.
    pub fn model(&self) -> Option<&TrainedModel> {
        self.model.as_deref()
    }

    /// Number of swaps since the engine was created.
    pub fn version(&self) -> u64 {
        self.version
    }
}

/// Engine statistics for introspection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineStats {
    /// Session identifier.
    pub session_id: Uuid,
    /// Snapshot version.
    pub version: u64,
    /// Stored exemplars.
    pub exemplars: usize,
    /// Distinct tokens across exemplar inputs.
    pub vocabulary_size: usize,
    /// Distinct response texts.
    pub distinct_responses: usize,
    /// Metadata of the active model, if one is trained.
    pub model: Option<ModelMetadata>,
}

/// Conversational response engine owned by one chat session.
///
/// Reads ([`ChatEngine::resolve`]) and writes ([`ChatEngine::add_exemplar`])
/// may come from different threads: writers are serialized and swap in a new
/// snapshot atomically, while readers keep using the snapshot they started
/// with.
///
/// # Examples
///
/// ```
/// use colloquy::chat::ChatEngine;
/// use colloquy::config::EngineConfig;
///
/// let engine = ChatEngine::new(
///     EngineConfig::default(),
///     &[("hello", "Hi there!"), ("bye", "Goodbye!")],
/// )
/// .unwrap();
///
/// assert_eq!(engine.resolve("HELLO"), "Hi there!");
///
/// engine.add_exemplar("opening hours", "9am to 6pm.").unwrap();
/// assert_eq!(engine.resolve("Opening hours"), "9am to 6pm.");
/// ```
pub struct ChatEngine {
    pub(crate) session_id: Uuid,
    pub(crate) config: EngineConfig,
    pub(crate) vectorizer: Arc<FeatureVectorizer>,
    pub(crate) snapshot: RwLock<Arc<KnowledgeSnapshot>>,
    pub(crate) trainer: Mutex<ClassifierEngine>,
    pub(crate) fallback_rng: Mutex<StdRng>,
}

impl std::fmt::Debug for ChatEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let snapshot = self.snapshot();
        f.debug_struct("ChatEngine")
            .field("session_id", &self.session_id)
            .field("version", &snapshot.version)
            .field("exemplars", &snapshot.exemplars.len())
            .field("trained", &snapshot.model.is_some())
            .finish()
    }
}

impl ChatEngine {
    /// Create an engine seeded with `seed`, training a random forest.
    pub fn new<I, R>(config: EngineConfig, seed: &[(I, R)]) -> Result<Self>
    where
        I: AsRef<str>,
        R: AsRef<str>,
    {
        let vectorizer = Self::default_vectorizer()?;
        let trainer = ClassifierEngine::new(
            config.forest.clone(),
            config.label_policy,
            vectorizer.clone(),
        );
        Self::build(config, vectorizer, trainer, seed)
    }

    /// Create an engine whose classifier tier uses models from `factory`.
    pub fn with_factory<I, R>(
        config: EngineConfig,
        seed: &[(I, R)],
        factory: ClassifierFactory,
    ) -> Result<Self>
    where
        I: AsRef<str>,
        R: AsRef<str>,
    {
        let vectorizer = Self::default_vectorizer()?;
        let trainer = ClassifierEngine::with_factory(
            config.forest.clone(),
            config.label_policy,
            vectorizer.clone(),
            factory,
        );
        Self::build(config, vectorizer, trainer, seed)
    }

    /// Create an engine with the default configuration and the built-in
    /// storefront seed.
    pub fn storefront() -> Result<Self> {
        Self::new(EngineConfig::default(), &storefront_seed())
    }

    fn default_vectorizer() -> Result<Arc<FeatureVectorizer>> {
        Ok(Arc::new(FeatureVectorizer::new(Arc::new(
            NormalizingTokenizer::new()?,
        ))))
    }

    fn build<I, R>(
        config: EngineConfig,
        vectorizer: Arc<FeatureVectorizer>,
        trainer: ClassifierEngine,
        seed: &[(I, R)],
    ) -> Result<Self>
    where
        I: AsRef<str>,
        R: AsRef<str>,
    {
        config.validate()?;

        let fallback_rng = match config.fallback_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        let engine = Self {
            session_id: Uuid::new_v4(),
            config,
            vectorizer,
            snapshot: RwLock::new(Arc::new(KnowledgeSnapshot::default())),
            trainer: Mutex::new(trainer),
            fallback_rng: Mutex::new(fallback_rng),
        };

        let outcome = engine.coordinator().add_exemplars(seed)?;
        log::info!(
            "session {}: seeded with {} exemplars ({})",
            engine.session_id,
            outcome.exemplar_count,
            outcome.model
        );

        Ok(engine)
    }

    /// Session identifier, used in log lines.
    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    /// Engine configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The current snapshot. Holding it does not block writers.
    pub fn snapshot(&self) -> Arc<KnowledgeSnapshot> {
        self.snapshot.read().clone()
    }

    /// Read-side view of the engine.
    pub fn resolver(&self) -> ResponseResolver<'_> {
        ResponseResolver::new(self)
    }

    /// Write-side view of the engine.
    pub fn coordinator(&self) -> TrainingCoordinator<'_> {
        TrainingCoordinator::new(self)
    }

    /// Answer an utterance. Never fails.
    pub fn resolve(&self, text: &str) -> String {
        self.resolver().resolve(text)
    }

    /// Answer an utterance and report which tier answered.
    pub fn resolve_detailed(&self, text: &str) -> Resolution {
        self.resolver().resolve_detailed(text)
    }

    /// Teach the engine a new pair and retrain before returning.
    pub fn add_exemplar(&self, input: &str, response: &str) -> Result<TrainingOutcome> {
        self.coordinator().add_exemplar(input, response)
    }

    /// Teach several pairs with a single retrain.
    pub fn add_exemplars<I, R>(&self, pairs: &[(I, R)]) -> Result<TrainingOutcome>
    where
        I: AsRef<str>,
        R: AsRef<str>,
    {
        self.coordinator().add_exemplars(pairs)
    }

    /// Copy of the stored exemplars, in insertion order.
    pub fn exemplars(&self) -> Vec<Exemplar> {
        self.snapshot().exemplars.as_slice().to_vec()
    }

    /// Current statistics.
    pub fn stats(&self) -> EngineStats {
        let snapshot = self.snapshot();
        let distinct_responses = snapshot
            .exemplars
            .responses()
            .collect::<HashSet<_>>()
            .len();

        EngineStats {
            session_id: self.session_id,
            version: snapshot.version,
            exemplars: snapshot.exemplars.len(),
            vocabulary_size: snapshot.vocabulary.len(),
            distinct_responses,
            model: snapshot.model.as_ref().map(|m| m.metadata().clone()),
        }
    }
}
