//! Tiered response resolution.

use std::fmt;

use rand::seq::IndexedRandom;
use serde::{Deserialize, Serialize};

use crate::chat::engine::{ChatEngine, KnowledgeSnapshot};
use crate::ml::exemplar::normalize_input;

/// Last-resort answer if the fallback set were ever empty. Engine construction
/// rejects an empty set, so this is unreachable in practice.
const LAST_RESORT: &str = "I'm not sure I understand. Could you rephrase that?";

/// The stage of the lookup chain that produced a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    /// The utterance equals a stored input.
    Exact,
    /// The trained model predicted a response.
    Classifier,
    /// A stored input occurs inside the utterance.
    Substring,
    /// A generic fallback response.
    Fallback,
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Tier::Exact => "exact",
            Tier::Classifier => "classifier",
            Tier::Substring => "substring",
            Tier::Fallback => "fallback",
        };
        f.write_str(name)
    }
}

/// A response together with the tier that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    /// Response text.
    pub response: String,
    /// Tier that answered.
    pub tier: Tier,
}

impl Resolution {
    fn new(response: impl Into<String>, tier: Tier) -> Self {
        Self {
            response: response.into(),
            tier,
        }
    }
}

/// Read-side view of a [`ChatEngine`].
///
/// Tiers run in order and each runs only if the previous ones found nothing:
///
/// 1. exact match of the normalized utterance against stored inputs,
/// 2. classifier prediction,
/// 3. first stored input (in insertion order) contained in the utterance,
/// 4. a random generic fallback.
#[derive(Debug, Clone, Copy)]
pub struct ResponseResolver<'a> {
    engine: &'a ChatEngine,
}

impl<'a> ResponseResolver<'a> {
    /// Create a resolver over `engine`.
    pub fn new(engine: &'a ChatEngine) -> Self {
        Self { engine }
    }

    /// Answer an utterance. Never fails.
    pub fn resolve(&self, text: &str) -> String {
        self.resolve_detailed(text).response
    }

    /// Answer an utterance and report which tier answered.
    pub fn resolve_detailed(&self, text: &str) -> Resolution {
        let snapshot = self.engine.snapshot();
        let query = normalize_input(text);

        let resolution = self
            .exact(&snapshot, &query)
            .or_else(|| self.classify(&snapshot, &query))
            .or_else(|| self.substring(&snapshot, &query))
            .unwrap_or_else(|| self.fallback());

        log::debug!(
            "session {}: {:?} resolved by {} tier",
            self.engine.session_id,
            query,
            resolution.tier
        );
        resolution
    }

    fn exact(&self, snapshot: &KnowledgeSnapshot, query: &str) -> Option<Resolution> {
        snapshot
            .exemplars
            .get(query)
            .map(|response| Resolution::new(response, Tier::Exact))
    }

    /// Classifier tier.
    ///
    /// The query is vectorized against the model's own vocabulary. A query
    /// with no known token carries no evidence and is left to later tiers.
    fn classify(&self, snapshot: &KnowledgeSnapshot, query: &str) -> Option<Resolution> {
        let model = snapshot.model.as_ref()?;

        let features = match self.engine.vectorizer.vectorize(query, model.vocabulary()) {
            Ok(features) => features,
            Err(e) => {
                log::warn!("session {}: vectorization failed: {e}", self.engine.session_id);
                return None;
            }
        };
        if features.is_zero() {
            return None;
        }

        let prediction = model.predict(&features)?;
        if prediction.vote_share() < self.engine.config.min_vote_share {
            log::debug!(
                "prediction {} rejected: vote share {:.2} below {:.2}",
                prediction.label,
                prediction.vote_share(),
                self.engine.config.min_vote_share
            );
            return None;
        }

        model
            .response(prediction.label)
            .map(|response| Resolution::new(response, Tier::Classifier))
    }

    fn substring(&self, snapshot: &KnowledgeSnapshot, query: &str) -> Option<Resolution> {
        snapshot
            .exemplars
            .iter()
            .find(|exemplar| query.contains(exemplar.input.as_str()))
            .map(|exemplar| Resolution::new(exemplar.response.as_str(), Tier::Substring))
    }

    fn fallback(&self) -> Resolution {
        let mut rng = self.engine.fallback_rng.lock();
        let response = self
            .engine
            .config
            .fallback_responses
            .choose(&mut *rng)
            .map(String::as_str)
            .unwrap_or(LAST_RESORT);
        Resolution::new(response, Tier::Fallback)
    }
}
