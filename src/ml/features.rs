//! Bag-of-words feature extraction.
//!
//! Follows the shape of a classic count vectorizer: a vocabulary fixes the
//! vector length and each position counts how often its token occurs.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::analysis::tokenizer::Tokenizer;
use crate::error::Result;
use crate::ml::vocabulary::Vocabulary;

/// Term counts over a vocabulary; `counts[i]` is the number of occurrences of
/// the token with index `i`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FeatureVector {
    counts: Vec<u32>,
}

impl FeatureVector {
    /// Create an all-zero vector of the given length.
    pub fn zeros(len: usize) -> Self {
        Self {
            counts: vec![0; len],
        }
    }

    /// Count at position `index` (0 when out of range).
    pub fn get(&self, index: usize) -> u32 {
        self.counts.get(index).copied().unwrap_or(0)
    }

    /// Vector length.
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    /// Check if the vector has zero length.
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// True when no vocabulary token was observed.
    pub fn is_zero(&self) -> bool {
        self.counts.iter().all(|&count| count == 0)
    }

    /// Raw counts.
    pub fn as_slice(&self) -> &[u32] {
        &self.counts
    }
}

impl From<Vec<u32>> for FeatureVector {
    fn from(counts: Vec<u32>) -> Self {
        Self { counts }
    }
}

/// Converts text into a [`FeatureVector`] over a given vocabulary.
pub struct FeatureVectorizer {
    /// Tokenizer shared with the vocabulary build.
    tokenizer: Arc<dyn Tokenizer>,
}

impl std::fmt::Debug for FeatureVectorizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeatureVectorizer")
            .field("tokenizer", &self.tokenizer.name())
            .finish()
    }
}

impl FeatureVectorizer {
    /// Create a new vectorizer with the specified tokenizer.
    pub fn new(tokenizer: Arc<dyn Tokenizer>) -> Self {
        Self { tokenizer }
    }

    /// Get the tokenizer used by this vectorizer.
    pub fn tokenizer(&self) -> &Arc<dyn Tokenizer> {
        &self.tokenizer
    }

    /// Count the vocabulary tokens of `text`.
    ///
    /// Tokens outside the vocabulary are ignored, so unseen words never change
    /// the vector.
    pub fn vectorize(&self, text: &str, vocabulary: &Vocabulary) -> Result<FeatureVector> {
        let mut counts = vec![0u32; vocabulary.len()];

        for token in self.tokenizer.tokenize(text)? {
            if let Some(idx) = vocabulary.get(&token.text) {
                counts[idx] += 1;
            }
        }

        Ok(FeatureVector { counts })
    }

    /// Build a vocabulary over `inputs` with this vectorizer's tokenizer.
    pub fn build_vocabulary<'a, I>(&self, inputs: I) -> Result<Vocabulary>
    where
        I: IntoIterator<Item = &'a str>,
    {
        Vocabulary::build(inputs, self.tokenizer.as_ref())
    }
}
