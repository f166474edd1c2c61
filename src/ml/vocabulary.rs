//! Token to feature-index mapping for one build cycle.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::analysis::tokenizer::Tokenizer;
use crate::error::Result;

/// Vocabulary: every distinct token seen in the training inputs, numbered in
/// first-seen order starting at 0.
///
/// Indices are only meaningful within one build; a rebuild after the exemplar
/// set changes may renumber tokens.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Vocabulary {
    /// Token -> index mapping.
    index: HashMap<String, usize>,
    /// Tokens ordered by index.
    terms: Vec<String>,
}

impl Vocabulary {
    /// Create an empty vocabulary.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a vocabulary from training inputs, in the given order.
    pub fn build<'a, I>(inputs: I, tokenizer: &dyn Tokenizer) -> Result<Self>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut vocabulary = Self::new();
        vocabulary.rebuild(inputs, tokenizer)?;
        Ok(vocabulary)
    }

    /// Discard the current mapping and index `inputs` from scratch.
    pub fn rebuild<'a, I>(&mut self, inputs: I, tokenizer: &dyn Tokenizer) -> Result<()>
    where
        I: IntoIterator<Item = &'a str>,
    {
        self.index.clear();
        self.terms.clear();

        for input in inputs {
            for token in tokenizer.tokenize(input)? {
                if !self.index.contains_key(&token.text) {
                    self.index.insert(token.text.clone(), self.terms.len());
                    self.terms.push(token.text);
                }
            }
        }

        log::debug!("rebuilt vocabulary with {} terms", self.terms.len());
        Ok(())
    }

    /// Get the index assigned to `term`.
    pub fn get(&self, term: &str) -> Option<usize> {
        self.index.get(term).copied()
    }

    /// Tokens ordered by their index.
    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    /// Number of distinct tokens, which is also the feature-vector length.
    pub fn len(&self) -> usize {
        self.terms.len()
    }

    /// Check if the vocabulary is empty.
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::tokenizer::normalizing::NormalizingTokenizer;

    #[test]
    fn test_indices_follow_first_seen_order() {
        let tokenizer = NormalizingTokenizer::new().unwrap();
        let vocabulary = Vocabulary::build(
            ["how are you", "thank you", "are you open"],
            &tokenizer,
        )
        .unwrap();

        assert_eq!(vocabulary.terms(), &["how", "are", "you", "thank", "open"]);
        assert_eq!(vocabulary.get("how"), Some(0));
        assert_eq!(vocabulary.get("open"), Some(4));
        assert_eq!(vocabulary.get("closed"), None);
    }

    #[test]
    fn test_size_equals_distinct_token_count() {
        let tokenizer = NormalizingTokenizer::new().unwrap();
        let inputs = ["hello", "Hello there!", "return policy", "policy"];
        let vocabulary = Vocabulary::build(inputs, &tokenizer).unwrap();

        let mut distinct: Vec<String> = inputs.iter().flat_map(|i| tokenizer.terms(i)).collect();
        distinct.sort();
        distinct.dedup();

        assert_eq!(vocabulary.len(), distinct.len());
        assert_eq!(vocabulary.len(), 4);
    }

    #[test]
    fn test_rebuild_clears_previous_state() {
        let tokenizer = NormalizingTokenizer::new().unwrap();
        let mut vocabulary = Vocabulary::build(["laptop price"], &tokenizer).unwrap();
        assert_eq!(vocabulary.get("laptop"), Some(0));

        vocabulary.rebuild(["store hours"], &tokenizer).unwrap();
        assert_eq!(vocabulary.get("laptop"), None);
        assert_eq!(vocabulary.get("store"), Some(0));
        assert_eq!(vocabulary.len(), 2);
    }

    #[test]
    fn test_punctuation_only_inputs_give_empty_vocabulary() {
        let tokenizer = NormalizingTokenizer::new().unwrap();
        let vocabulary = Vocabulary::build(["???", "!!"], &tokenizer).unwrap();
        assert!(vocabulary.is_empty());
    }
}
