//! Normalizing tokenizer: lowercase, strip punctuation, split on whitespace.

use std::sync::Arc;

use regex::Regex;

use super::Tokenizer;
use crate::analysis::token::{Token, TokenStream};
use crate::error::{ColloquyError, Result};

/// Characters that are neither letters, digits nor whitespace.
const DEFAULT_STRIP_PATTERN: &str = r"[^\p{L}\p{N}\s]+";

/// Maximal runs of non-whitespace.
const WORD_PATTERN: &str = r"\S+";

/// A tokenizer that lowercases its input, removes every character outside
/// letters, digits and whitespace, and splits the remainder on whitespace runs.
///
/// Stripping happens before splitting, so `"don't"` becomes the single token
/// `"dont"` rather than two tokens.
#[derive(Clone, Debug)]
pub struct NormalizingTokenizer {
    /// Pattern whose matches are deleted after lowercasing
    strip: Arc<Regex>,
    /// Pattern that extracts tokens from the stripped text
    words: Arc<Regex>,
}

impl NormalizingTokenizer {
    /// Create a new tokenizer with the default strip pattern.
    pub fn new() -> Result<Self> {
        Self::with_strip_pattern(DEFAULT_STRIP_PATTERN)
    }

    /// Create a tokenizer that deletes matches of a custom pattern instead.
    pub fn with_strip_pattern(pattern: &str) -> Result<Self> {
        let strip = Regex::new(pattern)
            .map_err(|e| ColloquyError::analysis(format!("Invalid strip pattern: {e}")))?;
        let words = Regex::new(WORD_PATTERN)
            .map_err(|e| ColloquyError::analysis(format!("Invalid word pattern: {e}")))?;

        Ok(NormalizingTokenizer {
            strip: Arc::new(strip),
            words: Arc::new(words),
        })
    }

    /// Get the strip pattern used by this tokenizer.
    pub fn strip_pattern(&self) -> &str {
        self.strip.as_str()
    }

    /// Lowercase `text` and delete stripped characters, keeping whitespace.
    pub fn normalize(&self, text: &str) -> String {
        let lowered = text.to_lowercase();
        self.strip.replace_all(&lowered, "").into_owned()
    }

    /// Tokenize and return only the token texts.
    pub fn terms(&self, text: &str) -> Vec<String> {
        let normalized = self.normalize(text);
        self.words
            .find_iter(&normalized)
            .map(|mat| mat.as_str().to_string())
            .collect()
    }
}

impl Tokenizer for NormalizingTokenizer {
    fn tokenize(&self, text: &str) -> Result<TokenStream> {
        let normalized = self.normalize(text);

        let tokens: Vec<Token> = self
            .words
            .find_iter(&normalized)
            .enumerate()
            .map(|(position, mat)| {
                Token::with_offsets(mat.as_str(), position, mat.start(), mat.end())
            })
            .collect();

        Ok(Box::new(tokens.into_iter()))
    }

    fn name(&self) -> &'static str {
        "normalizing"
    }
}
