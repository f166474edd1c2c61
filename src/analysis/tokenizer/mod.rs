//! Tokenizer implementations for text analysis.
//!
//! Tokenizers are the first step of the feature pipeline: they turn a raw
//! utterance into the tokens that the vocabulary indexes and the vectorizer
//! counts.
//!
//! # Examples
//!
//! ```
//! use colloquy::analysis::tokenizer::Tokenizer;
//! use colloquy::analysis::tokenizer::normalizing::NormalizingTokenizer;
//!
//! let tokenizer = NormalizingTokenizer::new().unwrap();
//! let tokens: Vec<_> = tokenizer.tokenize("Hello, World!").unwrap().collect();
//! assert_eq!(tokens[0].text, "hello");
//! assert_eq!(tokens[1].text, "world");
//! ```

use crate::analysis::token::TokenStream;
use crate::error::Result;

/// Trait for tokenizers that convert text into tokens.
///
/// The trait requires `Send + Sync` so a tokenizer can be shared between the
/// training path and concurrent readers of an engine snapshot.
pub trait Tokenizer: Send + Sync {
    /// Tokenize the given text into a stream of tokens.
    ///
    /// Implementations must be deterministic and free of side effects: the
    /// same text always yields the same token sequence.
    fn tokenize(&self, text: &str) -> Result<TokenStream>;

    /// Get the name of this tokenizer (for debugging and configuration).
    fn name(&self) -> &'static str;
}

pub mod normalizing;
