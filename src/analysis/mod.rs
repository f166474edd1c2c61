//! Text analysis for Colloquy.
//!
//! Turns raw utterances into normalized tokens for the vocabulary and the
//! feature vectorizer.

pub mod token;
pub mod tokenizer;

// Re-export commonly used types
pub use token::*;
pub use tokenizer::normalizing::NormalizingTokenizer;
pub use tokenizer::Tokenizer;
