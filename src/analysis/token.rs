//! Token types produced by the tokenizer.
//!
//! # Examples
//!
//! ```
//! use colloquy::analysis::token::Token;
//!
//! let token = Token::with_offsets("laptop", 1, 4, 10);
//! assert_eq!(token.text, "laptop");
//! assert_eq!(token.position, 1);
//! assert_eq!(token.end_offset - token.start_offset, 6);
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

/// A single normalized unit of text.
///
/// Offsets are byte offsets into the *normalized* text (lowercased, with
/// punctuation stripped), not into the raw utterance.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    /// The text content of the token
    pub text: String,

    /// The position of the token in the token stream (0-based)
    pub position: usize,

    /// The byte offset where this token starts in the normalized text
    pub start_offset: usize,

    /// The byte offset where this token ends in the normalized text
    pub end_offset: usize,
}

impl Token {
    /// Create a new token with text, position, and byte offsets.
    pub fn with_offsets<S: Into<String>>(
        text: S,
        position: usize,
        start_offset: usize,
        end_offset: usize,
    ) -> Self {
        Token {
            text: text.into(),
            position,
            start_offset,
            end_offset,
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.text)
    }
}

/// A token stream is a restartable-by-reconstruction sequence of tokens.
pub type TokenStream = Box<dyn Iterator<Item = Token>>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_with_offsets() {
        let token = Token::with_offsets("world", 1, 6, 11);
        assert_eq!(token.text, "world");
        assert_eq!(token.position, 1);
        assert_eq!(token.start_offset, 6);
        assert_eq!(token.end_offset, 11);
    }

    #[test]
    fn test_token_display() {
        let token = Token::with_offsets("hello", 0, 0, 5);
        assert_eq!(format!("{token}"), "hello");
    }
}
