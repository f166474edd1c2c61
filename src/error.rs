//! Error types for the Colloquy library.
//!
//! All fallible operations return [`Result`], whose error type is the
//! [`ColloquyError`] enum. Resolution itself never fails; errors surface from
//! training, configuration and file loading.
//!
//! # Examples
//!
//! ```
//! use colloquy::error::{ColloquyError, Result};
//!
//! fn teach(input: &str) -> Result<()> {
//!     if input.trim().is_empty() {
//!         return Err(ColloquyError::validation("input must not be empty"));
//!     }
//!     Ok(())
//! }
//!
//! assert!(teach("   ").is_err());
//! ```

use std::io;

use thiserror::Error;

/// The main error type for Colloquy operations.
#[derive(Error, Debug)]
pub enum ColloquyError {
    /// I/O errors (reading seed or config files)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Rejected training data (empty input or response)
    #[error("Validation error: {0}")]
    Validation(String),

    /// The classifier could not be fitted on the current feature matrix
    #[error("Training error: {0}")]
    Training(String),

    /// Invalid engine configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Analysis-related errors (tokenization)
    #[error("Analysis error: {0}")]
    Analysis(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for operations that may fail with ColloquyError.
pub type Result<T> = std::result::Result<T, ColloquyError>;

impl ColloquyError {
    /// Create a new validation error.
    pub fn validation<S: Into<String>>(msg: S) -> Self {
        ColloquyError::Validation(msg.into())
    }

    /// Create a new training error.
    pub fn training<S: Into<String>>(msg: S) -> Self {
        ColloquyError::Training(msg.into())
    }

    /// Create a new configuration error.
    pub fn config<S: Into<String>>(msg: S) -> Self {
        ColloquyError::Config(msg.into())
    }

    /// Create a new analysis error.
    pub fn analysis<S: Into<String>>(msg: S) -> Self {
        ColloquyError::Analysis(msg.into())
    }

    /// Whether this error was caused by rejected caller input.
    pub fn is_validation(&self) -> bool {
        matches!(self, ColloquyError::Validation(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_construction() {
        let error = ColloquyError::validation("empty response");
        assert_eq!(error.to_string(), "Validation error: empty response");
        assert!(error.is_validation());

        let error = ColloquyError::training("all-zero feature matrix");
        assert_eq!(error.to_string(), "Training error: all-zero feature matrix");
        assert!(!error.is_validation());

        let error = ColloquyError::config("no fallback responses");
        assert_eq!(error.to_string(), "Configuration error: no fallback responses");
    }

    #[test]
    fn test_every_variant_is_reachable() {
        let json_error = serde_json::from_str::<u32>("not json").unwrap_err();
        let errors = [
            ColloquyError::from(io::Error::other("disk")),
            ColloquyError::validation("v"),
            ColloquyError::training("t"),
            ColloquyError::config("c"),
            ColloquyError::analysis("a"),
            ColloquyError::from(json_error),
        ];

        let prefixes: Vec<&str> = errors
            .iter()
            .map(|error| match error {
                ColloquyError::Io(_) => "I/O error",
                ColloquyError::Validation(_) => "Validation error",
                ColloquyError::Training(_) => "Training error",
                ColloquyError::Config(_) => "Configuration error",
                ColloquyError::Analysis(_) => "Analysis error",
                ColloquyError::Json(_) => "JSON error",
            })
            .collect();
        for (error, prefix) in errors.iter().zip(prefixes) {
            assert!(error.to_string().starts_with(prefix), "{error}");
        }
    }

    #[test]
    fn test_io_error_conversion() {
        let io_error = io::Error::new(io::ErrorKind::NotFound, "seed file not found");
        let error = ColloquyError::from(io_error);

        match error {
            ColloquyError::Io(_) => {} // Expected
            _ => panic!("Expected IO error variant"),
        }
    }
}
