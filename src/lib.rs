//! # Colloquy
//!
//! A trainable canned-response engine for chat assistants.
//!
//! ## Features
//!
//! - Tiered lookup: exact match, classifier, substring, generic fallback
//! - Bag-of-words count features over a rebuilt vocabulary
//! - Seeded random forest over the stored exemplars
//! - Teach-and-retrain with atomic snapshot swaps
//! - One engine per chat session, no global state

pub mod analysis;
pub mod chat;
pub mod cli;
pub mod config;
pub mod error;
pub mod ml;

pub mod prelude {
    pub use crate::chat::{ChatEngine, Resolution, Tier, TrainingOutcome};
    pub use crate::config::{EngineConfig, ForestConfig, LabelPolicy};
    pub use crate::error::{ColloquyError, Result};
}

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
