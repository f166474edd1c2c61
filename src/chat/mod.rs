//! Per-session chat engine: tiered resolution and atomic retraining.

pub mod coordinator;
pub mod engine;
pub mod resolver;
pub mod seed;

pub use coordinator::{ModelUpdate, TrainingCoordinator, TrainingOutcome};
pub use engine::{ChatEngine, EngineStats, KnowledgeSnapshot};
pub use resolver::{Resolution, ResponseResolver, Tier};
pub use seed::{default_fallbacks, load_seed, parse_seed, storefront_seed};
