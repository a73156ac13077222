//! Game-client log parsing.
//!
//! Turns the client's per-subsystem plain-text logs into typed events:
//! header/continuation grouping, per-log-type classification through an
//! ordered registry, and optional enrichment of events from an external
//! game-data source behind a read-through cache.
//!
//! # Architecture
//!
//! - `grouper`: header-delimited record splitting
//! - `timefmt`: timestamp normalization
//! - `formats/`: the 18 per-log-type classifiers
//! - `registry`: classifier trait and ordered first-match selection
//! - `engine`: input resolution, dispatch, directory mode, enrichment hook
//! - `cache` / `provider`: external collaborator boundaries

pub mod cache;
pub mod config;
pub mod engine;
pub mod enrich;
pub mod fields;
pub mod formats;
pub mod grouper;
pub mod model;
pub mod provider;
pub mod registry;
pub mod timefmt;

// Re-export the types most callers touch.
pub use config::EngineConfig;
pub use engine::{LogEngine, ParseError, ParseInput};
pub use model::{LogEvent, LogLevel, LogType, ParsedLog};
pub use registry::{ClassifierRegistry, LogClassifier};
