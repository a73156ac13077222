//! Cross-file analytics over parsed game-client logs.
//!
//! Consumes `parser::ParsedLog` streams and produces two independent output
//! documents: `Statistics` (domain counters) and `Insights` (timelines,
//! durations, quest state). Both are assembled by a single read-only fold
//! over the events; session folding is commutative, so callers may parse
//! files in any order or concurrently.

pub mod insights;
pub mod model;
pub mod quest;
pub mod session;
pub mod stats;

pub use insights::InsightsBuilder;
pub use model::{Insights, SessionSummary, SessionTimeline, Statistics};
pub use quest::{QuestRecord, QuestStatus, QuestTracker};
pub use stats::StatisticsAggregator;
