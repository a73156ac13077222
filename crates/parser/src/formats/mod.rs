//! Per-log-type classifiers.
//!
//! One module per log type. Each holds the type's header pattern and its
//! ordered classification rules; selection order across types lives in
//! `registry::ClassifierRegistry::default_set`.

pub mod ai_data;
pub mod ai_errors;
pub mod application;
pub mod backend;
pub mod backend_cache;
pub mod backend_queue;
pub mod errors;
pub mod files_checker;
pub mod insurance;
pub mod inventory;
pub mod network_connection;
pub mod network_messages;
pub mod object_pool;
pub mod output;
pub mod player;
pub mod push_notifications;
pub mod seasons;
pub mod spatial_audio;

pub use ai_data::AiDataLogs;
pub use ai_errors::AiErrorsLogs;
pub use application::ApplicationLogs;
pub use backend::BackendLogs;
pub use backend_cache::BackendCacheLogs;
pub use backend_queue::BackendQueueLogs;
pub use errors::ErrorsLogs;
pub use files_checker::FilesCheckerLogs;
pub use insurance::InsuranceLogs;
pub use inventory::InventoryLogs;
pub use network_connection::NetworkConnectionLogs;
pub use network_messages::NetworkMessagesLogs;
pub use object_pool::ObjectPoolLogs;
pub use output::OutputLogs;
pub use player::PlayerLogs;
pub use push_notifications::PushNotificationsLogs;
pub use seasons::SeasonsLogs;
pub use spatial_audio::SpatialAudioLogs;

use regex::Captures;

/// Capture group as a trimmed, non-empty string.
pub(crate) fn group_string(caps: &Captures<'_>, idx: usize) -> Option<String> {
    caps.get(idx)
        .map(|m| m.as_str().trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Capture group parsed as a number; non-numeric text degrades to `None`.
pub(crate) fn group_num<T: std::str::FromStr>(caps: &Captures<'_>, idx: usize) -> Option<T> {
    caps.get(idx).and_then(|m| m.as_str().trim().parse().ok())
}

/// Empty header columns become `None` rather than empty strings.
pub(crate) fn optional(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

pub(crate) fn continuation_of(lines: Vec<String>) -> Option<Vec<String>> {
    if lines.is_empty() {
        None
    } else {
        Some(lines)
    }
}
