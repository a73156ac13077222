//! Output documents: statistics and insights.
//!
//! Everything here is plain serializable data, assembled by one fold over
//! the event stream and never mutated afterwards. String-keyed breakdowns
//! use ordered maps so serialized output is deterministic.

use std::collections::BTreeMap;

use serde::Serialize;

use parser::model::{LogEvent, LogType};

#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct LevelTotals {
    pub events: u64,
    pub errors: u64,
    pub warnings: u64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub id: String,
    pub build_version: Option<String>,
    pub earliest_timestamp: Option<String>,
    pub latest_timestamp: Option<String>,
    pub log_types: Vec<LogType>,
    pub totals: LevelTotals,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BackendStats {
    pub total_requests: u64,
    pub total_responses: u64,
    pub total_errors: u64,
    pub retries: u64,
    pub by_status_code: BTreeMap<String, u64>,
    pub by_endpoint: BTreeMap<String, u64>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
}

impl CacheStats {
    pub fn hit_rate(&self) -> Option<f64> {
        let total = self.hits + self.misses;
        if total == 0 {
            None
        } else {
            Some(self.hits as f64 / total as f64)
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryStats {
    pub total_rejections: u64,
    pub by_operation: BTreeMap<String, u64>,
    pub by_code: BTreeMap<String, u64>,
    pub items: BTreeMap<String, u64>,
}

#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct AddressCounters {
    pub connect: u64,
    pub disconnect: u64,
    pub timeout: u64,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkMetrics {
    /// Samples from network-messages metric lines.
    pub samples: u64,
    pub rpi_avg: Option<f64>,
    pub lud_avg: Option<f64>,
    /// Samples from network-connection statistics lines.
    pub rtt_samples: u64,
    pub rtt_avg: Option<f64>,
    pub total_packets_lost: u64,
    pub total_packets_sent: u64,
    pub total_packets_received: u64,
    pub disconnect_reasons: BTreeMap<String, u64>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkStats {
    pub connections: u64,
    pub disconnects: u64,
    pub timeouts: u64,
    pub by_address: BTreeMap<String, AddressCounters>,
    pub metrics: NetworkMetrics,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct PushStats {
    pub connections: u64,
    pub drops: u64,
    pub notifications: u64,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioStats {
    pub init_success: u64,
    pub occlusion_errors: u64,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorStats {
    pub totals: u64,
    pub by_family: BTreeMap<String, u64>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchmakingStats {
    pub group_ids: Vec<String>,
    pub events: Vec<LogEvent>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AntiCheatStats {
    pub init_lines: u64,
    pub errors: u64,
    pub last_status: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Item,
    Quest,
    Trader,
    Location,
}

/// Lazily-populated record for an entity seen by id.
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedEntity {
    pub id: String,
    pub kind: EntityKind,
    pub name: Option<String>,
}

impl ResolvedEntity {
    pub fn unresolved(id: impl Into<String>, kind: EntityKind) -> Self {
        Self {
            id: id.into(),
            kind,
            name: None,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Statistics {
    pub sessions: Vec<SessionSummary>,
    pub backend: BackendStats,
    pub cache: CacheStats,
    pub inventory: InventoryStats,
    pub network: NetworkStats,
    pub push: PushStats,
    pub audio: AudioStats,
    pub errors: ErrorStats,
    pub matchmaking: MatchmakingStats,
    pub anticheat: AntiCheatStats,
    pub quests: Vec<crate::quest::QuestRecord>,
    pub traders: BTreeMap<String, ResolvedEntity>,
    pub items: BTreeMap<String, ResolvedEntity>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionTimeline {
    pub session_id: String,
    pub build_version: Option<String>,
    pub started_at: Option<String>,
    pub ended_at: Option<String>,
    pub first_backend_at: Option<String>,
    pub first_connect_at: Option<String>,
    pub first_match_event_at: Option<String>,
    pub first_inventory_error_at: Option<String>,
    pub first_error_at: Option<String>,
    pub startup_duration_ms: Option<i64>,
    pub matchmaking_duration_ms: Option<i64>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchingSession {
    pub session_id: String,
    pub group_id: Option<String>,
    pub started_at: Option<String>,
    pub prepared_at: Option<String>,
    pub runned_at: Option<String>,
    pub duration_ms: Option<i64>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchingInsight {
    pub sessions: Vec<MatchingSession>,
    pub average_duration_ms: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StartupSession {
    pub session_id: String,
    pub started_at: Option<String>,
    pub first_backend_at: Option<String>,
    pub duration_ms: Option<i64>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StartupInsight {
    pub sessions: Vec<StartupSession>,
    pub average_duration_ms: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorInsight {
    pub total: u64,
    pub by_family: BTreeMap<String, u64>,
    pub first_at: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryInsight {
    pub total_rejections: u64,
    pub by_operation: BTreeMap<String, u64>,
    pub by_code: BTreeMap<String, u64>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectivityInsight {
    pub total_connections: u64,
    pub total_disconnects: u64,
    pub total_timeouts: u64,
    pub by_address: BTreeMap<String, AddressCounters>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Insights {
    pub timelines: Vec<SessionTimeline>,
    pub quests: Vec<crate::quest::QuestRecord>,
    pub matching: MatchingInsight,
    pub startup: StartupInsight,
    pub errors: ErrorInsight,
    pub inventory: InventoryInsight,
    pub connectivity: ConnectivityInsight,
    pub items: BTreeMap<String, ResolvedEntity>,
    pub traders: BTreeMap<String, ResolvedEntity>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_hit_rate() {
        let mut cache = CacheStats::default();
        assert!(cache.hit_rate().is_none());
        cache.hits = 3;
        cache.misses = 1;
        assert_eq!(cache.hit_rate(), Some(0.75));
    }
}
