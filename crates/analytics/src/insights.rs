//! Insight building: session timelines, matchmaking and startup durations,
//! and the error/inventory/connectivity summaries.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use chrono::DateTime;

use parser::cache::GameDataCache;
use parser::fields::EventFields;
use parser::model::{LogType, ParsedLog};
use parser::provider::GameDataProvider;

use crate::model::{
    ConnectivityInsight, EntityKind, ErrorInsight, Insights, InventoryInsight, MatchingInsight,
    MatchingSession, ResolvedEntity, SessionTimeline, StartupInsight, StartupSession,
};
use crate::quest::QuestTracker;
use crate::session::{stats_session_id, timeline_session_id};

pub struct InsightsBuilder {
    results: Vec<ParsedLog>,
    provider: Option<Arc<dyn GameDataProvider>>,
    cache: Option<Arc<dyn GameDataCache>>,
}

impl InsightsBuilder {
    pub fn new(results: Vec<ParsedLog>) -> Self {
        Self {
            results,
            provider: None,
            cache: None,
        }
    }

    pub fn with_provider(mut self, provider: Arc<dyn GameDataProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn with_cache(mut self, cache: Arc<dyn GameDataCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub async fn compute(&self) -> Insights {
        let (quests, traders) = self.build_quests().await;
        Insights {
            timelines: self.build_timelines(),
            quests,
            matching: self.build_matching(),
            startup: self.build_startup(),
            errors: self.build_errors(),
            inventory: self.build_inventory(),
            connectivity: self.build_connectivity(),
            items: self.build_items(),
            traders,
        }
    }

    fn build_timelines(&self) -> Vec<SessionTimeline> {
        let mut order: Vec<String> = Vec::new();
        let mut by_session: HashMap<String, SessionTimeline> = HashMap::new();

        for (ordinal, result) in self.results.iter().enumerate() {
            let session_id = timeline_session_id(result, ordinal);
            if !by_session.contains_key(&session_id) {
                order.push(session_id.clone());
            }
            let timeline = by_session
                .entry(session_id.clone())
                .or_insert_with(|| SessionTimeline {
                    session_id,
                    build_version: result.meta.build_version.clone(),
                    ..Default::default()
                });

            for event in &result.events {
                let ts = &event.timestamp;
                if ts.is_empty() {
                    continue;
                }
                if timeline.started_at.as_ref().is_none_or(|cur| ts < cur) {
                    timeline.started_at = Some(ts.clone());
                }
                if timeline.ended_at.as_ref().is_none_or(|cur| ts > cur) {
                    timeline.ended_at = Some(ts.clone());
                }
                set_once(&mut timeline.first_backend_at, || {
                    event.log_type == LogType::Backend
                }, ts);
                set_once(&mut timeline.first_connect_at, || {
                    event.log_type == LogType::NetworkConnection
                }, ts);
                set_once(&mut timeline.first_match_event_at, || {
                    event.log_type == LogType::Application && event.event_family == "matchmaking"
                }, ts);
                set_once(&mut timeline.first_inventory_error_at, || {
                    event.log_type == LogType::Inventory
                }, ts);
                set_once(&mut timeline.first_error_at, || {
                    event.level.is_some_and(|l| l.is_error())
                }, ts);
            }
        }

        let mut timelines: Vec<SessionTimeline> = order
            .into_iter()
            .filter_map(|id| by_session.remove(&id))
            .collect();
        for timeline in &mut timelines {
            timeline.startup_duration_ms =
                duration_ms(timeline.started_at.as_deref(), timeline.first_backend_at.as_deref());
            timeline.matchmaking_duration_ms = duration_ms(
                timeline.first_match_event_at.as_deref(),
                timeline.first_connect_at.as_deref(),
            );
        }
        timelines
    }

    fn build_matching(&self) -> MatchingInsight {
        let mut order: Vec<String> = Vec::new();
        let mut by_session: HashMap<String, MatchingSession> = HashMap::new();

        for result in self
            .results
            .iter()
            .filter(|r| r.log_type == LogType::Application)
        {
            let session_id = stats_session_id(result);
            if !by_session.contains_key(&session_id) {
                order.push(session_id.clone());
            }
            let agg = by_session
                .entry(session_id.clone())
                .or_insert_with(|| MatchingSession {
                    session_id,
                    ..Default::default()
                });

            for event in &result.events {
                if event.event_family != "matchmaking" {
                    continue;
                }
                if agg.group_id.is_none() {
                    if let EventFields::Application(fields) = &event.fields {
                        agg.group_id = fields.group_id.clone();
                    }
                }
                if agg.started_at.is_none() {
                    agg.started_at = Some(event.timestamp.clone());
                }
                if event.message.contains("GamePrepared") && agg.prepared_at.is_none() {
                    agg.prepared_at = Some(event.timestamp.clone());
                }
                if event.message.contains("GameRunned") && agg.runned_at.is_none() {
                    agg.runned_at = Some(event.timestamp.clone());
                }
            }
        }

        let mut sessions = Vec::new();
        for id in order {
            let Some(mut agg) = by_session.remove(&id) else {
                continue;
            };
            if agg.started_at.is_none() && agg.prepared_at.is_none() && agg.runned_at.is_none() {
                continue;
            }
            agg.duration_ms = duration_ms(
                agg.started_at.as_deref(),
                agg.runned_at.as_deref().or(agg.prepared_at.as_deref()),
            );
            sessions.push(agg);
        }
        let average_duration_ms = average(sessions.iter().filter_map(|s| s.duration_ms));
        MatchingInsight {
            sessions,
            average_duration_ms,
        }
    }

    fn build_startup(&self) -> StartupInsight {
        let mut order: Vec<String> = Vec::new();
        let mut by_session: HashMap<String, StartupSession> = HashMap::new();

        for result in &self.results {
            let session_id = stats_session_id(result);
            if !by_session.contains_key(&session_id) {
                order.push(session_id.clone());
            }
            let entry = by_session
                .entry(session_id.clone())
                .or_insert_with(|| StartupSession {
                    session_id,
                    ..Default::default()
                });

            for event in &result.events {
                let ts = &event.timestamp;
                if ts.is_empty() {
                    continue;
                }
                if entry.started_at.as_ref().is_none_or(|cur| ts < cur) {
                    entry.started_at = Some(ts.clone());
                }
                if result.log_type == LogType::Backend
                    && entry.first_backend_at.as_ref().is_none_or(|cur| ts < cur)
                {
                    entry.first_backend_at = Some(ts.clone());
                }
            }
        }

        let mut sessions: Vec<StartupSession> = order
            .into_iter()
            .filter_map(|id| by_session.remove(&id))
            .collect();
        for session in &mut sessions {
            session.duration_ms =
                duration_ms(session.started_at.as_deref(), session.first_backend_at.as_deref());
        }
        let average_duration_ms = average(sessions.iter().filter_map(|s| s.duration_ms));
        StartupInsight {
            sessions,
            average_duration_ms,
        }
    }

    fn build_errors(&self) -> ErrorInsight {
        let mut insight = ErrorInsight::default();
        for result in self.results.iter().filter(|r| r.log_type == LogType::Errors) {
            for event in &result.events {
                insight.total += 1;
                *insight
                    .by_family
                    .entry(event.event_family.clone())
                    .or_insert(0) += 1;
                if insight.first_at.is_none() {
                    insight.first_at = Some(event.timestamp.clone());
                }
            }
        }
        insight
    }

    fn build_inventory(&self) -> InventoryInsight {
        let mut insight = InventoryInsight::default();
        for result in self
            .results
            .iter()
            .filter(|r| r.log_type == LogType::Inventory)
        {
            for event in &result.events {
                insight.total_rejections += 1;
                let EventFields::Inventory(fields) = &event.fields else {
                    continue;
                };
                if let Some(op) = &fields.operation_type {
                    *insight.by_operation.entry(op.clone()).or_insert(0) += 1;
                }
                if let Some(code) = fields.code {
                    *insight.by_code.entry(code.to_string()).or_insert(0) += 1;
                }
            }
        }
        insight
    }

    fn build_connectivity(&self) -> ConnectivityInsight {
        let mut insight = ConnectivityInsight::default();
        for result in self
            .results
            .iter()
            .filter(|r| r.log_type == LogType::NetworkConnection)
        {
            for event in &result.events {
                let address = match &event.fields {
                    EventFields::NetworkConnection(fields) => fields
                        .address
                        .clone()
                        .unwrap_or_else(|| "unknown".to_string()),
                    _ => "unknown".to_string(),
                };
                let entry = insight.by_address.entry(address).or_default();
                match event.event_family.as_str() {
                    "connect" | "state_enter" => {
                        entry.connect += 1;
                        insight.total_connections += 1;
                    }
                    "disconnect" | "send_disconnect" => {
                        entry.disconnect += 1;
                        insight.total_disconnects += 1;
                    }
                    "timeout" => {
                        entry.timeout += 1;
                        insight.total_timeouts += 1;
                    }
                    _ => {}
                }
            }
        }
        insight
    }

    fn build_items(&self) -> BTreeMap<String, ResolvedEntity> {
        let mut items = BTreeMap::new();
        for result in &self.results {
            for event in &result.events {
                if let Some(item_id) = event.fields.item_id() {
                    items
                        .entry(item_id.to_string())
                        .or_insert_with(|| ResolvedEntity::unresolved(item_id, EntityKind::Item));
                }
            }
        }
        items
    }

    async fn build_quests(
        &self,
    ) -> (Vec<crate::quest::QuestRecord>, BTreeMap<String, ResolvedEntity>) {
        let mut tracker = QuestTracker::new();
        for result in &self.results {
            for event in &result.events {
                tracker
                    .observe(event, self.provider.as_deref(), self.cache.as_deref())
                    .await;
            }
        }
        tracker.into_parts()
    }
}

fn set_once(slot: &mut Option<String>, applies: impl FnOnce() -> bool, ts: &str) {
    if slot.is_none() && applies() {
        *slot = Some(ts.to_string());
    }
}

/// Milliseconds between two normalized timestamps, clamped at zero. `None`
/// when either endpoint is missing or does not parse.
fn duration_ms(start: Option<&str>, end: Option<&str>) -> Option<i64> {
    let start = DateTime::parse_from_rfc3339(start?).ok()?;
    let end = DateTime::parse_from_rfc3339(end?).ok()?;
    Some((end - start).num_milliseconds().max(0))
}

fn average(values: impl Iterator<Item = i64>) -> Option<f64> {
    let collected: Vec<i64> = values.collect();
    if collected.is_empty() {
        return None;
    }
    Some(collected.iter().sum::<i64>() as f64 / collected.len() as f64)
}
