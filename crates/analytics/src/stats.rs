//! Statistics aggregation: one fold over all events into domain counters.

use std::collections::BTreeMap;
use std::sync::Arc;

use parser::cache::GameDataCache;
use parser::fields::EventFields;
use parser::model::{LogEvent, LogType, ParsedLog};
use parser::provider::GameDataProvider;

use crate::model::{
    AntiCheatStats, AudioStats, BackendStats, CacheStats, EntityKind, ErrorStats, InventoryStats,
    MatchmakingStats, NetworkStats, PushStats, ResolvedEntity, Statistics,
};
use crate::quest::QuestTracker;
use crate::session::fold_summaries;

pub struct StatisticsAggregator {
    results: Vec<ParsedLog>,
    provider: Option<Arc<dyn GameDataProvider>>,
    cache: Option<Arc<dyn GameDataCache>>,
}

impl StatisticsAggregator {
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

    pub async fn compute(&self) -> Statistics {
        let sessions = fold_summaries(&self.results);

        let mut backend = BackendStats::default();
        let mut cache = CacheStats::default();
        let mut inventory = InventoryStats::default();
        let mut network = NetworkStats::default();
        let mut push = PushStats::default();
        let mut audio = AudioStats::default();
        let mut errors = ErrorStats::default();
        let mut matchmaking = MatchmakingStats::default();
        let mut anticheat = AntiCheatStats::default();
        let mut items: BTreeMap<String, ResolvedEntity> = BTreeMap::new();
        let mut tracker = QuestTracker::new();

        for result in &self.results {
            for event in &result.events {
                accumulate_backend(event, &mut backend);
                accumulate_cache(event, &mut cache);
                accumulate_inventory(event, &mut inventory, &mut items);
                accumulate_network(event, &mut network);
                accumulate_push(event, &mut push);
                accumulate_audio(event, &mut audio);
                accumulate_errors(event, &mut errors);
                accumulate_matchmaking(event, &mut matchmaking);
                accumulate_anticheat(event, &mut anticheat);
                tracker
                    .observe(event, self.provider.as_deref(), self.cache.as_deref())
                    .await;
            }
        }

        let (quests, traders) = tracker.into_parts();

        Statistics {
            sessions,
            backend,
            cache,
            inventory,
            network,
            push,
            audio,
            errors,
            matchmaking,
            anticheat,
            quests,
            traders,
            items,
        }
    }
}

fn bump(map: &mut BTreeMap<String, u64>, key: impl Into<String>) {
    *map.entry(key.into()).or_insert(0) += 1;
}

fn accumulate_backend(event: &LogEvent, backend: &mut BackendStats) {
    if event.log_type != LogType::Backend {
        return;
    }
    let EventFields::Backend(fields) = &event.fields else {
        return;
    };
    match event.event_family.as_str() {
        "request" => {
            backend.total_requests += 1;
            if let Some(url) = &fields.url {
                bump(&mut backend.by_endpoint, url.clone());
            }
        }
        "response" => {
            backend.total_responses += 1;
            if let Some(code) = fields.response_code {
                bump(&mut backend.by_status_code, code.to_string());
            }
            if let Some(url) = &fields.url {
                bump(&mut backend.by_endpoint, url.clone());
            }
        }
        "transport_error" | "server_exception" => {
            backend.total_errors += 1;
            if let Some(code) = fields.response_code {
                bump(&mut backend.by_status_code, code.to_string());
            }
        }
        "retry" => backend.retries += 1,
        _ => {}
    }
}

fn accumulate_cache(event: &LogEvent, cache: &mut CacheStats) {
    if event.log_type != LogType::BackendCache {
        return;
    }
    match &event.fields {
        EventFields::BackendCache(fields) if !fields.cache_hit => cache.misses += 1,
        _ => cache.hits += 1,
    }
}

fn accumulate_inventory(
    event: &LogEvent,
    inventory: &mut InventoryStats,
    items: &mut BTreeMap<String, ResolvedEntity>,
) {
    if event.log_type != LogType::Inventory {
        return;
    }
    inventory.total_rejections += 1;
    let EventFields::Inventory(fields) = &event.fields else {
        return;
    };
    if let Some(op) = &fields.operation_type {
        bump(&mut inventory.by_operation, op.clone());
    }
    if let Some(code) = fields.code {
        bump(&mut inventory.by_code, code.to_string());
    }
    if let Some(item_id) = &fields.item_id {
        bump(&mut inventory.items, item_id.clone());
        items
            .entry(item_id.clone())
            .or_insert_with(|| ResolvedEntity::unresolved(item_id, EntityKind::Item));
    }
}

fn accumulate_network(event: &LogEvent, network: &mut NetworkStats) {
    if event.log_type == LogType::NetworkConnection {
        let EventFields::NetworkConnection(fields) = &event.fields else {
            return;
        };
        let address = fields.address.clone().unwrap_or_else(|| "unknown".to_string());
        let entry = network.by_address.entry(address).or_default();
        match event.event_family.as_str() {
            "connect" | "state_enter" => {
                network.connections += 1;
                entry.connect += 1;
            }
            "disconnect" | "send_disconnect" => {
                network.disconnects += 1;
                entry.disconnect += 1;
                if let Some(reason) = fields.disconnect_reason {
                    bump(&mut network.metrics.disconnect_reasons, reason.to_string());
                }
            }
            "timeout" => {
                network.timeouts += 1;
                entry.timeout += 1;
            }
            "statistics" => {
                // Running averages for link quality; totals for packets.
                if let Some(rtt) = fields.rtt {
                    network.metrics.rtt_samples += 1;
                    let current = network.metrics.rtt_avg.unwrap_or(0.0);
                    network.metrics.rtt_avg = Some(
                        current + (rtt as f64 - current) / network.metrics.rtt_samples as f64,
                    );
                }
                network.metrics.total_packets_lost += fields.packets_lost.unwrap_or(0);
                network.metrics.total_packets_sent += fields.packets_sent.unwrap_or(0);
                network.metrics.total_packets_received += fields.packets_received.unwrap_or(0);
            }
            _ => {}
        }
    }

    if event.log_type == LogType::NetworkMessages {
        let EventFields::NetworkMessages(fields) = &event.fields else {
            return;
        };
        network.metrics.samples += 1;
        let samples = network.metrics.samples as f64;
        let rpi = fields.rpi.unwrap_or(0.0);
        let current = network.metrics.rpi_avg.unwrap_or(0.0);
        network.metrics.rpi_avg = Some(current + (rpi - current) / samples);
        let lud = fields.lud.unwrap_or(0.0);
        let current = network.metrics.lud_avg.unwrap_or(0.0);
        network.metrics.lud_avg = Some(current + (lud - current) / samples);
    }
}

fn accumulate_push(event: &LogEvent, push: &mut PushStats) {
    if event.log_type != LogType::PushNotifications {
        return;
    }
    match event.event_family.as_str() {
        "connection_params" => push.connections += 1,
        "dropped" => push.drops += 1,
        "notification" | "simple_notification" => push.notifications += 1,
        _ => {}
    }
}

fn accumulate_audio(event: &LogEvent, audio: &mut AudioStats) {
    if event.log_type != LogType::SpatialAudio {
        return;
    }
    if event.event_family == "init_success" {
        audio.init_success += 1;
    }
    if event.event_family == "occlusion_error" {
        audio.occlusion_errors += 1;
    }
}

fn accumulate_errors(event: &LogEvent, errors: &mut ErrorStats) {
    // Only the canonical errors log counts here. The same failure also
    // appears in its source component's log; counting both would double it.
    if event.log_type != LogType::Errors {
        return;
    }
    errors.totals += 1;
    bump(&mut errors.by_family, event.event_family.clone());
}

fn accumulate_matchmaking(event: &LogEvent, matchmaking: &mut MatchmakingStats) {
    if event.log_type != LogType::Application || event.event_family != "matchmaking" {
        return;
    }
    matchmaking.events.push(event.clone());
    if let EventFields::Application(fields) = &event.fields {
        if let Some(group_id) = &fields.group_id {
            if !matchmaking.group_ids.contains(group_id) {
                matchmaking.group_ids.push(group_id.clone());
            }
        }
    }
}

fn accumulate_anticheat(event: &LogEvent, anticheat: &mut AntiCheatStats) {
    if event.log_type != LogType::Application {
        return;
    }
    if event.event_family == "anticheat" {
        anticheat.init_lines += 1;
        anticheat.last_status = Some(event.message.clone());
    }
    if event.event_family == "error" && event.message.to_lowercase().contains("battleye") {
        anticheat.errors += 1;
    }
}
