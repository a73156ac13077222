//! Quest tracking.
//!
//! Quests are discovered by id across every log type and advanced through a
//! small idempotent state machine. The first sighting of an id triggers
//! exactly one external resolution (quest name + trader, with the trader's
//! display name going through the read-through cache); later sightings only
//! append and evaluate transitions. `completed` and `failed` are terminal.

use std::collections::{BTreeMap, HashMap};

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use parser::cache::{read_through, GameDataCache};
use parser::fields::EventFields;
use parser::model::LogEvent;
use parser::provider::{GameDataProvider, TraderData};

use crate::model::{EntityKind, ResolvedEntity};

static QUEST_ID: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\b([0-9a-f]{24})\b").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestStatus {
    Unknown,
    Started,
    Completed,
    Failed,
}

impl QuestStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, QuestStatus::Completed | QuestStatus::Failed)
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestRecord {
    pub id: String,
    pub name: Option<String>,
    pub trader_id: Option<String>,
    pub trader_name: Option<String>,
    pub status: QuestStatus,
    pub started_at: Option<String>,
    pub completed_at: Option<String>,
    pub failed_at: Option<String>,
    pub reward_rubles: Option<u64>,
    pub reward_items: BTreeMap<String, u64>,
    pub related_events: Vec<LogEvent>,
}

impl QuestRecord {
    fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            name: None,
            trader_id: None,
            trader_name: None,
            status: QuestStatus::Unknown,
            started_at: None,
            completed_at: None,
            failed_at: None,
            reward_rubles: None,
            reward_items: BTreeMap::new(),
            related_events: Vec::new(),
        }
    }
}

/// Quest identity: a 24-hex token in the free-text message, else the
/// structured quest-id field.
pub fn find_quest_id(event: &LogEvent) -> Option<String> {
    if let Some(caps) = QUEST_ID.captures(&event.message) {
        return Some(caps[1].to_string());
    }
    event.fields.quest_id().map(str::to_string)
}

#[derive(Default)]
pub struct QuestTracker {
    quests: HashMap<String, QuestRecord>,
    order: Vec<String>,
    traders: BTreeMap<String, ResolvedEntity>,
}

impl QuestTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn observe(
        &mut self,
        event: &LogEvent,
        provider: Option<&dyn GameDataProvider>,
        cache: Option<&dyn GameDataCache>,
    ) {
        let Some(quest_id) = find_quest_id(event) else {
            return;
        };

        if !self.quests.contains_key(&quest_id) {
            let mut record = QuestRecord::new(&quest_id);
            if let Some(provider) = provider {
                self.resolve_quest(&mut record, provider, cache).await;
            }
            self.order.push(quest_id.clone());
            self.quests.insert(quest_id.clone(), record);
        }

        let Some(record) = self.quests.get_mut(&quest_id) else {
            return;
        };
        record.related_events.push(event.clone());
        if record.started_at.is_none() {
            record.started_at = Some(event.timestamp.clone());
        }
        advance_status(record, event);
        accumulate_rewards(record, event);
    }

    /// Resolution happens once per quest id, on first sighting only.
    async fn resolve_quest(
        &mut self,
        record: &mut QuestRecord,
        provider: &dyn GameDataProvider,
        cache: Option<&dyn GameDataCache>,
    ) {
        let quest = match provider.quest_by_id(&record.id).await {
            Ok(Some(quest)) => quest,
            Ok(None) => return,
            Err(err) => {
                tracing::debug!(quest_id = %record.id, error = %err, "quest resolution failed");
                return;
            }
        };
        record.name = Some(quest.name);
        record.trader_id = quest.trader_id.clone();

        if let Some(trader_id) = quest.trader_id {
            record.trader_name = self.resolve_trader_name(&trader_id, provider, cache).await;
        }
    }

    async fn resolve_trader_name(
        &mut self,
        trader_id: &str,
        provider: &dyn GameDataProvider,
        cache: Option<&dyn GameDataCache>,
    ) -> Option<String> {
        let entry = self
            .traders
            .entry(trader_id.to_string())
            .or_insert_with(|| ResolvedEntity::unresolved(trader_id, EntityKind::Trader));
        if let Some(name) = &entry.name {
            return Some(name.clone());
        }

        let key = format!("trader:{trader_id}");
        let trader: Option<TraderData> =
            read_through(cache, &key, || provider.trader_by_id(trader_id)).await;
        let name = trader.map(|t| t.name);
        if let Some(name) = &name {
            if let Some(entry) = self.traders.get_mut(trader_id) {
                entry.name = Some(name.clone());
            }
        }
        name
    }

    pub fn quests(&self) -> impl Iterator<Item = &QuestRecord> {
        self.order.iter().filter_map(|id| self.quests.get(id))
    }

    /// Records in first-seen order plus the trader registry.
    pub fn into_parts(mut self) -> (Vec<QuestRecord>, BTreeMap<String, ResolvedEntity>) {
        let records = self
            .order
            .iter()
            .filter_map(|id| self.quests.remove(id))
            .collect();
        (records, self.traders)
    }
}

/// Transition rule, case-insensitive, structured status field first and
/// message text second. Terminal states never change.
fn advance_status(record: &mut QuestRecord, event: &LogEvent) {
    if record.status.is_terminal() {
        return;
    }

    let signal = event
        .fields
        .quest_status()
        .map(str::to_lowercase)
        .unwrap_or_else(|| event.message.to_lowercase());

    if signal.contains("completed") || signal.contains("success") {
        record.status = QuestStatus::Completed;
        if record.completed_at.is_none() {
            record.completed_at = Some(event.timestamp.clone());
        }
    } else if signal.contains("fail") {
        record.status = QuestStatus::Failed;
        if record.failed_at.is_none() {
            record.failed_at = Some(event.timestamp.clone());
        }
    } else if (signal.contains("start") || signal.contains("description"))
        && record.status == QuestStatus::Unknown
    {
        record.status = QuestStatus::Started;
    }
}

fn accumulate_rewards(record: &mut QuestRecord, event: &LogEvent) {
    if let EventFields::Push(fields) = &event.fields {
        if let Some(rubles) = fields.quest_reward_rubles {
            *record.reward_rubles.get_or_insert(0) += rubles;
        }
        if let Some(items) = &fields.quest_reward_items {
            for tpl in items {
                *record.reward_items.entry(tpl.clone()).or_insert(0) += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use parser::formats::{ErrorsLogs, PushNotificationsLogs};
    use parser::provider::{ItemData, ProviderError, QuestData, StaticProvider};
    use parser::registry::LogClassifier;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const QUEST: &str = "5936d90786f7742b1420ba5b";

    fn quest_event(status_token: &str) -> LogEvent {
        let content = format!(
            "2025-12-08 15:03:00.000|1.0.0.2|Info|push-notifications|Got notification | ChatMessageReceived\n\
             {{\"type\": \"new_message\", \"message\": {{\"templateId\": \"{QUEST} {status_token}\"}}}}\n"
        );
        PushNotificationsLogs.parse(&content, None).events.remove(0)
    }

    fn errors_event(message: &str) -> LogEvent {
        let line = format!("2025-12-08 15:05:00.000|1.0.0.2|Error|errors|{message}");
        ErrorsLogs.parse(&line, None).events.remove(0)
    }

    #[tokio::test]
    async fn test_status_never_regresses_after_completion() {
        let mut tracker = QuestTracker::new();
        tracker.observe(&quest_event("successMessageText"), None, None).await;
        tracker
            .observe(&quest_event("failMessageText"), None, None)
            .await;

        let (records, _) = tracker.into_parts();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].status, QuestStatus::Completed);
        assert_eq!(records[0].related_events.len(), 2);
    }

    #[tokio::test]
    async fn test_started_only_from_unknown() {
        let mut tracker = QuestTracker::new();
        tracker.observe(&quest_event("failMessageText"), None, None).await;
        tracker.observe(&quest_event("description"), None, None).await;

        let (records, _) = tracker.into_parts();
        assert_eq!(records[0].status, QuestStatus::Failed);
    }

    #[tokio::test]
    async fn test_quest_id_found_in_free_text() {
        let mut tracker = QuestTracker::new();
        let event = errors_event(&format!("Cant find counter for Quest {QUEST} in profile"));
        tracker.observe(&event, None, None).await;

        let (records, _) = tracker.into_parts();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, QUEST);
        assert_eq!(records[0].status, QuestStatus::Unknown);
    }

    #[tokio::test]
    async fn test_resolution_happens_once_and_fills_trader() {
        struct CountingProvider {
            quest_calls: AtomicUsize,
            trader_calls: AtomicUsize,
        }

        #[async_trait]
        impl GameDataProvider for CountingProvider {
            async fn item_by_id(&self, _id: &str) -> Result<Option<ItemData>, ProviderError> {
                Ok(None)
            }
            async fn quest_by_id(&self, id: &str) -> Result<Option<QuestData>, ProviderError> {
                self.quest_calls.fetch_add(1, Ordering::SeqCst);
                Ok(Some(QuestData {
                    id: id.to_string(),
                    name: "Debut".to_string(),
                    trader_id: Some("54cb50c76803fa8b248b4571".to_string()),
                    experience: None,
                }))
            }
            async fn trader_by_id(&self, id: &str) -> Result<Option<TraderData>, ProviderError> {
                self.trader_calls.fetch_add(1, Ordering::SeqCst);
                Ok(Some(TraderData {
                    id: id.to_string(),
                    name: "Prapor".to_string(),
                    nickname: None,
                }))
            }
        }

        let provider = CountingProvider {
            quest_calls: AtomicUsize::new(0),
            trader_calls: AtomicUsize::new(0),
        };
        let mut tracker = QuestTracker::new();
        tracker
            .observe(&quest_event("description"), Some(&provider), None)
            .await;
        tracker
            .observe(&quest_event("successMessageText"), Some(&provider), None)
            .await;

        assert_eq!(provider.quest_calls.load(Ordering::SeqCst), 1);
        assert_eq!(provider.trader_calls.load(Ordering::SeqCst), 1);

        let (records, traders) = tracker.into_parts();
        assert_eq!(records[0].name.as_deref(), Some("Debut"));
        assert_eq!(records[0].trader_name.as_deref(), Some("Prapor"));
        assert_eq!(records[0].status, QuestStatus::Completed);
        assert!(traders.contains_key("54cb50c76803fa8b248b4571"));
    }

    #[tokio::test]
    async fn test_provider_failure_leaves_record_unresolved() {
        struct FailingProvider;

        #[async_trait]
        impl GameDataProvider for FailingProvider {
            async fn item_by_id(&self, _id: &str) -> Result<Option<ItemData>, ProviderError> {
                Err(ProviderError::Transport("offline".to_string()))
            }
            async fn quest_by_id(&self, _id: &str) -> Result<Option<QuestData>, ProviderError> {
                Err(ProviderError::Transport("offline".to_string()))
            }
            async fn trader_by_id(&self, _id: &str) -> Result<Option<TraderData>, ProviderError> {
                Err(ProviderError::Transport("offline".to_string()))
            }
        }

        let mut tracker = QuestTracker::new();
        tracker
            .observe(&quest_event("description"), Some(&FailingProvider), None)
            .await;

        let (records, _) = tracker.into_parts();
        assert!(records[0].name.is_none());
        assert_eq!(records[0].status, QuestStatus::Started);
    }

    #[tokio::test]
    async fn test_rewards_accumulate_across_events() {
        let reward = |rubles: u64| -> LogEvent {
            let content = format!(
                "2025-12-08 15:03:00.000|1.0.0.2|Info|push-notifications|Got notification | ChatMessageReceived\n\
                 {{\"type\": \"new_message\", \"message\": {{\"templateId\": \"{QUEST} successMessageText\",\n\
                 \"items\": {{\"data\": [\n\
                   {{\"_tpl\": \"5449016a4bdc2d6f028b456f\", \"upd\": {{\"StackObjectsCount\": {rubles}}}}},\n\
                   {{\"_tpl\": \"590c657e86f77412b013051d\"}}\n\
                 ]}}}}}}\n"
            );
            PushNotificationsLogs.parse(&content, None).events.remove(0)
        };

        let mut tracker = QuestTracker::new();
        tracker.observe(&reward(10_000), None, None).await;
        tracker.observe(&reward(15_000), None, None).await;

        let (records, _) = tracker.into_parts();
        assert_eq!(records[0].reward_rubles, Some(25_000));
        assert_eq!(
            records[0].reward_items.get("590c657e86f77412b013051d"),
            Some(&2)
        );
    }

    #[tokio::test]
    async fn test_static_provider_resolution() {
        let provider = StaticProvider::new().with_quest(QuestData {
            id: QUEST.to_string(),
            name: "Debut".to_string(),
            trader_id: None,
            experience: None,
        });
        let mut tracker = QuestTracker::new();
        tracker
            .observe(&quest_event("description"), Some(&provider), None)
            .await;
        let (records, traders) = tracker.into_parts();
        assert_eq!(records[0].name.as_deref(), Some("Debut"));
        assert!(traders.is_empty());
    }
}
