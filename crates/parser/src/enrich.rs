//! Post-parse enrichment.
//!
//! Strictly additive: identifiers found in event fields are resolved through
//! the cache/provider pair and written back next to the id. Failures and
//! unknown ids leave the event untouched; repeating the pass is a no-op once
//! fields are populated. Events are enriched concurrently; each task owns
//! exactly one event, so no synchronization beyond the cache is needed.

use futures::future::join_all;

use crate::cache::{read_through, GameDataCache};
use crate::model::{LogEvent, ParsedLog};
use crate::provider::GameDataProvider;

pub async fn enrich_result(
    result: &mut ParsedLog,
    provider: &dyn GameDataProvider,
    cache: Option<&dyn GameDataCache>,
) {
    join_all(
        result
            .events
            .iter_mut()
            .map(|event| enrich_event(event, provider, cache)),
    )
    .await;
}

async fn enrich_event(
    event: &mut LogEvent,
    provider: &dyn GameDataProvider,
    cache: Option<&dyn GameDataCache>,
) {
    if let Some(item_id) = event.fields.item_id().map(str::to_string) {
        if event.fields.resolved_item().is_none() {
            let key = format!("item:{item_id}");
            if let Some(item) =
                read_through(cache, &key, || provider.item_by_id(&item_id)).await
            {
                event.fields.set_resolved_item(item);
            }
        }
    }

    if let Some(trader_id) = event.fields.trader_id().map(str::to_string) {
        if event.fields.resolved_trader().is_none() {
            let key = format!("trader:{trader_id}");
            if let Some(trader) =
                read_through(cache, &key, || provider.trader_by_id(&trader_id)).await
            {
                event.fields.set_resolved_trader(trader);
            }
        }
    }

    if let Some(quest_id) = event.fields.quest_id().map(str::to_string) {
        if event.fields.resolved_quest().is_none() {
            let key = format!("quest:{quest_id}");
            if let Some(quest) =
                read_through(cache, &key, || provider.quest_by_id(&quest_id)).await
            {
                event.fields.set_resolved_quest(quest);
            }
        }
    }

    if let Some(location_id) = event.fields.location_id().map(str::to_string) {
        if event.fields.resolved_location().is_none() {
            let key = format!("location:{location_id}");
            if let Some(location) =
                read_through(cache, &key, || provider.location_by_id(&location_id)).await
            {
                event.fields.set_resolved_location(location);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryCache;
    use crate::fields::{EventFields, PlayerFields};
    use crate::model::{LogLevel, LogType};
    use crate::provider::{ItemData, ProviderError, StaticProvider};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn player_event(item_id: &str) -> LogEvent {
        LogEvent {
            log_type: LogType::Player,
            timestamp: "2025-12-08T15:22:00.000Z".to_string(),
            timestamp_raw: "2025-12-08 15:22:00.000".to_string(),
            version: None,
            level: Some(LogLevel::Error),
            component: "player",
            message: format!("Could not find item with id: {item_id}"),
            event_family: "missing_item".to_string(),
            continuation: None,
            fields: EventFields::Player(PlayerFields {
                item_id: Some(item_id.to_string()),
                ..Default::default()
            }),
        }
    }

    fn salewa() -> ItemData {
        ItemData {
            id: "5755356824597772cb798962".to_string(),
            name: "Salewa first aid kit".to_string(),
            short_name: Some("Salewa".to_string()),
            base_price: Some(30000),
            category_names: None,
        }
    }

    struct CountingProvider {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl crate::provider::GameDataProvider for CountingProvider {
        async fn item_by_id(&self, id: &str) -> Result<Option<ItemData>, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(Some(ItemData {
                id: id.to_string(),
                name: "Item".to_string(),
                short_name: None,
                base_price: None,
                category_names: None,
            }))
        }

        async fn quest_by_id(
            &self,
            _id: &str,
        ) -> Result<Option<crate::provider::QuestData>, ProviderError> {
            Ok(None)
        }

        async fn trader_by_id(
            &self,
            _id: &str,
        ) -> Result<Option<crate::provider::TraderData>, ProviderError> {
            Ok(None)
        }
    }

    #[tokio::test]
    async fn test_item_resolution_written_back() {
        let provider = StaticProvider::new().with_item(salewa());
        let mut result = ParsedLog::assemble(
            LogType::Player,
            vec![player_event("5755356824597772cb798962")],
            None,
        );
        enrich_result(&mut result, &provider, None).await;
        let resolved = result.events[0].fields.resolved_item().unwrap();
        assert_eq!(resolved.name, "Salewa first aid kit");
    }

    #[tokio::test]
    async fn test_unknown_id_leaves_event_untouched() {
        let provider = StaticProvider::new();
        let mut result =
            ParsedLog::assemble(LogType::Player, vec![player_event("ffffffffffffffffffffffff")], None);
        enrich_result(&mut result, &provider, None).await;
        assert!(result.events[0].fields.resolved_item().is_none());
    }

    #[tokio::test]
    async fn test_repeat_ids_cost_one_lookup_and_pass_is_idempotent() {
        let provider = CountingProvider {
            calls: AtomicUsize::new(0),
        };
        let cache = MemoryCache::new();
        let mut result = ParsedLog::assemble(
            LogType::Player,
            vec![player_event("aaaaaaaaaaaaaaaaaaaaaaaa"), player_event("aaaaaaaaaaaaaaaaaaaaaaaa")],
            None,
        );

        enrich_result(&mut result, &provider, Some(&cache)).await;
        assert!(result.events[0].fields.resolved_item().is_some());
        assert!(result.events[1].fields.resolved_item().is_some());
        let first_round = provider.calls.load(Ordering::SeqCst);
        assert!(first_round <= 2);

        // Second pass: everything already resolved, the provider stays idle.
        enrich_result(&mut result, &provider, Some(&cache)).await;
        assert_eq!(provider.calls.load(Ordering::SeqCst), first_round);
    }
}
