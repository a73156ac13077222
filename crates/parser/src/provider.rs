//! Game-data provider boundary.
//!
//! The core only ever talks to the provider through this trait; transport
//! failures are surfaced as `ProviderError` and treated as "not resolved" by
//! every caller. `StaticProvider` is an in-memory implementation for offline
//! use and tests.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("transport failure: {0}")]
    Transport(String),

    #[error("malformed provider response: {0}")]
    BadResponse(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemData {
    pub id: String,
    pub name: String,
    pub short_name: Option<String>,
    pub base_price: Option<u64>,
    pub category_names: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestData {
    pub id: String,
    pub name: String,
    pub trader_id: Option<String>,
    pub experience: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TraderData {
    pub id: String,
    pub name: String,
    pub nickname: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationData {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

#[async_trait]
pub trait GameDataProvider: Send + Sync {
    async fn item_by_id(&self, id: &str) -> Result<Option<ItemData>, ProviderError>;

    async fn quest_by_id(&self, id: &str) -> Result<Option<QuestData>, ProviderError>;

    async fn trader_by_id(&self, id: &str) -> Result<Option<TraderData>, ProviderError>;

    /// Optional lookup; providers without location data keep the default.
    async fn location_by_id(&self, _id: &str) -> Result<Option<LocationData>, ProviderError> {
        Ok(None)
    }
}

/// Provider backed by fixed in-memory tables.
#[derive(Debug, Default)]
pub struct StaticProvider {
    items: HashMap<String, ItemData>,
    quests: HashMap<String, QuestData>,
    traders: HashMap<String, TraderData>,
    locations: HashMap<String, LocationData>,
}

impl StaticProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_item(mut self, item: ItemData) -> Self {
        self.items.insert(item.id.clone(), item);
        self
    }

    pub fn with_quest(mut self, quest: QuestData) -> Self {
        self.quests.insert(quest.id.clone(), quest);
        self
    }

    pub fn with_trader(mut self, trader: TraderData) -> Self {
        self.traders.insert(trader.id.clone(), trader);
        self
    }

    pub fn with_location(mut self, location: LocationData) -> Self {
        self.locations.insert(location.id.clone(), location);
        self
    }
}

#[async_trait]
impl GameDataProvider for StaticProvider {
    async fn item_by_id(&self, id: &str) -> Result<Option<ItemData>, ProviderError> {
        Ok(self.items.get(id).cloned())
    }

    async fn quest_by_id(&self, id: &str) -> Result<Option<QuestData>, ProviderError> {
        Ok(self.quests.get(id).cloned())
    }

    async fn trader_by_id(&self, id: &str) -> Result<Option<TraderData>, ProviderError> {
        Ok(self.traders.get(id).cloned())
    }

    async fn location_by_id(&self, id: &str) -> Result<Option<LocationData>, ProviderError> {
        Ok(self.locations.get(id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_static_provider_round_trip() {
        let provider = StaticProvider::new()
            .with_quest(QuestData {
                id: "5936d90786f7742b1420ba5b".to_string(),
                name: "Debut".to_string(),
                trader_id: Some("54cb50c76803fa8b248b4571".to_string()),
                experience: Some(1700),
            })
            .with_trader(TraderData {
                id: "54cb50c76803fa8b248b4571".to_string(),
                name: "Prapor".to_string(),
                nickname: None,
            });

        let quest = provider
            .quest_by_id("5936d90786f7742b1420ba5b")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(quest.name, "Debut");
        assert!(provider.item_by_id("missing").await.unwrap().is_none());
        assert!(provider.location_by_id("factory").await.unwrap().is_none());
    }
}
