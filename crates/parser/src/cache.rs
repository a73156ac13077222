//! Key/value cache boundary for memoized external lookups.
//!
//! The cache stores JSON values; typed access goes through `read_through`,
//! which owns the memoization policy in one place: consult the cache, on a
//! miss run the injected loader, write the resolved value back. Entries are
//! never re-resolved once present.

use std::collections::HashMap;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::provider::ProviderError;

#[async_trait]
pub trait GameDataCache: Send + Sync {
    async fn get(&self, key: &str) -> Option<serde_json::Value>;

    async fn set(&self, key: &str, value: serde_json::Value);
}

/// Read-through resolution against an optional cache.
///
/// Loader failures and `None` results leave the cache untouched and resolve
/// to `None`; the caller's record simply stays unresolved.
pub async fn read_through<T, F, Fut>(
    cache: Option<&dyn GameDataCache>,
    key: &str,
    load: F,
) -> Option<T>
where
    T: Serialize + DeserializeOwned,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<Option<T>, ProviderError>>,
{
    if let Some(cache) = cache {
        if let Some(value) = cache.get(key).await {
            if let Ok(hit) = serde_json::from_value(value) {
                return Some(hit);
            }
            tracing::debug!(key, "cache entry no longer deserializes, reloading");
        }
    }

    match load().await {
        Ok(Some(resolved)) => {
            if let Some(cache) = cache {
                if let Ok(value) = serde_json::to_value(&resolved) {
                    cache.set(key, value).await;
                }
            }
            Some(resolved)
        }
        Ok(None) => None,
        Err(err) => {
            tracing::debug!(key, error = %err, "lookup failed, leaving unresolved");
            None
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CacheRecord {
    value: serde_json::Value,
    expires_at: Option<i64>,
}

impl CacheRecord {
    fn expired(&self, now_ms: i64) -> bool {
        self.expires_at.is_some_and(|at| now_ms > at)
    }
}

/// JSON-file-backed cache with optional TTL.
///
/// The backing file is loaded lazily on first access and rewritten after
/// every mutation. Entries live in a concurrent map, so reads and writes to
/// distinct keys do not contend; the persistence step is serialized.
pub struct FileCache {
    storage_path: PathBuf,
    ttl: Option<Duration>,
    entries: DashMap<String, CacheRecord>,
    loaded: Mutex<bool>,
    persist_lock: Mutex<()>,
}

impl FileCache {
    pub fn new(storage_path: impl Into<PathBuf>, ttl: Option<Duration>) -> Self {
        Self {
            storage_path: storage_path.into(),
            ttl,
            entries: DashMap::new(),
            loaded: Mutex::new(false),
            persist_lock: Mutex::new(()),
        }
    }

    pub fn storage_path(&self) -> &Path {
        &self.storage_path
    }

    async fn ensure_loaded(&self) {
        let mut loaded = self.loaded.lock().await;
        if *loaded {
            return;
        }
        match tokio::fs::read_to_string(&self.storage_path).await {
            Ok(content) => match serde_json::from_str::<HashMap<String, CacheRecord>>(&content) {
                Ok(stored) => {
                    for (key, record) in stored {
                        self.entries.insert(key, record);
                    }
                }
                Err(err) => {
                    tracing::warn!(path = %self.storage_path.display(), error = %err,
                        "cache file unreadable, starting empty");
                }
            },
            // Missing file is the normal first-run state.
            Err(_) => {}
        }
        *loaded = true;
    }

    async fn persist(&self) {
        let _guard = self.persist_lock.lock().await;
        let snapshot: HashMap<String, CacheRecord> = self
            .entries
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect();
        let body = match serde_json::to_string_pretty(&snapshot) {
            Ok(body) => body,
            Err(err) => {
                tracing::warn!(error = %err, "cache snapshot failed to serialize");
                return;
            }
        };
        if let Some(parent) = self.storage_path.parent() {
            if let Err(err) = tokio::fs::create_dir_all(parent).await {
                tracing::warn!(error = %err, "cache directory creation failed");
                return;
            }
        }
        if let Err(err) = tokio::fs::write(&self.storage_path, body).await {
            tracing::warn!(path = %self.storage_path.display(), error = %err,
                "cache persistence failed");
        }
    }
}

#[async_trait]
impl GameDataCache for FileCache {
    async fn get(&self, key: &str) -> Option<serde_json::Value> {
        self.ensure_loaded().await;
        let now_ms = Utc::now().timestamp_millis();
        {
            let record = self.entries.get(key)?;
            if !record.expired(now_ms) {
                return Some(record.value.clone());
            }
        }
        self.entries.remove(key);
        self.persist().await;
        None
    }

    async fn set(&self, key: &str, value: serde_json::Value) {
        self.ensure_loaded().await;
        let expires_at = self
            .ttl
            .map(|ttl| Utc::now().timestamp_millis() + ttl.as_millis() as i64);
        self.entries
            .insert(key.to_string(), CacheRecord { value, expires_at });
        self.persist().await;
    }
}

/// Purely in-memory cache, for callers that do not want persistence.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: DashMap<String, serde_json::Value>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl GameDataCache for MemoryCache {
    async fn get(&self, key: &str) -> Option<serde_json::Value> {
        self.entries.get(key).map(|entry| entry.value().clone())
    }

    async fn set(&self, key: &str, value: serde_json::Value) {
        self.entries.insert(key.to_string(), value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_file_cache_set_get() {
        let dir = tempfile::tempdir().unwrap();
        let cache = FileCache::new(dir.path().join("cache.json"), None);

        cache.set("item:abc", json!({"name": "Salewa"})).await;
        let hit = cache.get("item:abc").await.unwrap();
        assert_eq!(hit["name"], "Salewa");
        assert!(cache.get("item:missing").await.is_none());
    }

    #[tokio::test]
    async fn test_file_cache_survives_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.json");

        let first = FileCache::new(&path, None);
        first.set("trader:prapor", json!({"name": "Prapor"})).await;

        let second = FileCache::new(&path, None);
        let hit = second.get("trader:prapor").await.unwrap();
        assert_eq!(hit["name"], "Prapor");
    }

    #[tokio::test]
    async fn test_file_cache_ttl_expiry() {
        let dir = tempfile::tempdir().unwrap();
        let cache = FileCache::new(
            dir.path().join("cache.json"),
            Some(Duration::from_millis(10)),
        );

        cache.set("quest:q1", json!({"name": "Debut"})).await;
        assert!(cache.get("quest:q1").await.is_some());

        tokio::time::sleep(Duration::from_millis(30)).await;
        assert!(cache.get("quest:q1").await.is_none());
    }

    #[tokio::test]
    async fn test_read_through_populates_cache_once() {
        let cache = MemoryCache::new();

        let loaded: Option<String> = read_through(Some(&cache), "item:x", || async {
            Ok(Some("resolved".to_string()))
        })
        .await;
        assert_eq!(loaded.as_deref(), Some("resolved"));
        assert_eq!(cache.len(), 1);

        // Second read must come from the cache; a loader that fails proves it
        // was never called.
        let cached: Option<String> = read_through(Some(&cache), "item:x", || async {
            Err(ProviderError::Transport("must not be called".to_string()))
        })
        .await;
        assert_eq!(cached.as_deref(), Some("resolved"));
    }

    #[tokio::test]
    async fn test_read_through_swallows_loader_failure() {
        let cache = MemoryCache::new();
        let loaded: Option<String> = read_through(Some(&cache), "item:y", || async {
            Err(ProviderError::Transport("offline".to_string()))
        })
        .await;
        assert!(loaded.is_none());
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_read_through_without_cache_still_loads() {
        let loaded: Option<String> =
            read_through(None, "item:z", || async { Ok(Some("direct".to_string())) }).await;
        assert_eq!(loaded.as_deref(), Some("direct"));
    }
}
