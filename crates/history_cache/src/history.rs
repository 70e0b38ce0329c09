//! Bounded generation history

use std::collections::VecDeque;
use std::sync::Arc;

use studio_core::HistoryItem;
use tracing::{debug, error, info, warn};

use crate::error::Result;
use crate::storage::PersistenceGateway;
use crate::HISTORY_KEY;

/// Newest-first record of completed generations, never longer than its
/// capacity. Every mutation is mirrored to the gateway on a best-effort basis.
pub struct HistoryCache {
    items: VecDeque<HistoryItem>,
    capacity: usize,
    gateway: Arc<dyn PersistenceGateway>,
}

impl HistoryCache {
    /// Create an empty cache. A zero capacity is raised to one.
    pub fn new(gateway: Arc<dyn PersistenceGateway>, capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            items: VecDeque::with_capacity(capacity),
            capacity,
            gateway,
        }
    }

    /// Create a cache populated from the persisted record.
    ///
    /// An absent, unreadable or malformed record yields an empty history.
    pub async fn load(gateway: Arc<dyn PersistenceGateway>, capacity: usize) -> Self {
        let mut cache = Self::new(gateway, capacity);

        let blob = match cache.gateway.load(HISTORY_KEY).await {
            Ok(Some(blob)) => blob,
            Ok(None) => {
                debug!("No stored history found, starting empty");
                return cache;
            }
            Err(err) => {
                warn!("Failed to load history: {}", err);
                return cache;
            }
        };

        match serde_json::from_str::<Vec<HistoryItem>>(&blob) {
            Ok(items) => {
                cache.items = items.into_iter().take(cache.capacity).collect();
                info!("Loaded {} history items", cache.items.len());
            }
            Err(err) => {
                warn!("Ignoring malformed history record: {}", err);
            }
        }

        cache
    }

    /// Prepend an item, dropping the oldest entries beyond capacity.
    pub async fn insert(&mut self, item: HistoryItem) {
        debug!("Adding history item {}", item.id);
        self.items.push_front(item);
        self.items.truncate(self.capacity);
        self.persist().await;
    }

    /// Look up an item by id without touching the history.
    pub fn restore(&self, id: &str) -> Option<&HistoryItem> {
        self.items.iter().find(|item| item.id == id)
    }

    /// Empty the history and remove its persisted record.
    ///
    /// The record is removed even when nothing was loaded, so a record that
    /// failed to parse does not survive a clear.
    pub async fn clear(&mut self) {
        self.items.clear();
        if let Err(err) = self.gateway.remove(HISTORY_KEY).await {
            error!("Failed to remove stored history: {}", err);
        }
    }

    /// Items, newest first.
    pub fn items(&self) -> impl Iterator<Item = &HistoryItem> {
        self.items.iter()
    }

    pub fn to_vec(&self) -> Vec<HistoryItem> {
        self.items.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    async fn persist(&self) {
        if let Err(err) = self.write_record().await {
            error!("Failed to save history: {}", err);
        }
    }

    async fn write_record(&self) -> Result<()> {
        let blob = serde_json::to_string(&self.items)?;
        self.gateway.save(HISTORY_KEY, &blob).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{PersistenceError, Result};
    use crate::storage::MemoryPersistence;
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use studio_core::Style;

    fn item(n: u32) -> HistoryItem {
        HistoryItem {
            id: format!("gen_{n}"),
            artifact_ref: format!("https://picsum.photos/512/512?random={n}"),
            prompt: format!("prompt {n}"),
            style: Style::Vintage,
            created_at: Utc.timestamp_opt(1_700_000_000 + n as i64, 0).unwrap(),
        }
    }

    fn ids(cache: &HistoryCache) -> Vec<String> {
        cache.items().map(|item| item.id.clone()).collect()
    }

    struct BrokenGateway;

    #[async_trait]
    impl PersistenceGateway for BrokenGateway {
        async fn load(&self, _key: &str) -> Result<Option<String>> {
            Err(PersistenceError::Backend("disk on fire".to_string()))
        }

        async fn save(&self, _key: &str, _blob: &str) -> Result<()> {
            Err(PersistenceError::Backend("disk on fire".to_string()))
        }

        async fn remove(&self, _key: &str) -> Result<()> {
            Err(PersistenceError::Backend("disk on fire".to_string()))
        }
    }

    #[tokio::test]
    async fn test_insert_keeps_newest_within_capacity() {
        let gateway = Arc::new(MemoryPersistence::new());
        let mut cache = HistoryCache::new(gateway.clone(), 5);

        for n in 1..=6 {
            cache.insert(item(n)).await;
        }

        assert_eq!(cache.len(), 5);
        assert_eq!(ids(&cache), vec!["gen_6", "gen_5", "gen_4", "gen_3", "gen_2"]);

        let stored: Vec<HistoryItem> =
            serde_json::from_str(&gateway.get(HISTORY_KEY).await.unwrap()).unwrap();
        assert_eq!(stored, cache.to_vec());
    }

    #[tokio::test]
    async fn test_load_restores_persisted_history() {
        let gateway = Arc::new(MemoryPersistence::new());
        {
            let mut cache = HistoryCache::new(gateway.clone(), 10);
            cache.insert(item(1)).await;
            cache.insert(item(2)).await;
        }

        let cache = HistoryCache::load(gateway, 10).await;
        assert_eq!(ids(&cache), vec!["gen_2", "gen_1"]);
    }

    #[tokio::test]
    async fn test_load_truncates_to_capacity() {
        let gateway = Arc::new(MemoryPersistence::new());
        let stored: Vec<HistoryItem> = (1..=4).rev().map(item).collect();
        gateway
            .insert_raw(HISTORY_KEY, &serde_json::to_string(&stored).unwrap())
            .await;

        let cache = HistoryCache::load(gateway, 2).await;
        assert_eq!(ids(&cache), vec!["gen_4", "gen_3"]);
    }

    #[tokio::test]
    async fn test_malformed_record_starts_empty() {
        let gateway = Arc::new(MemoryPersistence::new());
        gateway.insert_raw(HISTORY_KEY, "{not json").await;

        let cache = HistoryCache::load(gateway, 5).await;
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_load_accepts_any_style_casing() {
        let gateway = Arc::new(MemoryPersistence::new());
        gateway
            .insert_raw(
                HISTORY_KEY,
                r#"[{"id":"gen_1","imageUrl":"https://picsum.photos/512/512?random=1",
                     "prompt":"coat","style":"vintage","createdAt":"2024-01-02T03:04:05Z"}]"#,
            )
            .await;

        let cache = HistoryCache::load(gateway, 5).await;
        assert_eq!(ids(&cache), vec!["gen_1"]);
        assert_eq!(cache.restore("gen_1").map(|i| i.style), Some(Style::Vintage));
    }

    #[tokio::test]
    async fn test_clear_removes_unreadable_record() {
        let gateway = Arc::new(MemoryPersistence::new());
        gateway.insert_raw(HISTORY_KEY, "{not json").await;

        let mut cache = HistoryCache::load(gateway.clone(), 5).await;
        assert!(cache.is_empty());

        cache.clear().await;
        assert!(!gateway.contains(HISTORY_KEY).await);
    }

    #[tokio::test]
    async fn test_restore_is_a_pure_lookup() {
        let gateway = Arc::new(MemoryPersistence::new());
        let mut cache = HistoryCache::new(gateway, 5);
        cache.insert(item(1)).await;
        cache.insert(item(2)).await;

        assert_eq!(cache.restore("gen_1").map(|i| i.prompt.as_str()), Some("prompt 1"));
        assert!(cache.restore("gen_9").is_none());
        assert_eq!(ids(&cache), vec!["gen_2", "gen_1"]);
    }

    #[tokio::test]
    async fn test_clear_twice_is_noop() {
        let gateway = Arc::new(MemoryPersistence::new());
        let mut cache = HistoryCache::new(gateway.clone(), 5);
        cache.insert(item(1)).await;

        cache.clear().await;
        assert!(cache.is_empty());
        assert!(!gateway.contains(HISTORY_KEY).await);

        cache.clear().await;
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_persistence_failures_are_swallowed() {
        let mut cache = HistoryCache::load(Arc::new(BrokenGateway), 3).await;
        assert!(cache.is_empty());

        cache.insert(item(1)).await;
        assert_eq!(ids(&cache), vec!["gen_1"]);

        cache.clear().await;
        assert!(cache.is_empty());
    }

    #[test]
    fn test_zero_capacity_is_raised() {
        let cache = HistoryCache::new(Arc::new(MemoryPersistence::new()), 0);
        assert_eq!(cache.capacity(), 1);
    }
}
