use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use kikizake_core::domain::item::{CandidateItem, ItemId, SavedItem, UserId};
use kikizake_core::domain::recommendation::Mood;
use kikizake_core::errors::ApplicationError;
use kikizake_core::recommend::{CacheEntry, CatalogSource, RecommendationCacheStore, SavedItemStore};

#[derive(Default)]
pub struct InMemoryCatalogRepository {
    items: RwLock<HashMap<String, CandidateItem>>,
}

impl InMemoryCatalogRepository {
    pub fn with_items(items: impl IntoIterator<Item = CandidateItem>) -> Self {
        Self {
            items: RwLock::new(items.into_iter().map(|item| (item.id.0.clone(), item)).collect()),
        }
    }

    pub async fn upsert(&self, item: CandidateItem) {
        let mut items = self.items.write().await;
        items.insert(item.id.0.clone(), item);
    }
}

#[async_trait::async_trait]
impl CatalogSource for InMemoryCatalogRepository {
    async fn load_catalog(&self) -> Result<Vec<CandidateItem>, ApplicationError> {
        let items = self.items.read().await;
        let mut catalog: Vec<CandidateItem> = items.values().cloned().collect();
        catalog.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(catalog)
    }
}

#[derive(Default)]
pub struct InMemorySavedItemStore {
    saved: RwLock<HashMap<String, HashMap<String, SavedItem>>>,
}

#[async_trait::async_trait]
impl SavedItemStore for InMemorySavedItemStore {
    async fn list_for_user(&self, user_id: &UserId) -> Result<Vec<SavedItem>, ApplicationError> {
        let saved = self.saved.read().await;
        let mut items: Vec<SavedItem> =
            saved.get(&user_id.0).map(|by_item| by_item.values().cloned().collect()).unwrap_or_default();
        // Same order as the SQL store: newest first, undated last.
        items.sort_by(|a, b| match (a.created_at, b.created_at) {
            (Some(left), Some(right)) => right.cmp(&left).then_with(|| a.item.id.cmp(&b.item.id)),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => a.item.id.cmp(&b.item.id),
        });
        Ok(items)
    }

    async fn insert(&self, item: SavedItem) -> Result<(), ApplicationError> {
        let mut saved = self.saved.write().await;
        saved.entry(item.user_id.0.clone()).or_default().insert(item.item.id.0.clone(), item);
        Ok(())
    }

    async fn delete(&self, user_id: &UserId, item_id: &ItemId) -> Result<bool, ApplicationError> {
        let mut saved = self.saved.write().await;
        Ok(saved.get_mut(&user_id.0).and_then(|by_item| by_item.remove(&item_id.0)).is_some())
    }
}

#[derive(Default)]
pub struct InMemoryRecommendationCacheStore {
    entries: RwLock<HashMap<(UserId, ItemId, Mood), CacheEntry>>,
}

impl InMemoryRecommendationCacheStore {
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait::async_trait]
impl RecommendationCacheStore for InMemoryRecommendationCacheStore {
    async fn live_entries(
        &self,
        user_id: &UserId,
        mood: Mood,
        now: DateTime<Utc>,
    ) -> Result<Vec<CacheEntry>, ApplicationError> {
        let entries = self.entries.read().await;
        let mut live: Vec<CacheEntry> = entries
            .values()
            .filter(|entry| &entry.user_id == user_id && entry.mood == mood && entry.is_live(now))
            .cloned()
            .collect();
        live.sort_by(|a, b| a.rank.cmp(&b.rank).then_with(|| a.item_id.cmp(&b.item_id)));
        Ok(live)
    }

    async fn upsert(&self, batch: Vec<CacheEntry>) -> Result<(), ApplicationError> {
        let mut entries = self.entries.write().await;
        for entry in batch {
            entries.insert((entry.user_id.clone(), entry.item_id.clone(), entry.mood), entry);
        }
        Ok(())
    }

    async fn delete_for_user(&self, user_id: &UserId) -> Result<u64, ApplicationError> {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|(owner, _, _), _| owner != user_id);
        Ok((before - entries.len()) as u64)
    }
}
