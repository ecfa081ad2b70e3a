//! TTL-bounded write-through cache of composed recommendation lists

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::clock::Clock;
use crate::domain::item::{CandidateItem, ItemId, UserId};
use crate::domain::recommendation::{Mood, RecommendationClass, RecommendationResult};
use crate::errors::ApplicationError;

/// One cached result, keyed by `(user_id, item_id, mood)`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub user_id: UserId,
    pub item_id: ItemId,
    pub mood: Mood,
    /// Position in the composed list, zero-based
    pub rank: usize,
    pub score: f64,
    pub class: RecommendationClass,
    pub reason: String,
    pub similarity_score: f64,
    pub predicted_rating: f64,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl CacheEntry {
    pub fn from_result(
        user_id: &UserId,
        mood: Mood,
        rank: usize,
        result: &RecommendationResult,
        created_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Self {
        Self {
            user_id: user_id.clone(),
            item_id: result.item.id.clone(),
            mood,
            rank,
            score: result.score,
            class: result.class,
            reason: result.reason.clone(),
            similarity_score: result.similarity_score,
            predicted_rating: result.predicted_rating,
            created_at,
            expires_at,
        }
    }

    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.expires_at > now
    }

    /// Rebuilds the result around the current catalog copy of the item.
    pub fn into_result(self, item: CandidateItem) -> RecommendationResult {
        RecommendationResult {
            item,
            score: self.score,
            class: self.class,
            reason: self.reason,
            similarity_score: self.similarity_score,
            predicted_rating: self.predicted_rating,
        }
    }
}

/// Key-value store behind [`RecommendationCache`].
///
/// `upsert` must be last-write-wins per `(user_id, item_id, mood)`.
#[async_trait]
pub trait RecommendationCacheStore: Send + Sync {
    /// Entries for the user and mood whose `expires_at` is after `now`.
    async fn live_entries(
        &self,
        user_id: &UserId,
        mood: Mood,
        now: DateTime<Utc>,
    ) -> Result<Vec<CacheEntry>, ApplicationError>;

    async fn upsert(&self, entries: Vec<CacheEntry>) -> Result<(), ApplicationError>;

    /// Removes every entry owned by the user. Returns the number removed.
    async fn delete_for_user(&self, user_id: &UserId) -> Result<u64, ApplicationError>;
}

#[async_trait]
impl<S: RecommendationCacheStore + ?Sized> RecommendationCacheStore for Arc<S> {
    async fn live_entries(
        &self,
        user_id: &UserId,
        mood: Mood,
        now: DateTime<Utc>,
    ) -> Result<Vec<CacheEntry>, ApplicationError> {
        (**self).live_entries(user_id, mood, now).await
    }

    async fn upsert(&self, entries: Vec<CacheEntry>) -> Result<(), ApplicationError> {
        (**self).upsert(entries).await
    }

    async fn delete_for_user(&self, user_id: &UserId) -> Result<u64, ApplicationError> {
        (**self).delete_for_user(user_id).await
    }
}

pub struct RecommendationCache<S> {
    store: S,
    clock: Arc<dyn Clock>,
    ttl: Duration,
}

impl<S: RecommendationCacheStore> RecommendationCache<S> {
    pub fn new(store: S, clock: Arc<dyn Clock>, ttl: Duration) -> Self {
        Self { store, clock, ttl }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Live entries of the most recent write for `(user_id, mood)`, in rank order.
    ///
    /// An empty list is a miss. Entries from an older write that are still
    /// live are ignored so a hit never mixes two compositions.
    pub async fn get(
        &self,
        user_id: &UserId,
        mood: Mood,
    ) -> Result<Vec<CacheEntry>, ApplicationError> {
        let now = self.clock.now();
        let mut entries: Vec<CacheEntry> = self
            .store
            .live_entries(user_id, mood, now)
            .await?
            .into_iter()
            .filter(|entry| entry.is_live(now))
            .collect();

        if let Some(latest) = entries.iter().map(|entry| entry.created_at).max() {
            entries.retain(|entry| entry.created_at == latest);
        }
        entries.sort_by(|a, b| a.rank.cmp(&b.rank).then_with(|| a.item_id.cmp(&b.item_id)));
        Ok(entries)
    }

    /// Upserts one entry per result with `expires_at = now + ttl`.
    pub async fn put(
        &self,
        user_id: &UserId,
        mood: Mood,
        results: &[RecommendationResult],
    ) -> Result<(), ApplicationError> {
        if results.is_empty() {
            return Ok(());
        }

        let now = self.clock.now();
        let expires_at = now + self.ttl;
        let entries = results
            .iter()
            .enumerate()
            .map(|(rank, result)| {
                CacheEntry::from_result(user_id, mood, rank, result, now, expires_at)
            })
            .collect();
        self.store.upsert(entries).await
    }

    pub async fn invalidate(&self, user_id: &UserId) -> Result<u64, ApplicationError> {
        self.store.delete_for_user(user_id).await
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use chrono::TimeZone;
    use tokio::sync::Mutex;

    use super::*;
    use crate::clock::ManualClock;
    use crate::domain::taste::TasteVector;

    /// Keeps expired rows around so expiry filtering is exercised in the cache.
    #[derive(Default)]
    struct LeakyStore {
        rows: Mutex<HashMap<(UserId, ItemId, Mood), CacheEntry>>,
    }

    #[async_trait]
    impl RecommendationCacheStore for LeakyStore {
        async fn live_entries(
            &self,
            user_id: &UserId,
            mood: Mood,
            _now: DateTime<Utc>,
        ) -> Result<Vec<CacheEntry>, ApplicationError> {
            let rows = self.rows.lock().await;
            Ok(rows
                .values()
                .filter(|entry| &entry.user_id == user_id && entry.mood == mood)
                .cloned()
                .collect())
        }

        async fn upsert(&self, entries: Vec<CacheEntry>) -> Result<(), ApplicationError> {
            let mut rows = self.rows.lock().await;
            for entry in entries {
                rows.insert((entry.user_id.clone(), entry.item_id.clone(), entry.mood), entry);
            }
            Ok(())
        }

        async fn delete_for_user(&self, user_id: &UserId) -> Result<u64, ApplicationError> {
            let mut rows = self.rows.lock().await;
            let before = rows.len();
            rows.retain(|(owner, _, _), _| owner != user_id);
            Ok((before - rows.len()) as u64)
        }
    }

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 18, 0, 0).single().expect("valid timestamp")
    }

    fn result(id: &str, score: f64) -> RecommendationResult {
        RecommendationResult {
            item: CandidateItem::new(id, id, "Brewery", TasteVector::NEUTRAL),
            score,
            class: RecommendationClass::Similar,
            reason: "Close to your usual style".to_owned(),
            similarity_score: score,
            predicted_rating: 1.0 + 4.0 * score,
        }
    }

    fn cache(clock: Arc<ManualClock>) -> RecommendationCache<Arc<LeakyStore>> {
        RecommendationCache::new(Arc::new(LeakyStore::default()), clock, Duration::hours(12))
    }

    #[tokio::test]
    async fn hit_returns_entries_in_rank_order() {
        let clock = Arc::new(ManualClock::new(start()));
        let cache = cache(clock.clone());
        let user = UserId::from("u-1");

        cache
            .put(&user, Mood::Usual, &[result("b", 0.9), result("a", 0.8), result("c", 0.7)])
            .await
            .expect("put");

        let entries = cache.get(&user, Mood::Usual).await.expect("get");
        let ids: Vec<&str> = entries.iter().map(|entry| entry.item_id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a", "c"]);
        assert_eq!(entries[0].expires_at, start() + Duration::hours(12));
        assert!(cache.get(&user, Mood::Discovery).await.expect("get").is_empty());
    }

    #[tokio::test]
    async fn expired_entries_are_a_miss_even_when_still_stored() {
        let clock = Arc::new(ManualClock::new(start()));
        let cache = cache(clock.clone());
        let user = UserId::from("u-1");
        cache.put(&user, Mood::Usual, &[result("a", 0.9)]).await.expect("put");

        clock.advance(Duration::hours(12));

        assert!(cache.get(&user, Mood::Usual).await.expect("get").is_empty());
        assert_eq!(cache.store().rows.lock().await.len(), 1);
    }

    #[tokio::test]
    async fn same_key_put_twice_leaves_one_latest_entry() {
        let clock = Arc::new(ManualClock::new(start()));
        let cache = cache(clock.clone());
        let user = UserId::from("u-1");

        cache.put(&user, Mood::Special, &[result("a", 0.4)]).await.expect("first put");
        clock.advance(Duration::minutes(5));
        cache.put(&user, Mood::Special, &[result("a", 0.6)]).await.expect("second put");

        assert_eq!(cache.store().rows.lock().await.len(), 1);
        let entries = cache.get(&user, Mood::Special).await.expect("get");
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].score, 0.6);
        assert_eq!(entries[0].expires_at, start() + Duration::minutes(5) + Duration::hours(12));
    }

    #[tokio::test]
    async fn hit_ignores_leftovers_from_an_older_composition() {
        let clock = Arc::new(ManualClock::new(start()));
        let cache = cache(clock.clone());
        let user = UserId::from("u-1");

        cache.put(&user, Mood::Usual, &[result("a", 0.9), result("b", 0.8)]).await.expect("put");
        clock.advance(Duration::minutes(1));
        cache.put(&user, Mood::Usual, &[result("c", 0.95)]).await.expect("put");

        let entries = cache.get(&user, Mood::Usual).await.expect("get");
        let ids: Vec<&str> = entries.iter().map(|entry| entry.item_id.as_str()).collect();
        assert_eq!(ids, vec!["c"]);
    }

    #[tokio::test]
    async fn empty_put_is_a_no_op_and_invalidate_clears_user() {
        let clock = Arc::new(ManualClock::new(start()));
        let cache = cache(clock.clone());
        let user = UserId::from("u-1");
        let other = UserId::from("u-2");

        cache.put(&user, Mood::Usual, &[]).await.expect("empty put");
        assert!(cache.store().rows.lock().await.is_empty());

        cache.put(&user, Mood::Usual, &[result("a", 0.9)]).await.expect("put");
        cache.put(&user, Mood::Discovery, &[result("b", 0.3)]).await.expect("put");
        cache.put(&other, Mood::Usual, &[result("a", 0.7)]).await.expect("put");

        assert_eq!(cache.invalidate(&user).await.expect("invalidate"), 2);
        assert!(cache.get(&user, Mood::Usual).await.expect("get").is_empty());
        assert_eq!(cache.get(&other, Mood::Usual).await.expect("get").len(), 1);
    }
}
