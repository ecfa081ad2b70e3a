use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Duration;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info, warn};

use super::cache::{CacheEntry, RecommendationCache, RecommendationCacheStore};
use super::catalog::{CatalogCache, CatalogSource};
use super::composer::{ComposeOptions, RecommendationComposer};
use super::favorites::{FavoritesSnapshot, PendingOperation};
use super::menu::{MenuOptions, MenuRestrictedComposer};
use super::{
    DEFAULT_CATALOG_TTL_MINUTES, DEFAULT_MIN_FAVORITES, DEFAULT_RECOMMENDATION_COUNT,
    DEFAULT_RECOMMENDATION_TTL_HOURS,
};
use crate::clock::Clock;
use crate::config::AppConfig;
use crate::domain::item::{CandidateItem, ItemId, SavedItem, UserId};
use crate::domain::preference::Preference;
use crate::domain::recommendation::{Mood, RecommendationOutcome, RecommendationResult};
use crate::errors::{ApplicationError, DomainError};
use crate::taste::{BuilderOptions, PreferenceProfiler};

/// A user's favourites, the source of truth for their preference.
#[async_trait]
pub trait SavedItemStore: Send + Sync {
    /// Saved items for the user, newest first.
    async fn list_for_user(&self, user_id: &UserId) -> Result<Vec<SavedItem>, ApplicationError>;
    async fn insert(&self, saved: SavedItem) -> Result<(), ApplicationError>;
    /// Returns `false` when nothing was saved under that id.
    async fn delete(&self, user_id: &UserId, item_id: &ItemId) -> Result<bool, ApplicationError>;
}

#[async_trait]
impl<S: SavedItemStore + ?Sized> SavedItemStore for Arc<S> {
    async fn list_for_user(&self, user_id: &UserId) -> Result<Vec<SavedItem>, ApplicationError> {
        (**self).list_for_user(user_id).await
    }

    async fn insert(&self, saved: SavedItem) -> Result<(), ApplicationError> {
        (**self).insert(saved).await
    }

    async fn delete(&self, user_id: &UserId, item_id: &ItemId) -> Result<bool, ApplicationError> {
        (**self).delete(user_id, item_id).await
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ServiceOptions {
    pub builder: BuilderOptions,
    pub min_favorites: usize,
    pub default_count: usize,
    pub recommendation_ttl: Duration,
    pub catalog_ttl: Duration,
}

impl Default for ServiceOptions {
    fn default() -> Self {
        Self {
            builder: BuilderOptions::default(),
            min_favorites: DEFAULT_MIN_FAVORITES,
            default_count: DEFAULT_RECOMMENDATION_COUNT,
            recommendation_ttl: Duration::hours(DEFAULT_RECOMMENDATION_TTL_HOURS),
            catalog_ttl: Duration::minutes(DEFAULT_CATALOG_TTL_MINUTES),
        }
    }
}

impl ServiceOptions {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            builder: BuilderOptions {
                max_items: config.recommendation.max_items,
                half_life_days: config.recommendation.half_life_days,
            },
            min_favorites: config.recommendation.min_favorites,
            default_count: config.recommendation.default_count,
            recommendation_ttl: Duration::hours(config.cache.recommendation_ttl_hours),
            catalog_ttl: Duration::minutes(config.cache.catalog_ttl_minutes),
        }
    }
}

/// Caller-facing entry point: favourites in, recommendations out.
pub struct RecommendationService {
    saved_items: Arc<dyn SavedItemStore>,
    catalog: CatalogCache<Arc<dyn CatalogSource>>,
    cache: RecommendationCache<Arc<dyn RecommendationCacheStore>>,
    profiler: PreferenceProfiler,
    composer: RecommendationComposer,
    menu_composer: MenuRestrictedComposer,
    clock: Arc<dyn Clock>,
    options: ServiceOptions,
}

impl RecommendationService {
    pub fn new(
        saved_items: Arc<dyn SavedItemStore>,
        catalog_source: Arc<dyn CatalogSource>,
        cache_store: Arc<dyn RecommendationCacheStore>,
        clock: Arc<dyn Clock>,
        options: ServiceOptions,
    ) -> Self {
        Self {
            saved_items,
            catalog: CatalogCache::new(catalog_source, Arc::clone(&clock), options.catalog_ttl),
            cache: RecommendationCache::new(
                cache_store,
                Arc::clone(&clock),
                options.recommendation_ttl,
            ),
            profiler: PreferenceProfiler::with_options(options.builder),
            composer: RecommendationComposer::new(),
            menu_composer: MenuRestrictedComposer::new(options.min_favorites),
            clock,
            options,
        }
    }

    pub fn options(&self) -> &ServiceOptions {
        &self.options
    }

    pub async fn profile(&self, user_id: &UserId) -> Result<Preference, ApplicationError> {
        let saved = self.saved_items.list_for_user(user_id).await?;
        let preference = self.profiler.profile(&saved, self.clock.now());
        debug!(
            event_name = "preference.profiled",
            user_id = %user_id,
            sample_size = preference.sample_size,
            taste_type = preference.taste_type.as_str(),
            "preference profiled"
        );
        Ok(preference)
    }

    pub async fn favorites(&self, user_id: &UserId) -> Result<FavoritesSnapshot, ApplicationError> {
        let saved = self.saved_items.list_for_user(user_id).await?;
        Ok(FavoritesSnapshot::new(user_id.clone(), saved))
    }

    /// Cached or freshly composed recommendations over the whole catalog,
    /// excluding items the user already saved.
    pub async fn recommend(
        &self,
        user_id: &UserId,
        mood: Mood,
        count: Option<usize>,
    ) -> Result<RecommendationOutcome, ApplicationError> {
        let count = count.unwrap_or(self.options.default_count);
        let saved = self.saved_items.list_for_user(user_id).await?;
        if saved.len() < self.options.min_favorites {
            info!(
                event_name = "recommendation.requires_more_favorites",
                user_id = %user_id,
                favorites_count = saved.len(),
                required = self.options.min_favorites,
                "not enough favourites for personal recommendations"
            );
            return Ok(self.requires_more_favorites(saved.len()));
        }

        let catalog = self.catalog.get().await?;
        let saved_ids: HashSet<&ItemId> = saved.iter().map(|saved| &saved.item.id).collect();
        let pool: Vec<CandidateItem> =
            catalog.iter().filter(|item| !saved_ids.contains(&item.id)).cloned().collect();

        if let Some(results) = self.cached_results(user_id, mood, &pool, count).await {
            debug!(
                event_name = "recommendation.cache_hit",
                user_id = %user_id,
                mood = mood.as_str(),
                result_count = results.len(),
                "serving cached recommendations"
            );
            return Ok(RecommendationOutcome::Recommendations { results });
        }
        debug!(
            event_name = "recommendation.cache_miss",
            user_id = %user_id,
            mood = mood.as_str(),
            "composing recommendations"
        );

        let preference = self.profiler.profile(&saved, self.clock.now());
        let results = self.composer.compose(&preference, &pool, ComposeOptions { count, mood });

        if let Err(error) = self.cache.put(user_id, mood, &results).await {
            warn!(
                event_name = "recommendation.cache_write_failed",
                user_id = %user_id,
                mood = mood.as_str(),
                error = %error,
                "recommendation cache write failed"
            );
        }

        info!(
            event_name = "recommendation.composed",
            user_id = %user_id,
            mood = mood.as_str(),
            sample_size = preference.sample_size,
            pool_size = pool.len(),
            result_count = results.len(),
            "recommendations composed"
        );
        Ok(RecommendationOutcome::Recommendations { results })
    }

    /// Recommendations limited to the listed menu items. Unknown ids are skipped.
    pub async fn recommend_for_menu(
        &self,
        user_id: Option<&UserId>,
        menu_item_ids: &[ItemId],
        options: MenuOptions,
    ) -> Result<RecommendationOutcome, ApplicationError> {
        let mut rng = StdRng::from_entropy();
        self.recommend_for_menu_with_rng(user_id, menu_item_ids, options, &mut rng).await
    }

    pub async fn recommend_for_menu_with_rng<R: Rng + Send + ?Sized>(
        &self,
        user_id: Option<&UserId>,
        menu_item_ids: &[ItemId],
        options: MenuOptions,
        rng: &mut R,
    ) -> Result<RecommendationOutcome, ApplicationError> {
        let catalog = self.catalog.get().await?;
        let by_id: HashMap<&ItemId, &CandidateItem> =
            catalog.iter().map(|item| (&item.id, item)).collect();

        let mut seen = HashSet::new();
        let menu: Vec<CandidateItem> = menu_item_ids
            .iter()
            .filter(|id| seen.insert(*id))
            .filter_map(|id| {
                let item = by_id.get(id).map(|item| (*item).clone());
                if item.is_none() {
                    debug!(event_name = "menu.unknown_item", item_id = %id, "menu item not in catalog");
                }
                item
            })
            .collect();

        let preference = match user_id {
            Some(user_id) => Some(self.profile(user_id).await?),
            None => None,
        };

        let outcome = self.menu_composer.compose_for_menu(preference.as_ref(), &menu, &options, rng)?;
        info!(
            event_name = "menu.recommended",
            user_id = ?user_id.map(|id| id.0.as_str()),
            recommendation_type = options.recommendation_type.as_str(),
            menu_size = menu.len(),
            result_count = outcome.results().len(),
            requires_more_favorites = outcome.requires_more_favorites(),
            "menu recommendations composed"
        );
        Ok(outcome)
    }

    /// Saves a catalog item to the snapshot and the store, reverting the
    /// snapshot when the store write fails.
    pub async fn save_favorite(
        &self,
        snapshot: &mut FavoritesSnapshot,
        item_id: &ItemId,
    ) -> Result<(), ApplicationError> {
        let catalog = self.catalog.get().await?;
        let item = catalog.iter().find(|item| &item.id == item_id).cloned().ok_or_else(|| {
            DomainError::InvariantViolation(format!("item `{item_id}` is not in the catalog"))
        })?;
        let saved = SavedItem::new(snapshot.user_id().clone(), item, self.clock.now());

        let change = snapshot.apply_locally(PendingOperation::Save(saved.clone()))?;
        match self.saved_items.insert(saved).await {
            Ok(()) => snapshot.confirm(change)?,
            Err(error) => {
                snapshot.revert(change)?;
                return Err(error);
            }
        }

        self.invalidate(snapshot.user_id()).await;
        Ok(())
    }

    pub async fn remove_favorite(
        &self,
        snapshot: &mut FavoritesSnapshot,
        item_id: &ItemId,
    ) -> Result<(), ApplicationError> {
        let change = snapshot.apply_locally(PendingOperation::Remove(item_id.clone()))?;
        match self.saved_items.delete(snapshot.user_id(), item_id).await {
            Ok(_) => snapshot.confirm(change)?,
            Err(error) => {
                snapshot.revert(change)?;
                return Err(error);
            }
        }

        self.invalidate(snapshot.user_id()).await;
        Ok(())
    }

    pub async fn invalidate_catalog(&self) {
        self.catalog.invalidate().await;
    }

    /// Drops the user's cached lists after a favourites change.
    ///
    /// A failure is logged and swallowed. Until the old entries expire (at most
    /// one recommendation TTL, 12 hours by default) `recommend` may still serve
    /// a list composed from the previous favourites.
    async fn invalidate(&self, user_id: &UserId) {
        match self.cache.invalidate(user_id).await {
            Ok(removed) => info!(
                event_name = "recommendation.cache_invalidated",
                user_id = %user_id,
                removed,
                "recommendation cache invalidated"
            ),
            Err(error) => warn!(
                event_name = "recommendation.cache_invalidate_failed",
                user_id = %user_id,
                error = %error,
                "recommendation cache invalidation failed"
            ),
        }
    }

    /// A hit must be exactly the batch a fresh composition of `count` would
    /// have written: class quotas depend on `count`, so a longer batch cut
    /// short would no longer follow the mood mix.
    async fn cached_results(
        &self,
        user_id: &UserId,
        mood: Mood,
        pool: &[CandidateItem],
        count: usize,
    ) -> Option<Vec<RecommendationResult>> {
        let entries = match self.cache.get(user_id, mood).await {
            Ok(entries) => entries,
            Err(error) => {
                warn!(
                    event_name = "recommendation.cache_read_failed",
                    user_id = %user_id,
                    mood = mood.as_str(),
                    error = %error,
                    "recommendation cache read failed"
                );
                return None;
            }
        };

        let expected = count.min(pool.len());
        if expected == 0 || entries.len() != expected || !ranks_are_contiguous(&entries) {
            return None;
        }

        let by_id: HashMap<&ItemId, &CandidateItem> =
            pool.iter().map(|item| (&item.id, item)).collect();
        let results: Vec<RecommendationResult> = entries
            .into_iter()
            .filter_map(|entry| {
                let item = by_id.get(&entry.item_id).map(|item| (*item).clone())?;
                Some(entry.into_result(item))
            })
            .collect();

        // A saved or delisted item drops out of the pool; recompose rather than serve a gap.
        if results.len() != expected {
            return None;
        }
        Some(results)
    }

    fn requires_more_favorites(&self, favorites_count: usize) -> RecommendationOutcome {
        RecommendationOutcome::RequiresMoreFavorites {
            message: format!(
                "Save at least {} favorite sake to get recommendations that match your taste",
                self.options.min_favorites
            ),
            favorites_count,
            required: self.options.min_favorites,
        }
    }
}

/// Two writes stamped with the same instant can interleave; their union
/// shows up as duplicate or missing ranks.
fn ranks_are_contiguous(entries: &[CacheEntry]) -> bool {
    entries.iter().enumerate().all(|(index, entry)| entry.rank == index)
}
