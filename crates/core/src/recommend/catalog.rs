//! Time-bounded snapshot of the candidate catalog

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tokio::sync::RwLock;
use tracing::debug;

use crate::clock::Clock;
use crate::domain::item::CandidateItem;
use crate::errors::ApplicationError;

/// Read-only supplier of every recommendable item with its popularity signal.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    async fn load_catalog(&self) -> Result<Vec<CandidateItem>, ApplicationError>;
}

#[async_trait]
impl<S: CatalogSource + ?Sized> CatalogSource for Arc<S> {
    async fn load_catalog(&self) -> Result<Vec<CandidateItem>, ApplicationError> {
        (**self).load_catalog().await
    }
}

struct Snapshot {
    items: Arc<Vec<CandidateItem>>,
    loaded_at: DateTime<Utc>,
}

/// Loads the catalog on first use and reuses it until the TTL runs out or
/// [`CatalogCache::invalidate`] is called.
pub struct CatalogCache<S> {
    source: S,
    clock: Arc<dyn Clock>,
    ttl: Duration,
    snapshot: RwLock<Option<Snapshot>>,
}

impl<S: CatalogSource> CatalogCache<S> {
    pub fn new(source: S, clock: Arc<dyn Clock>, ttl: Duration) -> Self {
        Self { source, clock, ttl, snapshot: RwLock::new(None) }
    }

    pub async fn get(&self) -> Result<Arc<Vec<CandidateItem>>, ApplicationError> {
        let now = self.clock.now();
        {
            let snapshot = self.snapshot.read().await;
            if let Some(snapshot) = snapshot.as_ref().filter(|s| self.is_fresh(s, now)) {
                return Ok(Arc::clone(&snapshot.items));
            }
        }

        let mut snapshot = self.snapshot.write().await;
        // Another request may have reloaded while we waited for the lock.
        if let Some(current) = snapshot.as_ref().filter(|s| self.is_fresh(s, now)) {
            return Ok(Arc::clone(&current.items));
        }

        let items = Arc::new(self.source.load_catalog().await.map_err(|error| match error {
            ApplicationError::Catalog(message) => ApplicationError::Catalog(message),
            other => ApplicationError::Catalog(other.to_string()),
        })?);
        debug!(event_name = "catalog.loaded", item_count = items.len(), "catalog snapshot loaded");
        *snapshot = Some(Snapshot { items: Arc::clone(&items), loaded_at: now });
        Ok(items)
    }

    pub async fn invalidate(&self) {
        *self.snapshot.write().await = None;
    }

    fn is_fresh(&self, snapshot: &Snapshot, now: DateTime<Utc>) -> bool {
        now - snapshot.loaded_at < self.ttl
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use chrono::TimeZone;

    use super::*;
    use crate::clock::ManualClock;
    use crate::domain::taste::TasteVector;

    #[derive(Default)]
    struct CountingSource {
        loads: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl CatalogSource for CountingSource {
        async fn load_catalog(&self) -> Result<Vec<CandidateItem>, ApplicationError> {
            if self.fail {
                return Err(ApplicationError::Persistence("catalog table missing".to_owned()));
            }
            let load = self.loads.fetch_add(1, Ordering::SeqCst);
            Ok(vec![CandidateItem::new(format!("item-{load}"), "Sake", "Brewery", TasteVector::NEUTRAL)])
        }
    }

    fn clock() -> Arc<ManualClock> {
        Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2026, 2, 1, 12, 0, 0).single().expect("valid timestamp"),
        ))
    }

    #[tokio::test]
    async fn snapshot_is_reused_until_ttl_expires() {
        let clock = clock();
        let source = Arc::new(CountingSource::default());
        let cache = CatalogCache::new(Arc::clone(&source), clock.clone(), Duration::minutes(30));

        let first = cache.get().await.expect("first load");
        clock.advance(Duration::minutes(29));
        let second = cache.get().await.expect("cached");
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(source.loads.load(Ordering::SeqCst), 1);

        clock.advance(Duration::minutes(1));
        let third = cache.get().await.expect("reload");
        assert_eq!(third[0].id.as_str(), "item-1");
        assert_eq!(source.loads.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn invalidate_forces_a_reload() {
        let source = Arc::new(CountingSource::default());
        let cache = CatalogCache::new(Arc::clone(&source), clock(), Duration::minutes(30));

        cache.get().await.expect("load");
        cache.invalidate().await;
        cache.get().await.expect("reload");

        assert_eq!(source.loads.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn load_failures_surface_as_catalog_errors() {
        let cache = CatalogCache::new(
            CountingSource { fail: true, ..CountingSource::default() },
            clock(),
            Duration::minutes(30),
        );

        let error = cache.get().await.expect_err("load should fail");
        assert!(matches!(error, ApplicationError::Catalog(ref message) if message.contains("catalog table missing")));
    }
}
