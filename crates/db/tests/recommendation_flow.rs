use std::sync::Arc;

use chrono::{Duration, TimeZone, Utc};
use kikizake_core::clock::ManualClock;
use kikizake_core::domain::item::{ItemId, UserId};
use kikizake_core::domain::recommendation::{Mood, RecommendationOutcome};
use kikizake_core::errors::{ApplicationError, DomainError};
use kikizake_core::recommend::{RecommendationService, ServiceOptions};
use kikizake_db::repositories::{
    SqlCatalogRepository, SqlRecommendationCacheRepository, SqlSavedItemRepository,
};
use kikizake_db::{connect_with_settings, migrations, DbPool, DemoSeedDataset};

type FlowTestResult<T = ()> = Result<T, String>;

macro_rules! require {
    ($cond:expr) => {
        if !$cond {
            return Err(format!("assertion failed: `{}`", stringify!($cond)));
        }
    };
    ($cond:expr, $($arg:tt)*) => {
        if !$cond {
            return Err(format!($($arg)*));
        }
    };
}

macro_rules! require_eq {
    ($left:expr, $right:expr) => {
        let (left, right) = ($left, $right);
        if left != right {
            return Err(format!(
                "assertion failed: `left == right` (`{:?}` != `{:?}`)",
                left, right
            ));
        }
    };
}

async fn seeded_pool() -> FlowTestResult<DbPool> {
    let pool = connect_with_settings("sqlite::memory:", 1, 30)
        .await
        .map_err(|error| format!("connect: {error}"))?;
    migrations::run_pending(&pool).await.map_err(|error| format!("migrate: {error}"))?;
    DemoSeedDataset::load(&pool).await.map_err(|error| format!("seed: {error}"))?;
    Ok(pool)
}

fn service(pool: &DbPool, clock: Arc<ManualClock>) -> RecommendationService {
    RecommendationService::new(
        Arc::new(SqlSavedItemRepository::new(pool.clone())),
        Arc::new(SqlCatalogRepository::new(pool.clone())),
        Arc::new(SqlRecommendationCacheRepository::new(pool.clone())),
        clock,
        ServiceOptions::default(),
    )
}

async fn cached_rows(pool: &DbPool, user: &str) -> FlowTestResult<i64> {
    sqlx::query_scalar("SELECT COUNT(1) FROM recommendation_cache WHERE user_id = ?")
        .bind(user)
        .fetch_one(pool)
        .await
        .map_err(|error| format!("count cache rows: {error}"))
}

fn result_ids(outcome: &RecommendationOutcome) -> Vec<String> {
    outcome.results().iter().map(|result| result.item.id.0.clone()).collect()
}

fn start() -> FlowTestResult<chrono::DateTime<Utc>> {
    Utc.with_ymd_and_hms(2026, 1, 10, 18, 0, 0).single().ok_or_else(|| "valid start".to_string())
}

#[tokio::test]
async fn recommendations_are_cached_then_invalidated_by_a_new_favorite() -> FlowTestResult {
    let pool = seeded_pool().await?;
    let clock = Arc::new(ManualClock::new(start()?));
    let service = service(&pool, clock.clone());
    let user = UserId::from("demo-user");

    let first = service
        .recommend(&user, Mood::Usual, Some(5))
        .await
        .map_err(|error| format!("first recommend: {error}"))?;
    require_eq!(first.results().len(), 5);
    require_eq!(cached_rows(&pool, "demo-user").await?, 5);
    for saved in ["dassai-45", "kokuryu-daiginjo", "aramasa-no6", "kubota-senju"] {
        require!(!result_ids(&first).iter().any(|id| id == saved), "saved item {saved} recommended");
    }

    clock.advance(Duration::hours(1));
    let second = service
        .recommend(&user, Mood::Usual, Some(5))
        .await
        .map_err(|error| format!("second recommend: {error}"))?;
    require_eq!(&second, &first);

    let mut snapshot =
        service.favorites(&user).await.map_err(|error| format!("favorites: {error}"))?;
    let added = ItemId::from(result_ids(&first)[0].as_str());
    service
        .save_favorite(&mut snapshot, &added)
        .await
        .map_err(|error| format!("save favorite: {error}"))?;
    require!(snapshot.contains(&added));
    require_eq!(snapshot.len(), 5);
    require_eq!(cached_rows(&pool, "demo-user").await?, 0);

    let third = service
        .recommend(&user, Mood::Usual, Some(5))
        .await
        .map_err(|error| format!("third recommend: {error}"))?;
    require!(!result_ids(&third).contains(&added.0), "newly saved item is still recommended");
    Ok(())
}

#[tokio::test]
async fn expired_cache_is_recomposed() -> FlowTestResult {
    let pool = seeded_pool().await?;
    let clock = Arc::new(ManualClock::new(start()?));
    let service = service(&pool, clock.clone());
    let user = UserId::from("demo-user");

    service
        .recommend(&user, Mood::Adventure, None)
        .await
        .map_err(|error| format!("recommend: {error}"))?;
    let first_written: String = sqlx::query_scalar(
        "SELECT MAX(created_at) FROM recommendation_cache WHERE user_id = 'demo-user'",
    )
    .fetch_one(&pool)
    .await
    .map_err(|error| format!("read created_at: {error}"))?;

    clock.advance(Duration::hours(13));
    service
        .recommend(&user, Mood::Adventure, None)
        .await
        .map_err(|error| format!("recommend after expiry: {error}"))?;
    let second_written: String = sqlx::query_scalar(
        "SELECT MAX(created_at) FROM recommendation_cache WHERE user_id = 'demo-user'",
    )
    .fetch_one(&pool)
    .await
    .map_err(|error| format!("read created_at: {error}"))?;

    require!(second_written > first_written, "cache was not rewritten after expiry");
    Ok(())
}

#[tokio::test]
async fn newcomer_gets_guidance_and_cannot_remove_unsaved_item() -> FlowTestResult {
    let pool = seeded_pool().await?;
    let clock = Arc::new(ManualClock::new(start()?));
    let service = service(&pool, clock);
    let user = UserId::from("newcomer");

    let outcome = service
        .recommend(&user, Mood::Discovery, None)
        .await
        .map_err(|error| format!("recommend: {error}"))?;
    require!(outcome.requires_more_favorites());
    require_eq!(cached_rows(&pool, "newcomer").await?, 0);

    let mut snapshot =
        service.favorites(&user).await.map_err(|error| format!("favorites: {error}"))?;
    let removal = service.remove_favorite(&mut snapshot, &ItemId::from("dassai-45")).await;
    require!(
        matches!(removal, Err(ApplicationError::Domain(DomainError::InvariantViolation(_)))),
        "unexpected removal result: {removal:?}"
    );
    require_eq!(snapshot.len(), 1);
    require!(!snapshot.has_pending());
    Ok(())
}
