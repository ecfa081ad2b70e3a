use sqlx::Executor;

use crate::connection::DbPool;
use crate::repositories::RepositoryError;

/// Demo users and the favourites each one starts with.
const SEED_USERS: &[SeedUserContract] = &[
    SeedUserContract {
        user_id: "demo-user",
        favorite_ids: &["dassai-45", "kokuryu-daiginjo", "aramasa-no6", "kubota-senju"],
        description: "Four fruity/light favourites; enough history for recommendations",
    },
    SeedUserContract {
        user_id: "newcomer",
        favorite_ids: &["hakkaisan-tokubetsu"],
        description: "Single favourite; receives the save-more-favourites guidance",
    },
];

const SEED_CATALOG_SIZE: i64 = 16;

/// Deterministic demo catalog and favourites.
pub struct DemoSeedDataset;

impl DemoSeedDataset {
    pub const SQL: &str = include_str!("../../../config/fixtures/demo_seed_data.sql");

    /// Load the dataset. Safe to call repeatedly.
    pub async fn load(pool: &DbPool) -> Result<SeedResult, RepositoryError> {
        let mut tx = pool.begin().await?;
        tx.execute(sqlx::query(Self::SQL)).await?;
        tx.commit().await?;

        let users_seeded = SEED_USERS
            .iter()
            .map(|user| UserSeedInfo {
                user_id: user.user_id,
                favorites: user.favorite_ids.len(),
                description: user.description,
            })
            .collect();

        Ok(SeedResult { catalog_items: SEED_CATALOG_SIZE as usize, users_seeded })
    }

    pub async fn verify(pool: &DbPool) -> Result<VerificationResult, RepositoryError> {
        let mut checks = Vec::new();

        let catalog_count: i64 =
            sqlx::query_scalar("SELECT COUNT(1) FROM catalog_items").fetch_one(pool).await?;
        checks.push(("catalog-items", catalog_count >= SEED_CATALOG_SIZE));

        let trending_count: i64 =
            sqlx::query_scalar("SELECT COUNT(1) FROM catalog_items WHERE popularity > 0")
                .fetch_one(pool)
                .await?;
        checks.push(("catalog-trending-signal", trending_count > 0));

        for user in SEED_USERS {
            let saved_count: i64 =
                sqlx::query_scalar("SELECT COUNT(1) FROM saved_items WHERE user_id = ?1")
                    .bind(user.user_id)
                    .fetch_one(pool)
                    .await?;
            checks.push((user.count_label(), saved_count == user.favorite_ids.len() as i64));

            let mut all_present = true;
            for item_id in user.favorite_ids {
                let present: i64 = sqlx::query_scalar(
                    "SELECT EXISTS(SELECT 1 FROM saved_items WHERE user_id = ?1 AND item_id = ?2)",
                )
                .bind(user.user_id)
                .bind(*item_id)
                .fetch_one(pool)
                .await?;
                all_present &= present == 1;
            }
            checks.push((user.favorites_label(), all_present));
        }

        let all_present = checks.iter().all(|(_, ok)| *ok);
        Ok(VerificationResult { all_present, checks })
    }

    /// Remove the demo favourites. Catalog rows are left in place.
    pub async fn clean(pool: &DbPool) -> Result<(), RepositoryError> {
        let mut tx = pool.begin().await?;
        for user in SEED_USERS {
            sqlx::query("DELETE FROM saved_items WHERE user_id = ?1")
                .bind(user.user_id)
                .execute(&mut *tx)
                .await?;
            sqlx::query("DELETE FROM recommendation_cache WHERE user_id = ?1")
                .bind(user.user_id)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy)]
struct SeedUserContract {
    user_id: &'static str,
    favorite_ids: &'static [&'static str],
    description: &'static str,
}

impl SeedUserContract {
    fn count_label(&self) -> &'static str {
        match self.user_id {
            "demo-user" => "demo-user-favorite-count",
            _ => "newcomer-favorite-count",
        }
    }

    fn favorites_label(&self) -> &'static str {
        match self.user_id {
            "demo-user" => "demo-user-favorites",
            _ => "newcomer-favorites",
        }
    }
}

#[derive(Debug)]
pub struct SeedResult {
    pub catalog_items: usize,
    pub users_seeded: Vec<UserSeedInfo>,
}

#[derive(Debug)]
pub struct UserSeedInfo {
    pub user_id: &'static str,
    pub favorites: usize,
    pub description: &'static str,
}

#[derive(Debug)]
pub struct VerificationResult {
    pub all_present: bool,
    pub checks: Vec<(&'static str, bool)>,
}
