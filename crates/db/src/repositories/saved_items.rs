use sqlx::Row;

use kikizake_core::domain::item::{ItemId, SavedItem, UserId};
use kikizake_core::errors::ApplicationError;
use kikizake_core::recommend::SavedItemStore;

use super::catalog::row_to_item;
use super::{decode_error, format_timestamp, parse_timestamp, RepositoryError};
use crate::DbPool;

pub struct SqlSavedItemRepository {
    pool: DbPool,
}

impl SqlSavedItemRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Newest first; undated rows last.
    pub async fn list_for_user(&self, user_id: &UserId) -> Result<Vec<SavedItem>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT s.user_id AS user_id, s.created_at AS created_at,
                    c.id AS id, c.name AS name, c.producer AS producer,
                    c.sweetness AS sweetness, c.richness AS richness, c.floral AS floral,
                    c.mellow AS mellow, c.heavy AS heavy, c.mild AS mild, c.dry AS dry,
                    c.light AS light, c.popularity AS popularity
             FROM saved_items s
             JOIN catalog_items c ON c.id = s.item_id
             WHERE s.user_id = ?
             ORDER BY s.created_at IS NULL, s.created_at DESC, s.item_id ASC",
        )
        .bind(&user_id.0)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_saved_item).collect()
    }

    /// Saving an item twice keeps one row with the latest timestamp.
    pub async fn insert(&self, saved: &SavedItem) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO saved_items (user_id, item_id, created_at)
             VALUES (?, ?, ?)
             ON CONFLICT(user_id, item_id) DO UPDATE SET created_at = excluded.created_at",
        )
        .bind(&saved.user_id.0)
        .bind(saved.item.id.as_str())
        .bind(saved.created_at.map(format_timestamp))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn delete(&self, user_id: &UserId, item_id: &ItemId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM saved_items WHERE user_id = ? AND item_id = ?")
            .bind(&user_id.0)
            .bind(item_id.as_str())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn count_for_user(&self, user_id: &UserId) -> Result<i64, RepositoryError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(1) FROM saved_items WHERE user_id = ?")
            .bind(&user_id.0)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

fn row_to_saved_item(row: &sqlx::sqlite::SqliteRow) -> Result<SavedItem, RepositoryError> {
    let user_id: String = row.try_get("user_id").map_err(decode_error)?;
    let created_at: Option<String> = row.try_get("created_at").map_err(decode_error)?;
    let created_at =
        created_at.map(|value| parse_timestamp("saved_items.created_at", &value)).transpose()?;

    Ok(SavedItem { user_id: UserId(user_id), item: row_to_item(row)?, created_at })
}

#[async_trait::async_trait]
impl SavedItemStore for SqlSavedItemRepository {
    async fn list_for_user(&self, user_id: &UserId) -> Result<Vec<SavedItem>, ApplicationError> {
        Ok(SqlSavedItemRepository::list_for_user(self, user_id).await?)
    }

    async fn insert(&self, saved: SavedItem) -> Result<(), ApplicationError> {
        Ok(SqlSavedItemRepository::insert(self, &saved).await?)
    }

    async fn delete(&self, user_id: &UserId, item_id: &ItemId) -> Result<bool, ApplicationError> {
        Ok(SqlSavedItemRepository::delete(self, user_id, item_id).await?)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};

    use kikizake_core::domain::item::{CandidateItem, ItemId, SavedItem, UserId};
    use kikizake_core::domain::taste::TasteVector;
    use kikizake_core::errors::ApplicationError;
    use kikizake_core::recommend::SavedItemStore;

    use super::SqlSavedItemRepository;
    use crate::repositories::{RepositoryError, SqlCatalogRepository};
    use crate::{connect_with_settings, migrations, DbPool};

    async fn pool_with_catalog(ids: &[&str]) -> DbPool {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrations");
        let catalog = SqlCatalogRepository::new(pool.clone());
        let now = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).single().expect("valid timestamp");
        for id in ids {
            catalog
                .upsert(&CandidateItem::new(*id, *id, format!("{id} brewery"), TasteVector::NEUTRAL), now)
                .await
                .expect("seed catalog");
        }
        pool
    }

    fn item(id: &str) -> CandidateItem {
        CandidateItem::new(id, id, format!("{id} brewery"), TasteVector::NEUTRAL)
    }

    #[tokio::test]
    async fn list_for_user_is_newest_first_with_undated_last() {
        let pool = pool_with_catalog(&["a", "b", "c"]).await;
        let repo = SqlSavedItemRepository::new(pool);
        let user = UserId::from("u-1");
        let base = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).single().expect("valid timestamp");

        repo.insert(&SavedItem::new(user.clone(), item("a"), base)).await.expect("insert a");
        repo.insert(&SavedItem { user_id: user.clone(), item: item("b"), created_at: None })
            .await
            .expect("insert b");
        repo.insert(&SavedItem::new(user.clone(), item("c"), base + Duration::days(2)))
            .await
            .expect("insert c");

        let saved = repo.list_for_user(&user).await.expect("list");
        let ids: Vec<&str> = saved.iter().map(|saved| saved.item.id.as_str()).collect();
        assert_eq!(ids, vec!["c", "a", "b"]);
        assert_eq!(saved[0].created_at, Some(base + Duration::days(2)));
        assert_eq!(saved[0].item, item("c"));
    }

    #[tokio::test]
    async fn saving_twice_keeps_a_single_row() {
        let pool = pool_with_catalog(&["a"]).await;
        let repo = SqlSavedItemRepository::new(pool);
        let user = UserId::from("u-1");
        let first = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).single().expect("valid timestamp");

        repo.insert(&SavedItem::new(user.clone(), item("a"), first)).await.expect("first");
        repo.insert(&SavedItem::new(user.clone(), item("a"), first + Duration::hours(1)))
            .await
            .expect("second");

        assert_eq!(repo.count_for_user(&user).await.expect("count"), 1);
        let saved = repo.list_for_user(&user).await.expect("list");
        assert_eq!(saved[0].created_at, Some(first + Duration::hours(1)));
    }

    #[tokio::test]
    async fn delete_reports_whether_a_row_was_removed() {
        let pool = pool_with_catalog(&["a"]).await;
        let repo = SqlSavedItemRepository::new(pool);
        let user = UserId::from("u-1");
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).single().expect("valid timestamp");
        repo.insert(&SavedItem::new(user.clone(), item("a"), now)).await.expect("insert");

        assert!(repo.delete(&user, &ItemId::from("a")).await.expect("delete"));
        assert!(!repo.delete(&user, &ItemId::from("a")).await.expect("delete again"));
        assert!(repo.list_for_user(&user).await.expect("list").is_empty());
    }

    #[tokio::test]
    async fn saving_an_item_missing_from_catalog_is_a_persistence_error() {
        let pool = pool_with_catalog(&[]).await;
        let repo = SqlSavedItemRepository::new(pool);
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).single().expect("valid timestamp");
        let saved = SavedItem::new(UserId::from("u-1"), item("ghost"), now);

        let direct = repo.insert(&saved).await;
        assert!(matches!(direct, Err(RepositoryError::Database(_))));

        let through_store = SavedItemStore::insert(&repo, saved).await;
        assert!(matches!(through_store, Err(ApplicationError::Persistence(_))));
    }
}
