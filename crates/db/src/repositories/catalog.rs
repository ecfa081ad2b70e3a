use chrono::{DateTime, Utc};
use sqlx::Row;

use kikizake_core::domain::item::{CandidateItem, ItemId};
use kikizake_core::domain::taste::TasteVector;
use kikizake_core::errors::ApplicationError;
use kikizake_core::recommend::CatalogSource;

use super::{decode_error, format_timestamp, RepositoryError};
use crate::DbPool;

pub(crate) const CATALOG_COLUMNS: &str = "id, name, producer, sweetness, richness, floral, mellow, heavy, \
                               mild, dry, light, popularity";

pub struct SqlCatalogRepository {
    pool: DbPool,
}

impl SqlCatalogRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn list_all(&self) -> Result<Vec<CandidateItem>, RepositoryError> {
        let rows = sqlx::query(&format!("SELECT {CATALOG_COLUMNS} FROM catalog_items ORDER BY id"))
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(row_to_item).collect()
    }

    pub async fn find_by_id(&self, id: &ItemId) -> Result<Option<CandidateItem>, RepositoryError> {
        let row = sqlx::query(&format!("SELECT {CATALOG_COLUMNS} FROM catalog_items WHERE id = ?"))
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(ref r) => Ok(Some(row_to_item(r)?)),
            None => Ok(None),
        }
    }

    pub async fn upsert(
        &self,
        item: &CandidateItem,
        updated_at: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        let taste = item.taste.clamped();
        sqlx::query(
            "INSERT INTO catalog_items (id, name, producer, sweetness, richness, floral, mellow,
                                        heavy, mild, dry, light, popularity, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                 name = excluded.name,
                 producer = excluded.producer,
                 sweetness = excluded.sweetness,
                 richness = excluded.richness,
                 floral = excluded.floral,
                 mellow = excluded.mellow,
                 heavy = excluded.heavy,
                 mild = excluded.mild,
                 dry = excluded.dry,
                 light = excluded.light,
                 popularity = excluded.popularity,
                 updated_at = excluded.updated_at",
        )
        .bind(item.id.as_str())
        .bind(&item.name)
        .bind(&item.producer)
        .bind(taste.sweetness)
        .bind(taste.richness)
        .bind(taste.floral)
        .bind(taste.mellow)
        .bind(taste.heavy)
        .bind(taste.mild)
        .bind(taste.dry)
        .bind(taste.light)
        .bind(item.popularity.clamp(0.0, 1.0))
        .bind(format_timestamp(updated_at))
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

pub(crate) fn row_to_item(row: &sqlx::sqlite::SqliteRow) -> Result<CandidateItem, RepositoryError> {
    let real = |name: &str| -> Result<f64, RepositoryError> {
        row.try_get::<f64, _>(name).map_err(decode_error)
    };

    let id: String = row.try_get("id").map_err(decode_error)?;
    let name: String = row.try_get("name").map_err(decode_error)?;
    let producer: String = row.try_get("producer").map_err(decode_error)?;
    let taste = TasteVector::new(
        real("sweetness")?,
        real("richness")?,
        real("floral")?,
        real("mellow")?,
        real("heavy")?,
        real("mild")?,
        real("dry")?,
        real("light")?,
    );

    Ok(CandidateItem::new(id, name, producer, taste).with_popularity(real("popularity")?))
}

#[async_trait::async_trait]
impl CatalogSource for SqlCatalogRepository {
    async fn load_catalog(&self) -> Result<Vec<CandidateItem>, ApplicationError> {
        Ok(self.list_all().await?)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use kikizake_core::domain::item::{CandidateItem, ItemId};
    use kikizake_core::domain::taste::TasteVector;
    use kikizake_core::recommend::CatalogSource;

    use super::SqlCatalogRepository;
    use crate::{connect_with_settings, migrations};

    async fn repository() -> SqlCatalogRepository {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrations");
        SqlCatalogRepository::new(pool)
    }

    #[tokio::test]
    async fn upsert_then_load_round_trips_taste_and_popularity() {
        let repo = repository().await;
        let updated_at = Utc.with_ymd_and_hms(2026, 4, 1, 9, 0, 0).single().expect("valid timestamp");
        let item = CandidateItem::new(
            "kokuryu-daiginjo",
            "Kokuryu Daiginjo",
            "Kokuryu Shuzo",
            TasteVector::new(0.5, -1.0, 0.8, 0.6, 0.2, 0.7, 0.4, 0.8),
        )
        .with_popularity(0.72);

        repo.upsert(&item, updated_at).await.expect("upsert");
        let loaded = repo.find_by_id(&ItemId::from("kokuryu-daiginjo")).await.expect("find");

        assert_eq!(loaded, Some(item));
    }

    #[tokio::test]
    async fn upsert_overwrites_existing_item() {
        let repo = repository().await;
        let now = Utc.with_ymd_and_hms(2026, 4, 1, 9, 0, 0).single().expect("valid timestamp");
        let mut item = CandidateItem::new("a", "Old Name", "Brewery", TasteVector::NEUTRAL);
        repo.upsert(&item, now).await.expect("insert");

        item.name = "New Name".to_string();
        item.popularity = 0.4;
        repo.upsert(&item, now).await.expect("update");

        let all = repo.load_catalog().await.expect("load");
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].name, "New Name");
        assert_eq!(all[0].popularity, 0.4);
    }

    #[tokio::test]
    async fn catalog_is_listed_in_id_order() {
        let repo = repository().await;
        let now = Utc.with_ymd_and_hms(2026, 4, 1, 9, 0, 0).single().expect("valid timestamp");
        for id in ["c", "a", "b"] {
            repo.upsert(&CandidateItem::new(id, id, "Brewery", TasteVector::NEUTRAL), now)
                .await
                .expect("upsert");
        }

        let ids: Vec<String> =
            repo.list_all().await.expect("list").into_iter().map(|item| item.id.0).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }
}
