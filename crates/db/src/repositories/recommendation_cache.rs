use chrono::{DateTime, Utc};
use sqlx::Row;

use kikizake_core::domain::item::{ItemId, UserId};
use kikizake_core::domain::recommendation::{Mood, RecommendationClass};
use kikizake_core::errors::ApplicationError;
use kikizake_core::recommend::{CacheEntry, RecommendationCacheStore};

use super::{decode_error, format_timestamp, parse_timestamp, RepositoryError};
use crate::DbPool;

pub struct SqlRecommendationCacheRepository {
    pool: DbPool,
}

impl SqlRecommendationCacheRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn live_entries(
        &self,
        user_id: &UserId,
        mood: Mood,
        now: DateTime<Utc>,
    ) -> Result<Vec<CacheEntry>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT user_id, item_id, mood, rank, score, class, reason, similarity_score,
                    predicted_rating, created_at, expires_at
             FROM recommendation_cache
             WHERE user_id = ? AND mood = ? AND expires_at > ?
             ORDER BY rank ASC, item_id ASC",
        )
        .bind(&user_id.0)
        .bind(mood.as_str())
        .bind(format_timestamp(now))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_entry).collect()
    }

    /// Writes the batch in one transaction, last write wins per `(user, item, mood)`.
    pub async fn upsert(&self, entries: &[CacheEntry]) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        for entry in entries {
            sqlx::query(
                "INSERT INTO recommendation_cache
                    (user_id, item_id, mood, rank, score, class, reason, similarity_score,
                     predicted_rating, created_at, expires_at)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                 ON CONFLICT(user_id, item_id, mood) DO UPDATE SET
                     rank = excluded.rank,
                     score = excluded.score,
                     class = excluded.class,
                     reason = excluded.reason,
                     similarity_score = excluded.similarity_score,
                     predicted_rating = excluded.predicted_rating,
                     created_at = excluded.created_at,
                     expires_at = excluded.expires_at",
            )
            .bind(&entry.user_id.0)
            .bind(entry.item_id.as_str())
            .bind(entry.mood.as_str())
            .bind(entry.rank as i64)
            .bind(entry.score)
            .bind(entry.class.as_str())
            .bind(&entry.reason)
            .bind(entry.similarity_score)
            .bind(entry.predicted_rating)
            .bind(format_timestamp(entry.created_at))
            .bind(format_timestamp(entry.expires_at))
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    pub async fn delete_for_user(&self, user_id: &UserId) -> Result<u64, RepositoryError> {
        let result = sqlx::query("DELETE FROM recommendation_cache WHERE user_id = ?")
            .bind(&user_id.0)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    /// Drops rows whose `expires_at` is at or before `now`.
    pub async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64, RepositoryError> {
        let result = sqlx::query("DELETE FROM recommendation_cache WHERE expires_at <= ?")
            .bind(format_timestamp(now))
            .execute(&self.pool)
            .await?;

        if result.rows_affected() > 0 {
            tracing::debug!(
                event_name = "recommendation_cache.purged",
                removed = result.rows_affected(),
                "purged expired recommendation cache rows"
            );
        }
        Ok(result.rows_affected())
    }
}

fn row_to_entry(row: &sqlx::sqlite::SqliteRow) -> Result<CacheEntry, RepositoryError> {
    let user_id: String = row.try_get("user_id").map_err(decode_error)?;
    let item_id: String = row.try_get("item_id").map_err(decode_error)?;
    let mood: String = row.try_get("mood").map_err(decode_error)?;
    let rank: i64 = row.try_get("rank").map_err(decode_error)?;
    let class: String = row.try_get("class").map_err(decode_error)?;
    let created_at: String = row.try_get("created_at").map_err(decode_error)?;
    let expires_at: String = row.try_get("expires_at").map_err(decode_error)?;

    let mood = mood
        .parse::<Mood>()
        .map_err(|error| RepositoryError::Decode(format!("recommendation_cache.mood: {error}")))?;
    let class = class
        .parse::<RecommendationClass>()
        .map_err(|error| RepositoryError::Decode(format!("recommendation_cache.class: {error}")))?;
    let rank = usize::try_from(rank)
        .map_err(|_| RepositoryError::Decode(format!("recommendation_cache.rank: {rank}")))?;

    Ok(CacheEntry {
        user_id: UserId(user_id),
        item_id: ItemId(item_id),
        mood,
        rank,
        score: row.try_get("score").map_err(decode_error)?,
        class,
        reason: row.try_get("reason").map_err(decode_error)?,
        similarity_score: row.try_get("similarity_score").map_err(decode_error)?,
        predicted_rating: row.try_get("predicted_rating").map_err(decode_error)?,
        created_at: parse_timestamp("recommendation_cache.created_at", &created_at)?,
        expires_at: parse_timestamp("recommendation_cache.expires_at", &expires_at)?,
    })
}

#[async_trait::async_trait]
impl RecommendationCacheStore for SqlRecommendationCacheRepository {
    async fn live_entries(
        &self,
        user_id: &UserId,
        mood: Mood,
        now: DateTime<Utc>,
    ) -> Result<Vec<CacheEntry>, ApplicationError> {
        Ok(SqlRecommendationCacheRepository::live_entries(self, user_id, mood, now).await?)
    }

    async fn upsert(&self, entries: Vec<CacheEntry>) -> Result<(), ApplicationError> {
        Ok(SqlRecommendationCacheRepository::upsert(self, &entries).await?)
    }

    async fn delete_for_user(&self, user_id: &UserId) -> Result<u64, ApplicationError> {
        Ok(SqlRecommendationCacheRepository::delete_for_user(self, user_id).await?)
    }
}
