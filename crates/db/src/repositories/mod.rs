use chrono::{DateTime, SecondsFormat, Utc};
use thiserror::Error;

use kikizake_core::errors::ApplicationError;

pub mod catalog;
pub mod memory;
pub mod recommendation_cache;
pub mod saved_items;

pub use catalog::SqlCatalogRepository;
pub use memory::{
    InMemoryCatalogRepository, InMemoryRecommendationCacheStore, InMemorySavedItemStore,
};
pub use recommendation_cache::SqlRecommendationCacheRepository;
pub use saved_items::SqlSavedItemRepository;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
}

impl From<RepositoryError> for ApplicationError {
    fn from(value: RepositoryError) -> Self {
        ApplicationError::Persistence(value.to_string())
    }
}

/// Fixed-width UTC text so stored timestamps compare correctly as strings.
pub(crate) fn format_timestamp(value: DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub(crate) fn parse_timestamp(column: &str, value: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(value)
        .map(|parsed| parsed.with_timezone(&Utc))
        .map_err(|error| RepositoryError::Decode(format!("{column}: {error}")))
}

pub(crate) fn decode_error(error: sqlx::Error) -> RepositoryError {
    RepositoryError::Decode(error.to_string())
}
