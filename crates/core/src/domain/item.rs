use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::taste::TasteVector;

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ItemId(pub String);

impl ItemId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ItemId {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub String);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UserId {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

/// A catalog sake eligible for scoring.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CandidateItem {
    pub id: ItemId,
    pub name: String,
    /// Brewery name; used for the brewery-diversity signal.
    pub producer: String,
    pub taste: TasteVector,
    /// Popularity signal in `[0, 1]` supplied by the catalog.
    pub popularity: f64,
}

impl CandidateItem {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        producer: impl Into<String>,
        taste: TasteVector,
    ) -> Self {
        Self {
            id: ItemId(id.into()),
            name: name.into(),
            producer: producer.into(),
            taste: taste.clamped(),
            popularity: 0.0,
        }
    }

    pub fn with_popularity(mut self, popularity: f64) -> Self {
        self.popularity = if popularity.is_finite() { popularity.clamp(0.0, 1.0) } else { 0.0 };
        self
    }
}

/// A user's saved reference to a catalog item.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SavedItem {
    pub user_id: UserId,
    pub item: CandidateItem,
    pub created_at: Option<DateTime<Utc>>,
}

impl SavedItem {
    pub fn new(user_id: UserId, item: CandidateItem, created_at: DateTime<Utc>) -> Self {
        Self { user_id, item, created_at: Some(created_at) }
    }
}
