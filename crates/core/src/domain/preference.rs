use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::taste::{TasteType, TasteVector};

/// Derived taste profile of a user. Recomputed from the saved items on demand.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Preference {
    pub vector: TasteVector,
    pub taste_type: TasteType,
    pub diversity_score: f64,
    pub adventure_score: f64,
    pub sample_size: usize,
    pub computed_at: DateTime<Utc>,
}

impl Preference {
    pub fn is_low_confidence(&self, min_favorites: usize) -> bool {
        self.sample_size < min_favorites
    }
}
