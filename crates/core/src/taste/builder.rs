//! Folds a user's saved items into a single recency-weighted taste vector.

use chrono::{DateTime, Utc};

use super::{DEFAULT_HALF_LIFE_DAYS, DEFAULT_MAX_ITEMS};
use crate::domain::item::SavedItem;
use crate::domain::taste::{TasteVector, TASTE_DIMENSIONS};

const SECONDS_PER_DAY: f64 = 86_400.0;

/// Options for [`PreferenceVectorBuilder`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BuilderOptions {
    /// Most recent saved items considered (default: 50)
    pub max_items: usize,
    /// Decay constant in days for `exp(-age / half_life_days)` (default: 30)
    pub half_life_days: f64,
}

impl Default for BuilderOptions {
    fn default() -> Self {
        Self { max_items: DEFAULT_MAX_ITEMS, half_life_days: DEFAULT_HALF_LIFE_DAYS }
    }
}

#[derive(Debug, Clone, Default)]
pub struct PreferenceVectorBuilder {
    options: BuilderOptions,
}

impl PreferenceVectorBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: BuilderOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> BuilderOptions {
        self.options
    }

    /// Weighted mean of the saved items' vectors, most recent items first.
    ///
    /// Returns [`TasteVector::NEUTRAL`] when nothing is saved.
    pub fn build(&self, saved_items: &[SavedItem], now: DateTime<Utc>) -> TasteVector {
        let sample = self.recent_sample(saved_items);
        if sample.is_empty() {
            return TasteVector::NEUTRAL;
        }

        let mut weighted_sums = [0.0f64; TASTE_DIMENSIONS];
        let mut total_weight = 0.0;

        for saved in &sample {
            let weight = self.weight_for(saved, now);
            for (sum, value) in weighted_sums.iter_mut().zip(saved.item.taste.to_array()) {
                *sum += weight * value;
            }
            total_weight += weight;
        }

        if total_weight <= 0.0 || !total_weight.is_finite() {
            return TasteVector::NEUTRAL;
        }

        TasteVector::from_array(weighted_sums.map(|sum| sum / total_weight))
    }

    /// Saved items ordered newest first and capped at `max_items`.
    ///
    /// Items without a timestamp sort after every dated item.
    pub fn recent_sample<'a>(&self, saved_items: &'a [SavedItem]) -> Vec<&'a SavedItem> {
        let mut sample: Vec<&SavedItem> = saved_items.iter().collect();
        sample.sort_by(|a, b| match (a.created_at, b.created_at) {
            (Some(a_at), Some(b_at)) => b_at.cmp(&a_at),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => std::cmp::Ordering::Equal,
        });
        sample.truncate(self.options.max_items);
        sample
    }

    /// Decay weight of a single saved item at `now`.
    pub fn weight_for(&self, saved: &SavedItem, now: DateTime<Utc>) -> f64 {
        match saved.created_at {
            Some(created_at) => {
                let age_days = (now - created_at).num_milliseconds() as f64 / 1000.0 / SECONDS_PER_DAY;
                decay_weight(age_days, self.options.half_life_days)
            }
            None => 1.0,
        }
    }
}

/// `exp(-age_days / half_life_days)`; future timestamps count as brand new.
pub fn decay_weight(age_days: f64, half_life_days: f64) -> f64 {
    if half_life_days <= 0.0 || !half_life_days.is_finite() {
        return 1.0;
    }
    (-age_days.max(0.0) / half_life_days).exp()
}
