//! Spread and exploratory-tendency scores over a set of items.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::{
    ADVENTURE_BREWERY_WEIGHT, ADVENTURE_DIVERSITY_WEIGHT, BREWERY_DIVERSITY_CEILING,
    DIVERSITY_DISTANCE_CEILING,
};
use crate::domain::item::CandidateItem;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct DiversityScores {
    /// Average pairwise taste distance, normalised to `[0, 1]`
    pub diversity: f64,
    /// Blend of brewery variety and taste diversity, `[0, 1]`
    pub adventure: f64,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DiversityAdventureScorer;

impl DiversityAdventureScorer {
    pub fn new() -> Self {
        Self
    }

    pub fn score<'a, I>(&self, items: I) -> DiversityScores
    where
        I: IntoIterator<Item = &'a CandidateItem>,
    {
        let items: Vec<&CandidateItem> = items.into_iter().collect();
        if items.is_empty() {
            return DiversityScores::default();
        }

        let diversity = self.diversity(&items);
        let brewery_diversity = self.brewery_diversity(&items);
        let adventure = (ADVENTURE_BREWERY_WEIGHT * brewery_diversity
            + ADVENTURE_DIVERSITY_WEIGHT * diversity)
            .clamp(0.0, 1.0);

        DiversityScores { diversity, adventure }
    }

    fn diversity(&self, items: &[&CandidateItem]) -> f64 {
        if items.len() < 2 {
            return 0.0;
        }

        let mut total = 0.0;
        let mut pairs = 0usize;
        for (index, left) in items.iter().enumerate() {
            for right in &items[index + 1..] {
                total += left.taste.distance(&right.taste);
                pairs += 1;
            }
        }

        let average = total / pairs as f64;
        (average / DIVERSITY_DISTANCE_CEILING).clamp(0.0, 1.0)
    }

    fn brewery_diversity(&self, items: &[&CandidateItem]) -> f64 {
        let producers: HashSet<String> =
            items.iter().map(|item| item.producer.trim().to_lowercase()).collect();
        (producers.len() as f64 / BREWERY_DIVERSITY_CEILING).min(1.0)
    }
}
