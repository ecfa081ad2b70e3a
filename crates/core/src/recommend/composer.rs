//! Mood-mixed recommendation composition over a candidate pool

use std::collections::HashSet;

use super::similarity::{by_score_then_id, predicted_rating, similarity_reason, SimilarityScorer};
use super::{
    EXPLORE_REASON, EXPLORE_SIMILARITY_CEILING, EXPLORE_SIMILARITY_FLOOR, SPECIAL_REASON,
    SPECIAL_SIMILARITY_WEIGHT, TRENDING_REASON,
};
use crate::domain::item::{CandidateItem, ItemId};
use crate::domain::preference::Preference;
use crate::domain::recommendation::{Mood, RecommendationClass, RecommendationResult};

/// Share of the result list given to each recommendation class.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MoodMix {
    pub similar: f64,
    pub explore: f64,
    pub trending: f64,
}

impl MoodMix {
    pub fn for_mood(mood: Mood) -> Self {
        match mood {
            Mood::Usual => Self { similar: 0.7, explore: 0.1, trending: 0.2 },
            Mood::Adventure => Self { similar: 1.0 / 3.0, explore: 1.0 / 3.0, trending: 1.0 / 3.0 },
            Mood::Discovery => Self { similar: 0.2, explore: 0.6, trending: 0.2 },
            Mood::Special => Self { similar: 0.2, explore: 0.1, trending: 0.7 },
        }
    }

    /// Classes ordered by share, largest first; ties keep similar/explore/trending order.
    pub fn class_order(&self) -> [RecommendationClass; 3] {
        let mut classes = [
            (RecommendationClass::Similar, self.similar),
            (RecommendationClass::Explore, self.explore),
            (RecommendationClass::Trending, self.trending),
        ];
        classes.sort_by(|a, b| b.1.total_cmp(&a.1));
        classes.map(|(class, _)| class)
    }

    /// Splits `count` slots across classes with the largest-remainder method.
    pub fn quotas(&self, count: usize) -> ClassQuotas {
        let shares = [self.similar, self.explore, self.trending];
        let total_share: f64 = shares.iter().sum();
        if total_share <= 0.0 {
            return ClassQuotas { similar: count, explore: 0, trending: 0 };
        }

        let raw = shares.map(|share| count as f64 * share / total_share);
        let mut assigned = raw.map(|value| value.floor() as usize);
        let mut remaining = count.saturating_sub(assigned.iter().sum());

        let mut by_remainder = [0usize, 1, 2];
        by_remainder.sort_by(|a, b| {
            let a_fraction = raw[*a] - raw[*a].floor();
            let b_fraction = raw[*b] - raw[*b].floor();
            b_fraction.total_cmp(&a_fraction).then_with(|| a.cmp(b))
        });
        for index in by_remainder {
            if remaining == 0 {
                break;
            }
            assigned[index] += 1;
            remaining -= 1;
        }

        ClassQuotas { similar: assigned[0], explore: assigned[1], trending: assigned[2] }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClassQuotas {
    pub similar: usize,
    pub explore: usize,
    pub trending: usize,
}

impl ClassQuotas {
    pub fn for_class(&self, class: RecommendationClass) -> usize {
        match class {
            RecommendationClass::Similar => self.similar,
            RecommendationClass::Explore => self.explore,
            RecommendationClass::Trending => self.trending,
            RecommendationClass::Pairing | RecommendationClass::Random => 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ComposeOptions {
    pub count: usize,
    pub mood: Mood,
}

impl Default for ComposeOptions {
    fn default() -> Self {
        Self { count: super::DEFAULT_RECOMMENDATION_COUNT, mood: Mood::Usual }
    }
}

#[derive(Debug, Clone, Default)]
pub struct RecommendationComposer {
    scorer: SimilarityScorer,
}

impl RecommendationComposer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn scorer(&self) -> &SimilarityScorer {
        &self.scorer
    }

    /// Ranks `pool` against the preference and mixes classes per the mood.
    ///
    /// Deterministic for identical inputs. An empty pool yields an empty list.
    pub fn compose(
        &self,
        preference: &Preference,
        pool: &[CandidateItem],
        options: ComposeOptions,
    ) -> Vec<RecommendationResult> {
        if pool.is_empty() || options.count == 0 {
            return Vec::new();
        }

        let ranked = self.scorer.rank(&preference.vector, pool);
        let mix = MoodMix::for_mood(options.mood);
        let quotas = mix.quotas(options.count);

        let similar = self.similar_candidates(&ranked);
        let explore = self.explore_candidates(&ranked);
        let trending = self.trending_candidates(&ranked, options.mood);

        let mut used: HashSet<&ItemId> = HashSet::new();
        let mut blocks: Vec<Vec<RecommendationResult>> = Vec::with_capacity(3);

        for class in mix.class_order() {
            let candidates = match class {
                RecommendationClass::Similar => &similar,
                RecommendationClass::Explore => &explore,
                _ => &trending,
            };
            let mut block = Vec::new();
            for candidate in candidates {
                if block.len() >= quotas.for_class(class) {
                    break;
                }
                if used.insert(&candidate.item.id) {
                    block.push(candidate.to_result(class, options.mood));
                }
            }
            blocks.push(block);
        }

        // Classes that ran short hand their slots back to the similar ranking.
        let selected: usize = blocks.iter().map(Vec::len).sum();
        let mut shortfall = options.count.saturating_sub(selected);
        if shortfall > 0 {
            let similar_block = mix
                .class_order()
                .iter()
                .position(|class| *class == RecommendationClass::Similar)
                .unwrap_or(0);
            for candidate in &similar {
                if shortfall == 0 {
                    break;
                }
                if used.insert(&candidate.item.id) {
                    blocks[similar_block]
                        .push(candidate.to_result(RecommendationClass::Similar, options.mood));
                    shortfall -= 1;
                }
            }
        }

        let mut results = Vec::with_capacity(options.count.min(pool.len()));
        for mut block in blocks {
            block.sort_by(|a, b| by_score_then_id(a.score, b.score, &a.item, &b.item));
            results.extend(block);
        }
        results.truncate(options.count);
        results
    }

    fn similar_candidates<'a>(&self, ranked: &[(&'a CandidateItem, f64)]) -> Vec<Scored<'a>> {
        ranked
            .iter()
            .map(|(item, similarity)| Scored {
                item: *item,
                similarity: *similarity,
                score: *similarity,
            })
            .collect()
    }

    fn explore_candidates<'a>(&self, ranked: &[(&'a CandidateItem, f64)]) -> Vec<Scored<'a>> {
        let mut explore: Vec<Scored<'a>> = ranked
            .iter()
            .filter(|(_, similarity)| {
                *similarity >= EXPLORE_SIMILARITY_FLOOR && *similarity < EXPLORE_SIMILARITY_CEILING
            })
            .map(|(item, similarity)| Scored {
                item: *item,
                similarity: *similarity,
                score: 1.0 - *similarity,
            })
            .collect();
        explore.sort_by(|a, b| by_score_then_id(a.score, b.score, a.item, b.item));
        explore
    }

    fn trending_candidates<'a>(
        &self,
        ranked: &[(&'a CandidateItem, f64)],
        mood: Mood,
    ) -> Vec<Scored<'a>> {
        let mut trending: Vec<Scored<'a>> = ranked
            .iter()
            .filter(|(item, _)| item.popularity > 0.0)
            .map(|(item, similarity)| {
                let score = if mood == Mood::Special {
                    (1.0 - SPECIAL_SIMILARITY_WEIGHT) * item.popularity
                        + SPECIAL_SIMILARITY_WEIGHT * *similarity
                } else {
                    item.popularity
                };
                Scored { item: *item, similarity: *similarity, score }
            })
            .collect();
        trending.sort_by(|a, b| by_score_then_id(a.score, b.score, a.item, b.item));
        trending
    }
}

#[derive(Debug, Clone, Copy)]
struct Scored<'a> {
    item: &'a CandidateItem,
    similarity: f64,
    score: f64,
}

impl Scored<'_> {
    fn to_result(&self, class: RecommendationClass, mood: Mood) -> RecommendationResult {
        let reason = match class {
            RecommendationClass::Explore => EXPLORE_REASON,
            RecommendationClass::Trending if mood == Mood::Special => SPECIAL_REASON,
            RecommendationClass::Trending => TRENDING_REASON,
            _ => similarity_reason(self.similarity),
        };

        RecommendationResult {
            item: self.item.clone(),
            score: self.score,
            class,
            reason: reason.to_owned(),
            similarity_score: self.similarity,
            predicted_rating: predicted_rating(self.similarity),
        }
    }
}
