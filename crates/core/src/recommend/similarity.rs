//! Similarity between a preference vector and a candidate sake

use std::cmp::Ordering;

use crate::domain::item::CandidateItem;
use crate::domain::taste::TasteVector;

/// Inverse-distance similarity in `[0, 1]`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimilarityScorer;

impl SimilarityScorer {
    pub fn new() -> Self {
        Self
    }

    /// `1 / (1 + distance)`: exactly 1.0 at zero distance, strictly decreasing
    /// as the eight-dimensional distance grows.
    pub fn similarity(&self, preference: &TasteVector, candidate: &TasteVector) -> f64 {
        let distance = preference.distance(candidate);
        if !distance.is_finite() {
            return 0.0;
        }
        (1.0 / (1.0 + distance)).clamp(0.0, 1.0)
    }

    /// Scores every candidate and sorts by similarity descending, id ascending.
    pub fn rank<'a>(
        &self,
        preference: &TasteVector,
        candidates: &'a [CandidateItem],
    ) -> Vec<(&'a CandidateItem, f64)> {
        let mut scored: Vec<(&CandidateItem, f64)> = candidates
            .iter()
            .map(|candidate| (candidate, self.similarity(preference, &candidate.taste)))
            .collect();
        scored.sort_by(|a, b| by_score_then_id(a.1, b.1, a.0, b.0));
        scored
    }
}

/// Expected rating on a 1-5 scale.
pub fn predicted_rating(similarity: f64) -> f64 {
    (1.0 + 4.0 * similarity.clamp(0.0, 1.0)).clamp(1.0, 5.0)
}

/// Human-readable justification banded on similarity.
pub fn similarity_reason(similarity: f64) -> &'static str {
    if similarity > 0.9 {
        "A near-perfect match for your taste"
    } else if similarity > 0.8 {
        "Very close to the sake you love"
    } else if similarity > 0.7 {
        "Close to your usual style"
    } else if similarity > 0.6 {
        "Shares several traits with your favorites"
    } else {
        "A little different from your usual picks"
    }
}

/// Descending score, then ascending item id for a stable order across runs.
pub(crate) fn by_score_then_id(
    left_score: f64,
    right_score: f64,
    left: &CandidateItem,
    right: &CandidateItem,
) -> Ordering {
    right_score.total_cmp(&left_score).then_with(|| left.id.cmp(&right.id))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vector(sweetness: f64, richness: f64) -> TasteVector {
        TasteVector::new(sweetness, richness, 0.5, 0.5, 0.5, 0.5, 0.5, 0.5)
    }

    #[test]
    fn identical_vectors_score_one() {
        let scorer = SimilarityScorer::new();
        assert_eq!(scorer.similarity(&vector(1.0, 1.0), &vector(1.0, 1.0)), 1.0);
    }

    #[test]
    fn similarity_decreases_with_distance() {
        let scorer = SimilarityScorer::new();
        let origin = vector(0.0, 0.0);
        let near = scorer.similarity(&origin, &vector(0.5, 0.0));
        let far = scorer.similarity(&origin, &vector(3.0, 0.0));
        let farthest = scorer.similarity(&vector(-5.0, -5.0), &vector(5.0, 5.0));

        assert!(near < 1.0);
        assert!(far < near);
        assert!(farthest < far);
        assert!(farthest > 0.0);
        assert!((near - 1.0 / 1.5).abs() < 1e-12);
    }

    #[test]
    fn predicted_rating_stays_on_five_point_scale() {
        assert_eq!(predicted_rating(0.0), 1.0);
        assert_eq!(predicted_rating(1.0), 5.0);
        assert_eq!(predicted_rating(0.5), 3.0);
        assert_eq!(predicted_rating(7.0), 5.0);
        assert_eq!(predicted_rating(-1.0), 1.0);
    }

    #[test]
    fn reasons_follow_similarity_bands() {
        assert_eq!(similarity_reason(0.95), "A near-perfect match for your taste");
        assert_eq!(similarity_reason(0.85), "Very close to the sake you love");
        assert_eq!(similarity_reason(0.75), "Close to your usual style");
        assert_eq!(similarity_reason(0.65), "Shares several traits with your favorites");
        assert_eq!(similarity_reason(0.6), "A little different from your usual picks");
    }

    #[test]
    fn ties_are_ordered_by_item_id() {
        let candidates = vec![
            CandidateItem::new("b", "B", "X", vector(1.0, 0.0)),
            CandidateItem::new("a", "A", "X", vector(-1.0, 0.0)),
            CandidateItem::new("c", "C", "X", vector(0.0, 0.0)),
        ];

        let ranked = SimilarityScorer::new().rank(&vector(0.0, 0.0), &candidates);
        let ids: Vec<&str> = ranked.iter().map(|(item, _)| item.id.as_str()).collect();
        assert_eq!(ids, vec!["c", "a", "b"]);
    }
}
