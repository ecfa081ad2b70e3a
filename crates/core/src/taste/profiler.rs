use chrono::{DateTime, Utc};

use super::builder::{BuilderOptions, PreferenceVectorBuilder};
use super::classifier::TasteTypeClassifier;
use super::diversity::DiversityAdventureScorer;
use crate::domain::item::SavedItem;
use crate::domain::preference::Preference;

/// Runs the builder, classifier and diversity scorer over one saved-item set.
#[derive(Debug, Clone, Default)]
pub struct PreferenceProfiler {
    builder: PreferenceVectorBuilder,
    classifier: TasteTypeClassifier,
    scorer: DiversityAdventureScorer,
}

impl PreferenceProfiler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: BuilderOptions) -> Self {
        Self {
            builder: PreferenceVectorBuilder::with_options(options),
            classifier: TasteTypeClassifier::new(),
            scorer: DiversityAdventureScorer::new(),
        }
    }

    pub fn profile(&self, saved_items: &[SavedItem], now: DateTime<Utc>) -> Preference {
        let vector = self.builder.build(saved_items, now);
        let taste_type = self.classifier.classify(&vector);
        let sample = self.builder.recent_sample(saved_items);
        let scores = self.scorer.score(sample.iter().map(|saved| &saved.item));

        Preference {
            vector,
            taste_type,
            diversity_score: scores.diversity,
            adventure_score: scores.adventure,
            sample_size: saved_items.len(),
            computed_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};

    use super::*;
    use crate::domain::item::{CandidateItem, UserId};
    use crate::domain::taste::{TasteType, TasteVector};

    #[test]
    fn profile_combines_all_components() {
        let now = Utc.with_ymd_and_hms(2026, 5, 1, 0, 0, 0).single().expect("valid timestamp");
        let user = UserId("u-1".to_owned());
        let floral = TasteVector::new(1.0, -1.0, 0.9, 0.3, 0.1, 0.4, 0.2, 0.5);
        let saved_items: Vec<SavedItem> = ["Dassai", "Kokuryu", "Hakkaisan"]
            .iter()
            .enumerate()
            .map(|(index, producer)| {
                SavedItem::new(
                    user.clone(),
                    CandidateItem::new(format!("s{index}"), format!("Sake {index}"), *producer, floral),
                    now - Duration::days(index as i64),
                )
            })
            .collect();

        let preference = PreferenceProfiler::new().profile(&saved_items, now);

        assert_eq!(preference.taste_type, TasteType::Floral);
        assert_eq!(preference.sample_size, 3);
        assert_eq!(preference.diversity_score, 0.0);
        assert!((preference.adventure_score - 0.4 * 0.3).abs() < 1e-12);
        assert_eq!(preference.computed_at, now);
        assert!(!preference.is_low_confidence(3));
    }

    #[test]
    fn empty_profile_is_neutral_and_low_confidence() {
        let now = Utc.with_ymd_and_hms(2026, 5, 1, 0, 0, 0).single().expect("valid timestamp");
        let preference = PreferenceProfiler::new().profile(&[], now);

        assert_eq!(preference.vector, TasteVector::NEUTRAL);
        assert_eq!(preference.taste_type, TasteType::Balanced);
        assert_eq!(preference.adventure_score, 0.0);
        assert!(preference.is_low_confidence(3));
    }
}
