//! Recommendations restricted to a venue's menu

use rand::seq::SliceRandom;
use rand::Rng;

use super::composer::{ComposeOptions, RecommendationComposer};
use super::similarity::{by_score_then_id, predicted_rating};
use super::{DEFAULT_MIN_FAVORITES, RANDOM_PICK_REASONS, SAFE_PICK_BAND, SAFE_PICK_BONUS};
use crate::domain::item::CandidateItem;
use crate::domain::preference::Preference;
use crate::domain::recommendation::{
    DishType, MenuRecommendationType, Mood, RecommendationClass, RecommendationOutcome,
    RecommendationResult,
};
use crate::domain::taste::TasteVector;
use crate::errors::DomainError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MenuOptions {
    pub recommendation_type: MenuRecommendationType,
    pub dish_type: Option<DishType>,
    pub count: usize,
    /// Class mix used by the similarity type
    pub mood: Mood,
}

impl MenuOptions {
    pub fn new(recommendation_type: MenuRecommendationType) -> Self {
        Self {
            recommendation_type,
            dish_type: None,
            count: super::DEFAULT_MENU_COUNT,
            mood: Mood::Usual,
        }
    }

    pub fn with_dish_type(mut self, dish_type: DishType) -> Self {
        self.dish_type = Some(dish_type);
        self
    }

    pub fn with_count(mut self, count: usize) -> Self {
        self.count = count;
        self
    }
}

#[derive(Debug, Clone)]
pub struct MenuRestrictedComposer {
    composer: RecommendationComposer,
    min_favorites: usize,
}

impl Default for MenuRestrictedComposer {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_FAVORITES)
    }
}

impl MenuRestrictedComposer {
    pub fn new(min_favorites: usize) -> Self {
        Self { composer: RecommendationComposer::new(), min_favorites }
    }

    /// Recommends from `menu` only. An empty menu is an error for every type.
    pub fn compose_for_menu<R: Rng + ?Sized>(
        &self,
        preference: Option<&Preference>,
        menu: &[CandidateItem],
        options: &MenuOptions,
        rng: &mut R,
    ) -> Result<RecommendationOutcome, DomainError> {
        if menu.is_empty() {
            return Err(DomainError::EmptyMenu);
        }

        let results = match options.recommendation_type {
            MenuRecommendationType::Similarity => {
                let preference = match preference {
                    Some(preference) if preference.sample_size >= self.min_favorites => preference,
                    other => {
                        return Ok(self.requires_more_favorites(
                            other.map(|preference| preference.sample_size).unwrap_or(0),
                        ))
                    }
                };
                self.composer.compose(
                    preference,
                    menu,
                    ComposeOptions { count: options.count, mood: options.mood },
                )
            }
            MenuRecommendationType::Pairing => self.pairing(
                preference,
                menu,
                options.dish_type.unwrap_or_default(),
                options.count,
            ),
            MenuRecommendationType::Random => vec![self.random_pick(preference, menu, rng)?],
        };

        Ok(RecommendationOutcome::Recommendations { results })
    }

    fn requires_more_favorites(&self, favorites_count: usize) -> RecommendationOutcome {
        RecommendationOutcome::RequiresMoreFavorites {
            message: format!(
                "Save at least {} favorite sake to get picks from this menu that match your taste",
                self.min_favorites
            ),
            favorites_count,
            required: self.min_favorites,
        }
    }

    fn pairing(
        &self,
        preference: Option<&Preference>,
        menu: &[CandidateItem],
        dish_type: DishType,
        count: usize,
    ) -> Vec<RecommendationResult> {
        let reference = reference_vector(preference);
        let mut scored: Vec<(&CandidateItem, f64)> =
            menu.iter().map(|item| (item, pairing_score(dish_type, &item.taste))).collect();
        scored.sort_by(|a, b| by_score_then_id(a.1, b.1, a.0, b.0));
        scored.truncate(count);

        scored
            .into_iter()
            .map(|(item, score)| {
                let similarity = self.composer.scorer().similarity(&reference, &item.taste);
                RecommendationResult {
                    item: item.clone(),
                    score,
                    class: RecommendationClass::Pairing,
                    reason: pairing_reason(dish_type).to_owned(),
                    similarity_score: similarity,
                    predicted_rating: predicted_rating(similarity),
                }
            })
            .collect()
    }

    fn random_pick<R: Rng + ?Sized>(
        &self,
        preference: Option<&Preference>,
        menu: &[CandidateItem],
        rng: &mut R,
    ) -> Result<RecommendationResult, DomainError> {
        let mut best: Option<(&CandidateItem, f64)> = None;
        for item in menu {
            let mut weight: f64 = rng.gen();
            if item.taste.is_balanced_profile(SAFE_PICK_BAND) {
                weight += SAFE_PICK_BONUS;
            }
            if best.map(|(_, best_weight)| weight > best_weight).unwrap_or(true) {
                best = Some((item, weight));
            }
        }

        let (item, weight) = best.ok_or(DomainError::EmptyMenu)?;
        let reason = RANDOM_PICK_REASONS.choose(rng).copied().unwrap_or(RANDOM_PICK_REASONS[0]);
        let similarity =
            self.composer.scorer().similarity(&reference_vector(preference), &item.taste);

        Ok(RecommendationResult {
            item: item.clone(),
            score: weight,
            class: RecommendationClass::Random,
            reason: reason.to_owned(),
            similarity_score: similarity,
            predicted_rating: predicted_rating(similarity),
        })
    }
}

fn reference_vector(preference: Option<&Preference>) -> TasteVector {
    preference.map(|preference| preference.vector).unwrap_or(TasteVector::NEUTRAL)
}

/// Maps `[-5, 5]` onto `[0, 1]`.
fn unit(value: f64) -> f64 {
    ((value + 5.0) / 10.0).clamp(0.0, 1.0)
}

/// Dish-specific pairing fit in `[0, 1]`.
pub fn pairing_score(dish_type: DishType, taste: &TasteVector) -> f64 {
    let score = match dish_type {
        // Raw fish wants a lean, clean sake.
        DishType::Sashimi => 0.4 * taste.light + 0.3 * (1.0 - unit(taste.richness)) + 0.3 * taste.dry,
        DishType::Tempura => 0.5 * taste.dry + 0.3 * taste.light + 0.2 * (1.0 - taste.heavy),
        DishType::Yakitori => {
            0.4 * unit(taste.richness) + 0.35 * taste.heavy + 0.25 * taste.mellow
        }
        DishType::Nabe => 0.4 * taste.mellow + 0.35 * taste.mild + 0.25 * unit(taste.richness),
        DishType::Cheese => {
            0.4 * taste.heavy + 0.3 * unit(taste.richness) + 0.3 * unit(taste.sweetness)
        }
        DishType::Dessert => 0.5 * unit(taste.sweetness) + 0.3 * taste.floral + 0.2 * taste.mellow,
        DishType::General => {
            0.4 * taste.mild + 0.3 * taste.mellow + 0.3 * (1.0 - taste.sweetness.abs() / 5.0)
        }
    };
    score.clamp(0.0, 1.0)
}

pub fn pairing_reason(dish_type: DishType) -> &'static str {
    match dish_type {
        DishType::Sashimi => "Clean and light, it lets the delicate flavor of raw fish shine",
        DishType::Tempura => "Crisp dryness cuts through the richness of fried batter",
        DishType::Yakitori => "Full body stands up to smoky, savory grilled flavors",
        DishType::Nabe => "Mellow and gentle, it warms up alongside simmered dishes",
        DishType::Cheese => "Deep umami pairs well with aged, creamy cheese",
        DishType::Dessert => "Sweet, fragrant notes round off a dessert",
        DishType::General => "An easy-going sake that suits most dishes",
    }
}
