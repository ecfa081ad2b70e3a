use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::item::CandidateItem;
use crate::errors::DomainError;

/// How a recommendation was produced; drives scoring and the reason text.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationClass {
    Similar,
    Explore,
    Trending,
    Pairing,
    Random,
}

impl RecommendationClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Similar => "similar",
            Self::Explore => "explore",
            Self::Trending => "trending",
            Self::Pairing => "pairing",
            Self::Random => "random",
        }
    }
}

impl FromStr for RecommendationClass {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "similar" => Ok(Self::Similar),
            "explore" => Ok(Self::Explore),
            "trending" => Ok(Self::Trending),
            "pairing" => Ok(Self::Pairing),
            "random" => Ok(Self::Random),
            other => Err(DomainError::InvariantViolation(format!(
                "unknown recommendation class `{other}`"
            ))),
        }
    }
}

/// Caller-selected mixing strategy across the similar/explore/trending classes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mood {
    #[default]
    Usual,
    Adventure,
    Discovery,
    Special,
}

impl Mood {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Usual => "usual",
            Self::Adventure => "adventure",
            Self::Discovery => "discovery",
            Self::Special => "special",
        }
    }
}

impl fmt::Display for Mood {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mood {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "usual" => Ok(Self::Usual),
            "adventure" => Ok(Self::Adventure),
            "discovery" => Ok(Self::Discovery),
            "special" => Ok(Self::Special),
            other => Err(DomainError::InvalidMood(other.to_owned())),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MenuRecommendationType {
    Similarity,
    Pairing,
    Random,
}

impl MenuRecommendationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Similarity => "similarity",
            Self::Pairing => "pairing",
            Self::Random => "random",
        }
    }
}

impl FromStr for MenuRecommendationType {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "similarity" => Ok(Self::Similarity),
            "pairing" => Ok(Self::Pairing),
            "random" => Ok(Self::Random),
            other => Err(DomainError::InvalidRecommendationType(other.to_owned())),
        }
    }
}

/// Dish category used by the pairing heuristics.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DishType {
    Sashimi,
    Tempura,
    Yakitori,
    Nabe,
    Cheese,
    Dessert,
    #[default]
    General,
}

impl DishType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sashimi => "sashimi",
            Self::Tempura => "tempura",
            Self::Yakitori => "yakitori",
            Self::Nabe => "nabe",
            Self::Cheese => "cheese",
            Self::Dessert => "dessert",
            Self::General => "general",
        }
    }
}

impl FromStr for DishType {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "sashimi" | "sushi" | "raw_fish" => Ok(Self::Sashimi),
            "tempura" | "fried" => Ok(Self::Tempura),
            "yakitori" | "grilled" => Ok(Self::Yakitori),
            "nabe" | "hot_pot" | "simmered" => Ok(Self::Nabe),
            "cheese" => Ok(Self::Cheese),
            "dessert" | "sweets" => Ok(Self::Dessert),
            "general" | "" => Ok(Self::General),
            other => Err(DomainError::InvalidDishType(other.to_owned())),
        }
    }
}

/// A single ranked, explained recommendation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RecommendationResult {
    pub item: CandidateItem,
    pub score: f64,
    pub class: RecommendationClass,
    pub reason: String,
    /// Similarity to the user's preference vector, `[0, 1]`.
    pub similarity_score: f64,
    /// Expected rating on a 1-5 scale derived from `similarity_score`.
    pub predicted_rating: f64,
}

/// What the caller receives from a recommendation request.
///
/// `RequiresMoreFavorites` is guidance for the user, distinct from an empty
/// list of recommendations.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RecommendationOutcome {
    Recommendations { results: Vec<RecommendationResult> },
    RequiresMoreFavorites { message: String, favorites_count: usize, required: usize },
}

impl RecommendationOutcome {
    pub fn requires_more_favorites(&self) -> bool {
        matches!(self, Self::RequiresMoreFavorites { .. })
    }

    pub fn results(&self) -> &[RecommendationResult] {
        match self {
            Self::Recommendations { results } => results,
            Self::RequiresMoreFavorites { .. } => &[],
        }
    }

    pub fn message(&self) -> Option<&str> {
        match self {
            Self::Recommendations { .. } => None,
            Self::RequiresMoreFavorites { message, .. } => Some(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mood_rejects_unknown_values() {
        assert_eq!("Discovery".parse::<Mood>().expect("mood"), Mood::Discovery);
        assert_eq!(
            "party".parse::<Mood>().expect_err("invalid mood"),
            DomainError::InvalidMood("party".to_owned())
        );
    }

    #[test]
    fn menu_type_rejects_unknown_values() {
        assert!(matches!(
            "roulette".parse::<MenuRecommendationType>(),
            Err(DomainError::InvalidRecommendationType(_))
        ));
    }

    #[test]
    fn dish_aliases_resolve() {
        assert_eq!("sushi".parse::<DishType>().expect("dish"), DishType::Sashimi);
        assert_eq!("grilled".parse::<DishType>().expect("dish"), DishType::Yakitori);
        assert!("pizza".parse::<DishType>().is_err());
    }

    #[test]
    fn requires_more_favorites_serializes_with_status_tag() {
        let outcome = RecommendationOutcome::RequiresMoreFavorites {
            message: "save more".to_owned(),
            favorites_count: 1,
            required: 3,
        };
        let json = serde_json::to_value(&outcome).expect("serialize");
        assert_eq!(json["status"], "requires_more_favorites");
        assert!(outcome.results().is_empty());
        assert_eq!(outcome.message(), Some("save more"));
    }
}
