//! Sake recommendation engine
//!
//! Scores catalog items against a user's preference vector, mixes result
//! classes by mood, restricts picks to a venue menu and caches per-user
//! result lists with a time-to-live.

pub mod cache;
pub mod catalog;
pub mod composer;
pub mod favorites;
pub mod menu;
pub mod service;
pub mod similarity;

pub use cache::{CacheEntry, RecommendationCache, RecommendationCacheStore};
pub use catalog::{CatalogCache, CatalogSource};
pub use composer::{ClassQuotas, ComposeOptions, MoodMix, RecommendationComposer};
pub use favorites::{FavoritesSnapshot, PendingChange, PendingOperation};
pub use menu::{pairing_reason, pairing_score, MenuOptions, MenuRestrictedComposer};
pub use service::{RecommendationService, SavedItemStore, ServiceOptions};
pub use similarity::{predicted_rating, similarity_reason, SimilarityScorer};

/// Results returned when the caller does not ask for a count
pub const DEFAULT_RECOMMENDATION_COUNT: usize = 10;

/// Largest count a caller may ask for
pub const MAX_RECOMMENDATION_COUNT: usize = 100;

/// Results returned for a menu request without a count
pub const DEFAULT_MENU_COUNT: usize = 5;

/// Saved items needed before similarity picks are personal
pub const DEFAULT_MIN_FAVORITES: usize = 3;

/// Explore candidates are neither near-duplicates nor strangers.
pub const EXPLORE_SIMILARITY_FLOOR: f64 = 0.15;
pub const EXPLORE_SIMILARITY_CEILING: f64 = 0.5;

/// Weight of taste fit in the special-occasion trending score
pub const SPECIAL_SIMILARITY_WEIGHT: f64 = 0.5;

pub const EXPLORE_REASON: &str = "Something new to broaden your palate";
pub const TRENDING_REASON: &str = "Popular with sake lovers right now";
pub const SPECIAL_REASON: &str = "A highly rated bottle worthy of a special occasion";

/// Bipolar band inside which a sake counts as an easy, safe pick
pub const SAFE_PICK_BAND: f64 = 2.0;
pub const SAFE_PICK_BONUS: f64 = 0.5;

pub const RANDOM_PICK_REASONS: &[&str] = &[
    "Fate has chosen this one for you!",
    "Today's lucky sake. Trust the dice!",
    "A surprise pick to liven up the table",
    "Let serendipity pour your next glass",
    "Close your eyes and order this one",
];

/// Cached recommendation lists live this long (default: 12 hours)
pub const DEFAULT_RECOMMENDATION_TTL_HOURS: i64 = 12;

/// Catalog snapshots are reused this long (default: 30 minutes)
pub const DEFAULT_CATALOG_TTL_MINUTES: i64 = 30;
