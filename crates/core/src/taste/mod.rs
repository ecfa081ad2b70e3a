//! Taste modeling
//!
//! Turns a user's saved sake into a recency-weighted taste vector, a taste
//! archetype, and diversity/adventure scores.

mod builder;
mod classifier;
mod diversity;
mod profiler;

pub use builder::{decay_weight, BuilderOptions, PreferenceVectorBuilder};
pub use classifier::{population_std_dev, TasteTypeClassifier};
pub use diversity::{DiversityAdventureScorer, DiversityScores};
pub use profiler::PreferenceProfiler;

/// Default number of most recent saved items folded into a preference
pub const DEFAULT_MAX_ITEMS: usize = 50;

/// Default decay constant (days) for recency weighting
pub const DEFAULT_HALF_LIFE_DAYS: f64 = 30.0;

/// Flavor spread below which a profile counts as balanced
pub const BALANCED_STD_DEV_THRESHOLD: f64 = 0.15;

/// Average pairwise distance that maps to a diversity of 1.0
pub const DIVERSITY_DISTANCE_CEILING: f64 = 5.0;

/// Number of distinct breweries that saturates the brewery-diversity signal
pub const BREWERY_DIVERSITY_CEILING: f64 = 10.0;

pub const ADVENTURE_BREWERY_WEIGHT: f64 = 0.4;
pub const ADVENTURE_DIVERSITY_WEIGHT: f64 = 0.6;
