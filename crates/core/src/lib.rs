pub mod clock;
pub mod config;
pub mod domain;
pub mod errors;
pub mod recommend;
pub mod taste;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{AppConfig, ConfigError, ConfigOverrides, LoadOptions, LogFormat};
pub use domain::item::{CandidateItem, ItemId, SavedItem, UserId};
pub use domain::preference::Preference;
pub use domain::recommendation::{
    DishType, MenuRecommendationType, Mood, RecommendationClass, RecommendationOutcome,
    RecommendationResult,
};
pub use domain::taste::{FlavorDimension, TasteType, TasteVector};
pub use errors::{ApplicationError, DomainError, InterfaceError};
pub use recommend::{
    CacheEntry, CatalogCache, CatalogSource, ComposeOptions, FavoritesSnapshot, MenuOptions,
    MenuRestrictedComposer, PendingChange, PendingOperation, RecommendationCache,
    RecommendationCacheStore, RecommendationComposer, RecommendationService, SavedItemStore,
    ServiceOptions, SimilarityScorer,
};
pub use taste::{
    BuilderOptions, DiversityAdventureScorer, DiversityScores, PreferenceProfiler,
    PreferenceVectorBuilder, TasteTypeClassifier,
};
