use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::errors::ApplicationError;
use crate::recommend::MAX_RECOMMENDATION_COUNT;

#[derive(Clone, Debug, Serialize)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub recommendation: RecommendationConfig,
    pub cache: CacheConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug, Serialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug, Serialize)]
pub struct RecommendationConfig {
    /// Most recent saved items folded into the preference vector
    pub max_items: usize,
    pub half_life_days: f64,
    /// Saved items required before personal recommendations are served
    pub min_favorites: usize,
    pub default_count: usize,
}

#[derive(Clone, Debug, Serialize)]
pub struct CacheConfig {
    pub recommendation_ttl_hours: i64,
    pub catalog_ttl_minutes: i64,
}

#[derive(Clone, Debug, Serialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub database_url: Option<String>,
    pub log_level: Option<String>,
    pub log_format: Option<LogFormat>,
    pub min_favorites: Option<usize>,
    pub default_count: Option<usize>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl From<ConfigError> for ApplicationError {
    fn from(value: ConfigError) -> Self {
        Self::Configuration(value.to_string())
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                url: "sqlite://kikizake.db?mode=rwc".to_string(),
                max_connections: 5,
                timeout_secs: 30,
            },
            recommendation: RecommendationConfig {
                max_items: crate::taste::DEFAULT_MAX_ITEMS,
                half_life_days: crate::taste::DEFAULT_HALF_LIFE_DAYS,
                min_favorites: crate::recommend::DEFAULT_MIN_FAVORITES,
                default_count: crate::recommend::DEFAULT_RECOMMENDATION_COUNT,
            },
            cache: CacheConfig {
                recommendation_ttl_hours: crate::recommend::DEFAULT_RECOMMENDATION_TTL_HOURS,
                catalog_ttl_minutes: crate::recommend::DEFAULT_CATALOG_TTL_MINUTES,
            },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("kikizake.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(database) = patch.database {
            if let Some(url) = database.url {
                self.database.url = url;
            }
            if let Some(max_connections) = database.max_connections {
                self.database.max_connections = max_connections;
            }
            if let Some(timeout_secs) = database.timeout_secs {
                self.database.timeout_secs = timeout_secs;
            }
        }

        if let Some(recommendation) = patch.recommendation {
            if let Some(max_items) = recommendation.max_items {
                self.recommendation.max_items = max_items;
            }
            if let Some(half_life_days) = recommendation.half_life_days {
                self.recommendation.half_life_days = half_life_days;
            }
            if let Some(min_favorites) = recommendation.min_favorites {
                self.recommendation.min_favorites = min_favorites;
            }
            if let Some(default_count) = recommendation.default_count {
                self.recommendation.default_count = default_count;
            }
        }

        if let Some(cache) = patch.cache {
            if let Some(hours) = cache.recommendation_ttl_hours {
                self.cache.recommendation_ttl_hours = hours;
            }
            if let Some(minutes) = cache.catalog_ttl_minutes {
                self.cache.catalog_ttl_minutes = minutes;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("KIKIZAKE_DATABASE_URL") {
            self.database.url = value;
        }
        if let Some(value) = read_env("KIKIZAKE_DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = parse_env("KIKIZAKE_DATABASE_MAX_CONNECTIONS", &value)?;
        }
        if let Some(value) = read_env("KIKIZAKE_DATABASE_TIMEOUT_SECS") {
            self.database.timeout_secs = parse_env("KIKIZAKE_DATABASE_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("KIKIZAKE_RECOMMENDATION_MAX_ITEMS") {
            self.recommendation.max_items = parse_env("KIKIZAKE_RECOMMENDATION_MAX_ITEMS", &value)?;
        }
        if let Some(value) = read_env("KIKIZAKE_RECOMMENDATION_HALF_LIFE_DAYS") {
            self.recommendation.half_life_days =
                parse_env("KIKIZAKE_RECOMMENDATION_HALF_LIFE_DAYS", &value)?;
        }
        if let Some(value) = read_env("KIKIZAKE_RECOMMENDATION_MIN_FAVORITES") {
            self.recommendation.min_favorites =
                parse_env("KIKIZAKE_RECOMMENDATION_MIN_FAVORITES", &value)?;
        }
        if let Some(value) = read_env("KIKIZAKE_RECOMMENDATION_DEFAULT_COUNT") {
            self.recommendation.default_count =
                parse_env("KIKIZAKE_RECOMMENDATION_DEFAULT_COUNT", &value)?;
        }

        if let Some(value) = read_env("KIKIZAKE_CACHE_RECOMMENDATION_TTL_HOURS") {
            self.cache.recommendation_ttl_hours =
                parse_env("KIKIZAKE_CACHE_RECOMMENDATION_TTL_HOURS", &value)?;
        }
        if let Some(value) = read_env("KIKIZAKE_CACHE_CATALOG_TTL_MINUTES") {
            self.cache.catalog_ttl_minutes =
                parse_env("KIKIZAKE_CACHE_CATALOG_TTL_MINUTES", &value)?;
        }

        let log_level =
            read_env("KIKIZAKE_LOGGING_LEVEL").or_else(|| read_env("KIKIZAKE_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("KIKIZAKE_LOGGING_FORMAT").or_else(|| read_env("KIKIZAKE_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(database_url) = overrides.database_url {
            self.database.url = database_url;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(log_format) = overrides.log_format {
            self.logging.format = log_format;
        }
        if let Some(min_favorites) = overrides.min_favorites {
            self.recommendation.min_favorites = min_favorites;
        }
        if let Some(default_count) = overrides.default_count {
            self.recommendation.default_count = default_count;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_database(&self.database)?;
        validate_recommendation(&self.recommendation)?;
        validate_cache(&self.cache)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("kikizake.toml"), PathBuf::from("config/kikizake.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_database(database: &DatabaseConfig) -> Result<(), ConfigError> {
    let url = database.url.trim();
    let sqlite_url =
        url.starts_with("sqlite://") || url.starts_with("sqlite::") || url == ":memory:";
    if !sqlite_url {
        return Err(ConfigError::Validation(
            "database.url must be a sqlite URL (`sqlite://...`, `sqlite::...`, or `:memory:`)"
                .to_string(),
        ));
    }

    if database.max_connections == 0 {
        return Err(ConfigError::Validation(
            "database.max_connections must be greater than zero".to_string(),
        ));
    }

    if database.timeout_secs == 0 || database.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "database.timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    Ok(())
}

fn validate_recommendation(recommendation: &RecommendationConfig) -> Result<(), ConfigError> {
    if recommendation.max_items == 0 {
        return Err(ConfigError::Validation(
            "recommendation.max_items must be greater than zero".to_string(),
        ));
    }

    if !recommendation.half_life_days.is_finite() || recommendation.half_life_days <= 0.0 {
        return Err(ConfigError::Validation(
            "recommendation.half_life_days must be a positive number of days".to_string(),
        ));
    }

    if !(1..=MAX_RECOMMENDATION_COUNT).contains(&recommendation.default_count) {
        return Err(ConfigError::Validation(format!(
            "recommendation.default_count must be in range 1..={MAX_RECOMMENDATION_COUNT}"
        )));
    }

    Ok(())
}

fn validate_cache(cache: &CacheConfig) -> Result<(), ConfigError> {
    if cache.recommendation_ttl_hours <= 0 {
        return Err(ConfigError::Validation(
            "cache.recommendation_ttl_hours must be greater than zero".to_string(),
        ));
    }

    if cache.catalog_ttl_minutes <= 0 {
        return Err(ConfigError::Validation(
            "cache.catalog_ttl_minutes must be greater than zero".to_string(),
        ));
    }

    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_env<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse::<T>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    database: Option<DatabasePatch>,
    recommendation: Option<RecommendationPatch>,
    cache: Option<CachePatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct DatabasePatch {
    url: Option<String>,
    max_connections: Option<u32>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct RecommendationPatch {
    max_items: Option<usize>,
    half_life_days: Option<f64>,
    min_favorites: Option<usize>,
    default_count: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
struct CachePatch {
    recommendation_ttl_hours: Option<i64>,
    catalog_ttl_minutes: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}
