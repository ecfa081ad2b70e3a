use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use toml::Value;

use crate::commands::{load_config, CommandResult};

#[derive(Debug, Serialize)]
struct ConfigField {
    key: &'static str,
    value: String,
    source: String,
}

pub fn run() -> CommandResult {
    let config = match load_config("config") {
        Ok(config) => config,
        Err(failure) => return failure,
    };

    let config_file_path = detect_config_path();
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());
    let field = |key: &'static str, value: String, env_keys: &[&str]| ConfigField {
        key,
        value,
        source: field_source(key, env_keys, config_file_doc.as_ref(), config_file_path.as_deref()),
    };

    let fields = vec![
        field("database.url", config.database.url.clone(), &["KIKIZAKE_DATABASE_URL"]),
        field(
            "database.max_connections",
            config.database.max_connections.to_string(),
            &["KIKIZAKE_DATABASE_MAX_CONNECTIONS"],
        ),
        field(
            "database.timeout_secs",
            config.database.timeout_secs.to_string(),
            &["KIKIZAKE_DATABASE_TIMEOUT_SECS"],
        ),
        field(
            "recommendation.max_items",
            config.recommendation.max_items.to_string(),
            &["KIKIZAKE_RECOMMENDATION_MAX_ITEMS"],
        ),
        field(
            "recommendation.half_life_days",
            config.recommendation.half_life_days.to_string(),
            &["KIKIZAKE_RECOMMENDATION_HALF_LIFE_DAYS"],
        ),
        field(
            "recommendation.min_favorites",
            config.recommendation.min_favorites.to_string(),
            &["KIKIZAKE_RECOMMENDATION_MIN_FAVORITES"],
        ),
        field(
            "recommendation.default_count",
            config.recommendation.default_count.to_string(),
            &["KIKIZAKE_RECOMMENDATION_DEFAULT_COUNT"],
        ),
        field(
            "cache.recommendation_ttl_hours",
            config.cache.recommendation_ttl_hours.to_string(),
            &["KIKIZAKE_CACHE_RECOMMENDATION_TTL_HOURS"],
        ),
        field(
            "cache.catalog_ttl_minutes",
            config.cache.catalog_ttl_minutes.to_string(),
            &["KIKIZAKE_CACHE_CATALOG_TTL_MINUTES"],
        ),
        field(
            "logging.level",
            config.logging.level.clone(),
            &["KIKIZAKE_LOGGING_LEVEL", "KIKIZAKE_LOG_LEVEL"],
        ),
        field(
            "logging.format",
            format!("{:?}", config.logging.format).to_ascii_lowercase(),
            &["KIKIZAKE_LOGGING_FORMAT", "KIKIZAKE_LOG_FORMAT"],
        ),
    ];

    CommandResult::success_with_data(
        "config",
        "effective config (source precedence: env > file > default)",
        &fields,
    )
}

fn detect_config_path() -> Option<PathBuf> {
    [PathBuf::from("kikizake.toml"), PathBuf::from("config/kikizake.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let raw = fs::read_to_string(path?).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_keys: &[&str],
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some(env_key) = env_keys.iter().find(|key| env::var_os(key).is_some()) {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::{contains_path, field_source};

    #[test]
    fn file_source_is_reported_for_nested_keys() {
        let doc: toml::Value = "[cache]\nrecommendation_ttl_hours = 6\n".parse().expect("toml");

        assert!(contains_path(&doc, "cache.recommendation_ttl_hours"));
        assert!(!contains_path(&doc, "cache.catalog_ttl_minutes"));
        assert_eq!(
            field_source(
                "cache.recommendation_ttl_hours",
                &["KIKIZAKE_TEST_UNSET_VARIABLE"],
                Some(&doc),
                Some(Path::new("kikizake.toml")),
            ),
            "file (kikizake.toml)"
        );
        assert_eq!(
            field_source("cache.catalog_ttl_minutes", &[], Some(&doc), None),
            "default"
        );
    }
}
