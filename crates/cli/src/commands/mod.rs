pub mod config;
pub mod menu;
pub mod migrate;
pub mod profile;
pub mod recommend;
pub mod seed;

use std::sync::Arc;

use kikizake_core::config::{AppConfig, LoadOptions};
use kikizake_core::errors::{ApplicationError, InterfaceError};
use kikizake_core::{RecommendationService, ServiceOptions, SystemClock};
use kikizake_db::repositories::{
    SqlCatalogRepository, SqlRecommendationCacheRepository, SqlSavedItemRepository,
};
use kikizake_db::{connect_with_config, migrations, DbPool};
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Clone)]
pub struct CommandResult {
    pub exit_code: u8,
    pub output: String,
}

#[derive(Debug, Serialize)]
struct CommandOutcome {
    command: String,
    status: String,
    error_class: Option<String>,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    correlation_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<Value>,
}

impl CommandResult {
    pub fn success(command: &str, message: impl Into<String>) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "ok".to_string(),
            error_class: None,
            message: message.into(),
            correlation_id: None,
            data: None,
        };
        Self { exit_code: 0, output: serialize_payload(payload) }
    }

    pub fn success_with_data(
        command: &str,
        message: impl Into<String>,
        data: &impl Serialize,
    ) -> Self {
        let data = match serde_json::to_value(data) {
            Ok(data) => data,
            Err(error) => {
                return Self::failure(command, "serialization", error.to_string(), 9);
            }
        };
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "ok".to_string(),
            error_class: None,
            message: message.into(),
            correlation_id: None,
            data: Some(data),
        };
        Self { exit_code: 0, output: serialize_payload(payload) }
    }

    pub fn failure(
        command: &str,
        error_class: &str,
        message: impl Into<String>,
        exit_code: u8,
    ) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "error".to_string(),
            error_class: Some(error_class.to_string()),
            message: message.into(),
            correlation_id: None,
            data: None,
        };
        Self { exit_code, output: serialize_payload(payload) }
    }

    /// Maps a service error onto the interface taxonomy under a fresh correlation id.
    pub fn from_application_error(command: &str, error: ApplicationError) -> Self {
        let correlation_id = uuid::Uuid::new_v4().to_string();
        let interface = error.into_interface(correlation_id.clone());
        tracing::warn!(
            event_name = "cli.command_failed",
            command,
            correlation_id = %correlation_id,
            error = %interface,
            "command failed"
        );

        let (error_class, exit_code) = match &interface {
            InterfaceError::BadRequest { .. } => ("bad_request", 7),
            InterfaceError::ServiceUnavailable { .. } => ("service_unavailable", 8),
            InterfaceError::Internal { .. } => ("internal", 9),
        };
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "error".to_string(),
            error_class: Some(error_class.to_string()),
            message: format!("{} ({interface})", interface.user_message()),
            correlation_id: Some(correlation_id),
            data: None,
        };
        Self { exit_code, output: serialize_payload(payload) }
    }
}

fn serialize_payload(payload: CommandOutcome) -> String {
    serde_json::to_string(&payload).unwrap_or_else(|error| {
        format!(
            "{{\"command\":\"unknown\",\"status\":\"error\",\"error_class\":\"serialization\",\"message\":\"{}\"}}",
            error.to_string().replace('\\', "\\\\").replace('"', "\\\"")
        )
    })
}

/// Failure carried out of an async block: `(error_class, message, exit_code)`.
pub(crate) type Failure = (&'static str, String, u8);

pub(crate) fn load_config(command: &str) -> Result<AppConfig, CommandResult> {
    AppConfig::load(LoadOptions::default()).map_err(|error| {
        CommandResult::failure(command, "config_validation", format!("configuration issue: {error}"), 2)
    })
}

pub(crate) fn build_runtime(command: &str) -> Result<tokio::runtime::Runtime, CommandResult> {
    tokio::runtime::Builder::new_current_thread().enable_all().build().map_err(|error| {
        CommandResult::failure(
            command,
            "runtime_init",
            format!("failed to initialize async runtime: {error}"),
            3,
        )
    })
}

/// Connects and applies pending migrations.
pub(crate) async fn open_pool(config: &AppConfig) -> Result<DbPool, Failure> {
    let pool = connect_with_config(&config.database)
        .await
        .map_err(|error| ("db_connectivity", error.to_string(), 4u8))?;
    migrations::run_pending(&pool).await.map_err(|error| ("migration", error.to_string(), 5u8))?;
    Ok(pool)
}

pub(crate) fn build_service(pool: &DbPool, config: &AppConfig) -> RecommendationService {
    RecommendationService::new(
        Arc::new(SqlSavedItemRepository::new(pool.clone())),
        Arc::new(SqlCatalogRepository::new(pool.clone())),
        Arc::new(SqlRecommendationCacheRepository::new(pool.clone())),
        Arc::new(SystemClock),
        ServiceOptions::from_config(config),
    )
}

/// Outcome of a service-backed command before it is rendered.
pub(crate) enum ServiceRun<T> {
    Done(T),
    Setup(Failure),
    Service(ApplicationError),
}

/// Runs `body` against a migrated pool and a service built from config.
pub(crate) fn with_service<T, F, Fut>(command: &str, body: F) -> Result<T, CommandResult>
where
    F: FnOnce(RecommendationService) -> Fut,
    Fut: std::future::Future<Output = Result<T, ApplicationError>>,
{
    let config = load_config(command)?;
    let runtime = build_runtime(command)?;

    let run = runtime.block_on(async {
        let pool = match open_pool(&config).await {
            Ok(pool) => pool,
            Err(failure) => return ServiceRun::Setup(failure),
        };
        let service = build_service(&pool, &config);
        let result = body(service).await;
        pool.close().await;
        match result {
            Ok(value) => ServiceRun::Done(value),
            Err(error) => ServiceRun::Service(error),
        }
    });

    match run {
        ServiceRun::Done(value) => Ok(value),
        ServiceRun::Setup((error_class, message, exit_code)) => {
            Err(CommandResult::failure(command, error_class, message, exit_code))
        }
        ServiceRun::Service(error) => Err(CommandResult::from_application_error(command, error)),
    }
}
