use kikizake_db::{DemoSeedDataset, UserSeedInfo};
use serde::Serialize;

use crate::commands::{build_runtime, load_config, open_pool, CommandResult, Failure};

#[derive(Debug, Serialize)]
struct SeedOutput {
    catalog_items: usize,
    users: Vec<SeededUser>,
}

#[derive(Debug, Serialize)]
struct SeededUser {
    user_id: &'static str,
    favorites: usize,
    description: &'static str,
}

impl From<&UserSeedInfo> for SeededUser {
    fn from(info: &UserSeedInfo) -> Self {
        Self { user_id: info.user_id, favorites: info.favorites, description: info.description }
    }
}

pub fn run() -> CommandResult {
    let config = match load_config("seed") {
        Ok(config) => config,
        Err(failure) => return failure,
    };
    let runtime = match build_runtime("seed") {
        Ok(runtime) => runtime,
        Err(failure) => return failure,
    };

    let result = runtime.block_on(async {
        let pool = open_pool(&config).await?;

        let seed_result = DemoSeedDataset::load(&pool)
            .await
            .map_err(|error| ("seed_execution", error.to_string(), 5u8))?;
        let verification = DemoSeedDataset::verify(&pool)
            .await
            .map_err(|error| ("seed_verification", error.to_string(), 6u8))?;

        let run_result: Result<SeedOutput, Failure> = if verification.all_present {
            Ok(SeedOutput {
                catalog_items: seed_result.catalog_items,
                users: seed_result.users_seeded.iter().map(SeededUser::from).collect(),
            })
        } else {
            let failed_checks = failed_checks(&verification.checks);
            Err(("seed_verification", verification_message(&failed_checks), 6u8))
        };

        pool.close().await;
        run_result
    });

    match result {
        Ok(output) => {
            let users = output
                .users
                .iter()
                .map(|user| format!("{} ({} favourites)", user.user_id, user.favorites))
                .collect::<Vec<_>>()
                .join(", ");
            let message = format!(
                "demo dataset loaded: {} catalog items; users: {users}",
                output.catalog_items
            );
            CommandResult::success_with_data("seed", message, &output)
        }
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("seed", error_class, message, exit_code)
        }
    }
}

fn failed_checks(checks: &[(&'static str, bool)]) -> Vec<&'static str> {
    checks.iter().filter_map(|(check, passed)| (!passed).then_some(*check)).collect()
}

fn verification_message(failed_checks: &[&str]) -> String {
    if failed_checks.is_empty() {
        "Some seed data failed to load".to_string()
    } else {
        format!("Seed verification failed for checks: {}", failed_checks.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::{failed_checks, verification_message};

    #[test]
    fn verification_error_message_targets_failed_checks() {
        let checks = [
            ("catalog-items", true),
            ("demo-user-favorite-count", false),
            ("newcomer-favorites", false),
        ];

        assert_eq!(
            verification_message(&failed_checks(&checks)),
            "Seed verification failed for checks: demo-user-favorite-count, newcomer-favorites"
        );
    }

    #[test]
    fn verification_error_message_falls_back_to_generic_when_no_labels() {
        let checks = [("catalog-items", true), ("catalog-trending-signal", true)];

        assert_eq!(verification_message(&failed_checks(&checks)), "Some seed data failed to load");
    }
}
