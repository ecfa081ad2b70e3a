use kikizake_core::domain::item::UserId;
use kikizake_core::domain::recommendation::{Mood, RecommendationOutcome};
use kikizake_core::errors::{ApplicationError, DomainError};
use kikizake_core::recommend::MAX_RECOMMENDATION_COUNT;

use crate::commands::{with_service, CommandResult};

#[derive(Debug, Clone)]
pub struct RecommendArgs {
    pub user: String,
    pub mood: String,
    pub count: Option<usize>,
}

pub fn run(args: &RecommendArgs) -> CommandResult {
    let mood = match args.mood.parse::<Mood>() {
        Ok(mood) => mood,
        Err(error) => {
            return CommandResult::from_application_error("recommend", ApplicationError::from(error));
        }
    };
    if let Err(error) = check_count(args.count) {
        return CommandResult::from_application_error("recommend", ApplicationError::from(error));
    }

    let user_id = UserId::from(args.user.as_str());
    let count = args.count;
    let result = with_service("recommend", |service| async move {
        service.recommend(&user_id, mood, count).await
    });

    match result {
        Ok(outcome) => render("recommend", &outcome),
        Err(failure) => failure,
    }
}

/// `--count` must fall in `1..=MAX_RECOMMENDATION_COUNT` when given.
pub(crate) fn check_count(count: Option<usize>) -> Result<(), DomainError> {
    match count {
        Some(count) if !(1..=MAX_RECOMMENDATION_COUNT).contains(&count) => {
            Err(DomainError::InvariantViolation(format!(
                "--count must be in range 1..={MAX_RECOMMENDATION_COUNT}, got {count}"
            )))
        }
        _ => Ok(()),
    }
}

pub(crate) fn render(command: &str, outcome: &RecommendationOutcome) -> CommandResult {
    let message = match outcome {
        RecommendationOutcome::Recommendations { results } => {
            format!("{} recommendations", results.len())
        }
        RecommendationOutcome::RequiresMoreFavorites { message, .. } => message.clone(),
    };
    CommandResult::success_with_data(command, message, outcome)
}

#[cfg(test)]
mod tests {
    use super::check_count;

    #[test]
    fn count_bounds_are_inclusive() {
        assert!(check_count(None).is_ok());
        assert!(check_count(Some(1)).is_ok());
        assert!(check_count(Some(100)).is_ok());
        assert!(check_count(Some(0)).is_err());
        assert!(check_count(Some(101)).is_err());
        assert!(check_count(Some(usize::MAX)).is_err());
    }
}
