use kikizake_core::domain::item::UserId;
use kikizake_core::domain::preference::Preference;
use serde::Serialize;

use crate::commands::{with_service, CommandResult};

#[derive(Debug, Serialize)]
struct ProfileOutput {
    user_id: String,
    taste_description: &'static str,
    low_confidence: bool,
    #[serde(flatten)]
    preference: Preference,
}

pub fn run(user: &str) -> CommandResult {
    let user_id = UserId::from(user);
    let result = with_service("profile", |service| async move {
        let preference = service.profile(&user_id).await?;
        let low_confidence = preference.is_low_confidence(service.options().min_favorites);
        Ok(ProfileOutput {
            user_id: user_id.0,
            taste_description: preference.taste_type.description(),
            low_confidence,
            preference,
        })
    });

    match result {
        Ok(output) => {
            let message = format!(
                "{} favourites profiled as {}",
                output.preference.sample_size,
                output.preference.taste_type.as_str()
            );
            CommandResult::success_with_data("profile", message, &output)
        }
        Err(failure) => failure,
    }
}
