use kikizake_core::domain::item::{ItemId, UserId};
use kikizake_core::domain::recommendation::{DishType, MenuRecommendationType};
use kikizake_core::errors::{ApplicationError, DomainError};
use kikizake_core::recommend::MenuOptions;

use crate::commands::recommend::{check_count, render};
use crate::commands::{with_service, CommandResult};

#[derive(Debug, Clone)]
pub struct MenuArgs {
    pub user: Option<String>,
    pub recommendation_type: String,
    pub dish: Option<String>,
    pub items: Vec<String>,
    pub count: Option<usize>,
}

pub fn run(args: &MenuArgs) -> CommandResult {
    let options = match parse_options(args) {
        Ok(options) => options,
        Err(error) => {
            return CommandResult::from_application_error("menu", ApplicationError::from(error));
        }
    };

    let user_id = args.user.as_deref().map(UserId::from);
    let menu: Vec<ItemId> = args
        .items
        .iter()
        .map(|item| item.trim())
        .filter(|item| !item.is_empty())
        .map(ItemId::from)
        .collect();

    let result = with_service("menu", |service| async move {
        service.recommend_for_menu(user_id.as_ref(), &menu, options).await
    });

    match result {
        Ok(outcome) => render("menu", &outcome),
        Err(failure) => failure,
    }
}

fn parse_options(args: &MenuArgs) -> Result<MenuOptions, DomainError> {
    let kind = args.recommendation_type.parse::<MenuRecommendationType>()?;
    let mut options = MenuOptions::new(kind);
    if let Some(dish) = &args.dish {
        options = options.with_dish_type(dish.parse::<DishType>()?);
    }
    check_count(args.count)?;
    if let Some(count) = args.count {
        options = options.with_count(count);
    }
    Ok(options)
}
