pub mod commands;

use clap::{Parser, Subcommand};
use kikizake_core::config::{LogFormat, LoggingConfig};
use std::process::ExitCode;

use commands::menu::MenuArgs;
use commands::recommend::RecommendArgs;

#[derive(Debug, Parser)]
#[command(
    name = "kikizake",
    about = "Kikizake sake recommendation CLI",
    long_about = "Manage the kikizake database and inspect taste profiles and recommendations.",
    after_help = "Examples:\n  kikizake seed\n  kikizake recommend --user demo-user --mood adventure\n  kikizake menu --type pairing --dish sashimi --items dassai-45,tamagawa-yamahai"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    #[command(about = "Apply pending database migrations and return structured status output")]
    Migrate,
    #[command(about = "Load the deterministic demo catalog and favourites")]
    Seed,
    #[command(about = "Inspect effective configuration values with source attribution")]
    Config,
    #[command(about = "Show the taste profile derived from a user's favourites")]
    Profile {
        #[arg(long)]
        user: String,
    },
    #[command(about = "Recommend sake from the whole catalog for a user and mood")]
    Recommend {
        #[arg(long)]
        user: String,
        #[arg(long, default_value = "usual", help = "usual|adventure|discovery|special")]
        mood: String,
        #[arg(long)]
        count: Option<usize>,
    },
    #[command(about = "Pick from a restaurant menu by similarity, food pairing or at random")]
    Menu {
        #[arg(long, help = "Required for similarity picks; optional otherwise")]
        user: Option<String>,
        #[arg(long = "type", default_value = "similarity", help = "similarity|pairing|random")]
        recommendation_type: String,
        #[arg(long, help = "sashimi|tempura|yakitori|nabe|cheese|dessert|general")]
        dish: Option<String>,
        #[arg(long, value_delimiter = ',', required = true)]
        items: Vec<String>,
        #[arg(long)]
        count: Option<usize>,
    },
}

/// Logs go to stderr so stdout stays a single JSON payload.
pub fn init_logging(config: &LoggingConfig) -> Result<(), String> {
    use tracing::Level;

    let log_level = config.level.parse::<Level>().unwrap_or(Level::INFO);
    let builder =
        tracing_subscriber::fmt().with_target(false).with_max_level(log_level).with_writer(std::io::stderr);

    let result = match config.format {
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    result.map_err(|error| error.to_string())
}

pub fn execute(cli: Cli) -> ExitCode {
    let result = match cli.command {
        Command::Migrate => commands::migrate::run(),
        Command::Seed => commands::seed::run(),
        Command::Config => commands::config::run(),
        Command::Profile { user } => commands::profile::run(&user),
        Command::Recommend { user, mood, count } => {
            commands::recommend::run(&RecommendArgs { user, mood, count })
        }
        Command::Menu { user, recommendation_type, dish, items, count } => {
            commands::menu::run(&MenuArgs { user, recommendation_type, dish, items, count })
        }
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
