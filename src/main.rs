#![allow(missing_docs)]

//! Poputka — ride-share matching Telegram bot.
//!
//! Wires the config, store backend, locales, follow-up scheduler, dialog
//! engine, and disclosure handler together, then runs the Telegram
//! dispatcher until stopped.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use teloxide::Bot;
use tracing::info;

use poputka::config::{config_dir, load_config};
use poputka::dialog::DialogEngine;
use poputka::disclosure::DisclosureHandler;
use poputka::followup::FollowupScheduler;
use poputka::i18n::Locales;
use poputka::logging;
use poputka::presenter::Presenter;
use poputka::telegram::{run_telegram, TelegramPresenter};
use poputka::trips::{MemoryStore, SqliteStore, TripStore};

#[derive(Parser)]
#[command(name = "poputka", version, about = "Ride-share matching Telegram bot")]
struct Cli {
    /// Path to the TOML config (default: ~/.poputka/config.toml).
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the bot (the default when no subcommand is given).
    Run,
    /// Write a starter config file and exit.
    Init,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config_path = match cli.config {
        Some(path) => path,
        None => config_dir()?.join("config.toml"),
    };

    match cli.command.unwrap_or(Command::Run) {
        Command::Init => {
            logging::init_console();
            init_config(&config_path)
        }
        Command::Run => run(&config_path).await,
    }
}

async fn run(config_path: &Path) -> anyhow::Result<()> {
    let config = load_config(config_path)?;

    let logs_dir = config_dir()?.join("logs");
    let _logging_guard = logging::init_production(&logs_dir)?;

    info!(config = %config_path.display(), "poputka starting");

    let token = std::env::var(&config.telegram.bot_token_env).with_context(|| {
        format!(
            "bot token environment variable {} is not set",
            config.telegram.bot_token_env
        )
    })?;
    let bot = Bot::new(token);

    let store: Arc<dyn TripStore> = match config.storage.database_path {
        Some(ref path) => {
            info!(path = %path.display(), "using sqlite trip store");
            Arc::new(SqliteStore::connect(path).await?)
        }
        None => {
            info!("using in-memory trip store (trips are lost on restart)");
            Arc::new(MemoryStore::new())
        }
    };

    let locales = Arc::new(Locales::builtin(&config.rides.default_language));
    let presenter: Arc<dyn Presenter> = Arc::new(TelegramPresenter::new(bot.clone()));
    let scheduler = FollowupScheduler::spawn(Arc::clone(&presenter));

    let engine = Arc::new(DialogEngine::new(
        Arc::clone(&store),
        Arc::clone(&locales),
        Arc::clone(&presenter),
        config.rides.cities.clone(),
    ));
    let disclosure = Arc::new(DisclosureHandler::new(
        store,
        scheduler,
        locales,
        presenter,
        Duration::from_secs(config.rides.followup_delay_secs),
    ));

    run_telegram(bot, engine, disclosure).await
}

/// Write a starter config at `path`, refusing to overwrite an existing one.
fn init_config(path: &Path) -> anyhow::Result<()> {
    if path.exists() {
        anyhow::bail!("config already exists at {}", path.display());
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }

    let starter = r#"[telegram]
# Name of the environment variable that holds the bot token.
bot_token_env = "POPUTKA_BOT_TOKEN"

[rides]
default_language = "ru"
cities = ["Бишкек", "Ош", "Каракол", "Нарын", "Талас"]
followup_delay_secs = 120

[storage]
# Uncomment to persist trips across restarts.
# database_path = "poputka.db"
"#;
    std::fs::write(path, starter)
        .with_context(|| format!("failed to write {}", path.display()))?;

    info!(path = %path.display(), "starter config written");
    println!("Config written to {}", path.display());
    Ok(())
}
