//! Configuration loading and validation.
//!
//! A single TOML file owns all deployment knobs. The bot token itself is
//! never stored in the file — only the name of the environment variable
//! that holds it.

use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Top-level configuration.
#[derive(Debug, Deserialize)]
pub struct Config {
    /// Telegram channel settings.
    pub telegram: TelegramConfig,

    /// Ride matching settings: languages, cities, follow-up delay.
    pub rides: RidesConfig,

    /// Storage backend selection.
    #[serde(default)]
    pub storage: StorageConfig,
}

/// Telegram-specific configuration.
#[derive(Debug, Deserialize)]
pub struct TelegramConfig {
    /// Environment variable name holding the bot token.
    pub bot_token_env: String,
}

/// Ride matching configuration.
#[derive(Debug, Deserialize)]
pub struct RidesConfig {
    /// Language tag used when a participant has no stored preference.
    #[serde(default = "default_language")]
    pub default_language: String,

    /// Closed set of selectable city names, offered as buttons in both flows.
    pub cities: Vec<String>,

    /// Delay before the post-disclosure follow-up reaches the driver.
    #[serde(default = "default_followup_delay")]
    pub followup_delay_secs: u64,
}

/// Storage backend configuration.
#[derive(Debug, Default, Deserialize)]
pub struct StorageConfig {
    /// SQLite database file. When absent, trips live in a transient
    /// in-memory store and are lost on restart.
    #[serde(default)]
    pub database_path: Option<PathBuf>,
}

// Default value functions for serde

fn default_language() -> String {
    "ru".to_owned()
}

fn default_followup_delay() -> u64 {
    120
}

/// Load the configuration from a TOML file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed.
pub fn load_config(path: &Path) -> anyhow::Result<Config> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("failed to read config at {}: {e}", path.display()))?;
    let config: Config = toml::from_str(&contents)
        .map_err(|e| anyhow::anyhow!("failed to parse config at {}: {e}", path.display()))?;
    Ok(config)
}

/// Resolve the default config directory (`~/.poputka/`).
///
/// # Errors
///
/// Returns an error if the home directory cannot be determined.
pub fn config_dir() -> anyhow::Result<PathBuf> {
    let home = directories::BaseDirs::new()
        .ok_or_else(|| anyhow::anyhow!("cannot determine home directory"))?;
    Ok(home.home_dir().join(".poputka"))
}
