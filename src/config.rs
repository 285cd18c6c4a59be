// Runtime configuration, read from the environment (and `.env` if present).

use anyhow::{Context, Result};
use std::path::PathBuf;

const DEFAULT_DATA_DIR: &str = "data";
const DEFAULT_LOCALE: &str = "en-GB";

#[derive(Debug, Clone)]
pub struct BotConfig {
    pub discord_token: String,
    /// Folder for the SQLite database.
    pub data_dir: PathBuf,
    /// Locale given to guilds that haven't picked one.
    pub default_locale: String,
    /// Optional folder of `<locale>.json` catalogues loaded on top of the bundled one.
    pub locales_dir: Option<PathBuf>,
}

impl BotConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let discord_token = lookup("DISCORD_TOKEN")
            .filter(|t| !t.trim().is_empty())
            .context(
                "Missing DISCORD_TOKEN environment variable! Create a .env file with your bot token.",
            )?;

        Ok(Self {
            discord_token,
            data_dir: lookup("DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR)),
            default_locale: lookup("DEFAULT_LOCALE").unwrap_or_else(|| DEFAULT_LOCALE.to_string()),
            locales_dir: lookup("LOCALES_DIR").map(PathBuf::from),
        })
    }

    pub fn database_url(&self) -> String {
        format!(
            "sqlite://{}?mode=rwc",
            self.data_dir.join("audit_log.db").display()
        )
    }
}
