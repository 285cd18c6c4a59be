// Discord layer - commands and event handlers.

#[path = "logging/mod.rs"]
pub mod logging;

use crate::core::logging::AdminLogService;
use crate::infra::logging::SqliteGuildSettingsStore;
use std::sync::Arc;

pub type Error = Box<dyn std::error::Error + Send + Sync>;
pub type Context<'a> = poise::Context<'a, Data, Error>;

/// Data that's shared across all commands and event handlers.
pub struct Data {
    pub admin_log: Arc<AdminLogService<SqliteGuildSettingsStore>>,
}
