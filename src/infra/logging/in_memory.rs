// In-memory implementation of GuildSettingsStore, used by the service tests
// so they don't need a database.

use crate::core::logging::{AdminLogError, GuildSettings, GuildSettingsStore};
use async_trait::async_trait;
use dashmap::DashMap;

pub struct InMemoryGuildSettingsStore {
    settings: DashMap<u64, GuildSettings>,
}

impl InMemoryGuildSettingsStore {
    pub fn new() -> Self {
        Self {
            settings: DashMap::new(),
        }
    }
}

impl Default for InMemoryGuildSettingsStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GuildSettingsStore for InMemoryGuildSettingsStore {
    async fn get_settings(&self, guild_id: u64) -> Result<Option<GuildSettings>, AdminLogError> {
        Ok(self.settings.get(&guild_id).map(|s| s.clone()))
    }

    async fn save_settings(&self, settings: GuildSettings) -> Result<(), AdminLogError> {
        self.settings.insert(settings.guild_id, settings);
        Ok(())
    }
}
