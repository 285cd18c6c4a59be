use crate::core::logging::{AdminLogError, GuildSettings, GuildSettingsStore};
use async_trait::async_trait;
use sqlx::{Pool, Row, Sqlite};

pub struct SqliteGuildSettingsStore {
    pool: Pool<Sqlite>,
}

impl SqliteGuildSettingsStore {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    pub async fn migrate(&self) -> Result<(), AdminLogError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS guild_settings (
                guild_id INTEGER PRIMARY KEY,
                log_channel INTEGER,
                locale TEXT NOT NULL,
                footer TEXT
            );
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| AdminLogError::StorageError(e.to_string()))?;
        Ok(())
    }
}

#[async_trait]
impl GuildSettingsStore for SqliteGuildSettingsStore {
    async fn get_settings(&self, guild_id: u64) -> Result<Option<GuildSettings>, AdminLogError> {
        let row = sqlx::query(
            "SELECT log_channel, locale, footer FROM guild_settings WHERE guild_id = ?",
        )
        .bind(guild_id as i64)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AdminLogError::StorageError(e.to_string()))?;

        Ok(row.map(|row| GuildSettings {
            guild_id,
            log_channel: row
                .get::<Option<i64>, _>("log_channel")
                .map(|id| id as u64),
            locale: row.get("locale"),
            footer: row.get("footer"),
        }))
    }

    async fn save_settings(&self, settings: GuildSettings) -> Result<(), AdminLogError> {
        sqlx::query(
            r#"
            INSERT INTO guild_settings (guild_id, log_channel, locale, footer)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(guild_id) DO UPDATE SET
                log_channel = excluded.log_channel,
                locale = excluded.locale,
                footer = excluded.footer
            "#,
        )
        .bind(settings.guild_id as i64)
        .bind(settings.log_channel.map(|id| id as i64))
        .bind(&settings.locale)
        .bind(&settings.footer)
        .execute(&self.pool)
        .await
        .map_err(|e| AdminLogError::StorageError(e.to_string()))?;
        Ok(())
    }
}
