// serenity implementation of the core `ChatPlatform` port.

use crate::core::logging::{
    AdminLogError, AuditUser, CachedChannel, ChatPlatform, LogEmbed, SentLog,
};
use crate::discord::logging::formatter::format_log_message;
use async_trait::async_trait;
use poise::serenity_prelude as serenity;
use std::sync::Arc;

pub struct SerenityPlatform {
    http: Arc<serenity::Http>,
    cache: Arc<serenity::Cache>,
}

impl SerenityPlatform {
    pub fn new(http: Arc<serenity::Http>, cache: Arc<serenity::Cache>) -> Self {
        Self { http, cache }
    }

    pub fn from_context(ctx: &serenity::Context) -> Self {
        Self::new(ctx.http.clone(), ctx.cache.clone())
    }
}

#[async_trait]
impl ChatPlatform for SerenityPlatform {
    async fn fetch_user(&self, user_id: u64) -> Result<AuditUser, AdminLogError> {
        if user_id == 0 {
            return Err(AdminLogError::PlatformError("invalid user id 0".to_string()));
        }

        let user = self
            .http
            .get_user(serenity::UserId::new(user_id))
            .await
            .map_err(|e| AdminLogError::PlatformError(e.to_string()))?;

        Ok(AuditUser {
            id: user.id.get(),
            username: user.name.clone(),
            tag: user.tag(),
            avatar_url: user.avatar_url(),
        })
    }

    fn cached_channel(&self, guild_id: u64, channel_id: u64) -> Option<CachedChannel> {
        if guild_id == 0 || channel_id == 0 {
            return None;
        }

        let guild = self.cache.guild(serenity::GuildId::new(guild_id))?;
        let channel = guild.channels.get(&serenity::ChannelId::new(channel_id))?;
        Some(CachedChannel {
            guild_id,
            channel_id,
            name: channel.name.clone(),
        })
    }

    async fn send_embeds(
        &self,
        channel: &CachedChannel,
        embeds: Vec<LogEmbed>,
    ) -> Result<SentLog, AdminLogError> {
        let embeds = format_log_message(&embeds);
        let message = serenity::ChannelId::new(channel.channel_id)
            .send_message(&self.http, serenity::CreateMessage::new().embeds(embeds))
            .await
            .map_err(|e| AdminLogError::PlatformError(e.to_string()))?;

        Ok(SentLog {
            channel_id: message.channel_id.get(),
            message_id: message.id.get(),
        })
    }
}
