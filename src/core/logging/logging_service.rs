// Admin log service - posts a localised record of administrative changes
// to each guild's log channel.
//
// NO Discord dependencies here: the platform, the settings storage, the
// locale catalogue and the process log are all ports passed in by the caller.

use super::diff::make_diff;
use super::logging_models::{
    AdminEvent, AuditUser, CachedChannel, EmbedAuthor, EmbedField, GuildSettings, LogEmbed,
    SentLog,
};
use crate::core::locale::{LocaleMessages, Translator};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Error)]
pub enum AdminLogError {
    #[error("No settings stored for guild {0}")]
    GuildNotFound(u64),

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Platform error: {0}")]
    PlatformError(String),

    #[error("Invalid snapshot: {0}")]
    InvalidSnapshot(String),
}

// ============================================================================
// PORTS
// ============================================================================

#[async_trait]
pub trait GuildSettingsStore: Send + Sync {
    async fn get_settings(&self, guild_id: u64) -> Result<Option<GuildSettings>, AdminLogError>;
    async fn save_settings(&self, settings: GuildSettings) -> Result<(), AdminLogError>;
}

/// The chat platform the log is posted to.
#[async_trait]
pub trait ChatPlatform: Send + Sync {
    async fn fetch_user(&self, user_id: u64) -> Result<AuditUser, AdminLogError>;

    /// Channel lookup against the local cache only. `None` if it isn't cached.
    fn cached_channel(&self, guild_id: u64, channel_id: u64) -> Option<CachedChannel>;

    async fn send_embeds(
        &self,
        channel: &CachedChannel,
        embeds: Vec<LogEmbed>,
    ) -> Result<SentLog, AdminLogError>;
}

/// Process-wide activity log (fire-and-forget).
pub trait ActivityLog: Send + Sync {
    fn info(&self, category: &str, message: &str);
}

pub struct TracingActivityLog;

impl ActivityLog for TracingActivityLog {
    fn info(&self, category: &str, message: &str) {
        tracing::info!(category, "{}", message);
    }
}

// ============================================================================
// CORE SERVICE
// ============================================================================

pub struct AdminLogService<S: GuildSettingsStore> {
    store: S,
    translator: Arc<dyn Translator>,
    activity: Arc<dyn ActivityLog>,
}

impl<S: GuildSettingsStore> AdminLogService<S> {
    pub fn new(store: S, translator: Arc<dyn Translator>, activity: Arc<dyn ActivityLog>) -> Self {
        Self {
            store,
            translator,
            activity,
        }
    }

    pub fn translator(&self) -> &Arc<dyn Translator> {
        &self.translator
    }

    /// Settings for a guild. A guild without a record is an error.
    pub async fn get_settings(&self, guild_id: u64) -> Result<GuildSettings, AdminLogError> {
        self.store
            .get_settings(guild_id)
            .await?
            .ok_or(AdminLogError::GuildNotFound(guild_id))
    }

    /// Create a default record for the guild if it has none yet.
    pub async fn ensure_settings(&self, guild_id: u64) -> Result<GuildSettings, AdminLogError> {
        if let Some(settings) = self.store.get_settings(guild_id).await? {
            return Ok(settings);
        }

        let settings = GuildSettings::new(guild_id, self.translator.default_locale());
        self.store.save_settings(settings.clone()).await?;
        Ok(settings)
    }

    /// Apply `change` to the guild's settings and persist them.
    ///
    /// Returns the settings before and after the change so the caller can log a diff.
    pub async fn update_settings(
        &self,
        guild_id: u64,
        change: impl FnOnce(&mut GuildSettings) + Send,
    ) -> Result<(GuildSettings, GuildSettings), AdminLogError> {
        let original = self.ensure_settings(guild_id).await?;
        let mut updated = original.clone();
        change(&mut updated);
        self.store.save_settings(updated.clone()).await?;
        Ok((original, updated))
    }

    /// Resolve the guild's log channel from the platform cache.
    ///
    /// `Ok(None)` when no channel is configured or the configured one isn't cached.
    #[allow(dead_code)]
    pub async fn get_log_channel<P: ChatPlatform + ?Sized>(
        &self,
        platform: &P,
        guild_id: u64,
    ) -> Result<Option<CachedChannel>, AdminLogError> {
        let settings = self.get_settings(guild_id).await?;
        Ok(resolve_log_channel(platform, &settings))
    }

    /// Post an admin event to the guild's log channel.
    ///
    /// Returns `Ok(None)` without sending anything when the guild has no log
    /// channel or the channel can't be resolved.
    pub async fn log_admin_event<P: ChatPlatform + ?Sized>(
        &self,
        platform: &P,
        event: AdminEvent,
    ) -> Result<Option<SentLog>, AdminLogError> {
        let user = platform.fetch_user(event.user_id).await?;
        self.activity.info(
            "settings",
            &format!(
                "{} {}d {} {}",
                user.tag, event.action, event.target.kind, event.target.id
            ),
        );

        let settings = self.get_settings(event.guild_id).await?;
        let Some(channel) = resolve_log_channel(platform, &settings) else {
            return Ok(None);
        };

        let embeds = self.build_embeds(&user, &settings, &event);
        let sent = platform.send_embeds(&channel, embeds).await?;
        Ok(Some(sent))
    }

    /// The embeds for one admin event: the summary and, if there is a
    /// before/after pair, the list of changes.
    pub fn build_embeds(
        &self,
        user: &AuditUser,
        settings: &GuildSettings,
        event: &AdminEvent,
    ) -> Vec<LogEmbed> {
        let messages = LocaleMessages::new(Arc::clone(&self.translator), settings.locale.clone());
        let colour = event.action.colour();
        let mention = format!("<@{}>", user.id);
        let verb = messages.get(&event.action.verb_key());
        let target = &event.target;
        let title_target = messages.get(&format!("log.admin.title.target.{}", target.kind));
        let description_target =
            messages.get(&format!("log.admin.description.target.{}", target.kind));

        let mut summary = LogEmbed::new(colour);
        summary.author = Some(EmbedAuthor {
            name: user.username.clone(),
            icon_url: user.avatar_url.clone(),
        });
        summary.title = Some(messages.get_with(
            "log.admin.title.joined",
            &[
                ("user", mention.as_str()),
                ("verb", verb.as_str()),
                ("targetType", title_target.as_str()),
            ],
        ));
        summary.description = Some(messages.get_with(
            "log.admin.description.joined",
            &[
                ("user", mention.as_str()),
                ("verb", verb.as_str()),
                ("targetType", description_target.as_str()),
            ],
        ));
        summary.fields.push(EmbedField {
            name: title_target,
            value: target.display_name().to_string(),
            inline: false,
        });
        summary.footer = settings.footer.clone().filter(|f| !f.is_empty());

        let mut embeds = vec![summary];

        if let Some(diff) = event.diff.as_ref().filter(|d| !d.original.is_empty()) {
            let mut changes = LogEmbed::new(colour);
            changes.title = Some(messages.get("log.admin.changes"));
            changes.fields = make_diff(diff);
            embeds.push(changes);
        }

        embeds
    }
}

// ============================================================================
// TESTS
// ============================================================================

fn resolve_log_channel<P: ChatPlatform + ?Sized>(
    platform: &P,
    settings: &GuildSettings,
) -> Option<CachedChannel> {
    let channel_id = settings.log_channel?;
    let channel = platform.cached_channel(settings.guild_id, channel_id);
    if channel.is_none() {
        tracing::debug!(
            guild_id = settings.guild_id,
            channel_id,
            "Admin log channel is not cached, skipping"
        );
    }
    channel
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::locale::substitute;
    use crate::core::logging::{AdminAction, DiffRequest, LogColour, LogTarget, Snapshot};
    use crate::infra::logging::in_memory::InMemoryGuildSettingsStore;
    use dashmap::DashMap;
    use std::sync::Mutex;

    const GUILD: u64 = 100;
    const USER: u64 = 7;
    const LOG_CHANNEL: u64 = 555;

    struct MockPlatform {
        users: DashMap<u64, AuditUser>,
        channels: DashMap<u64, CachedChannel>,
        sent: Mutex<Vec<(u64, Vec<LogEmbed>)>>,
    }

    impl MockPlatform {
        fn new() -> Self {
            let platform = Self {
                users: DashMap::new(),
                channels: DashMap::new(),
                sent: Mutex::new(Vec::new()),
            };
            platform.users.insert(
                USER,
                AuditUser {
                    id: USER,
                    username: "alice".to_string(),
                    tag: "alice#0001".to_string(),
                    avatar_url: Some("https://cdn.example/alice.png".to_string()),
                },
            );
            platform
        }

        fn with_channel(self, channel_id: u64) -> Self {
            self.channels.insert(
                channel_id,
                CachedChannel {
                    guild_id: GUILD,
                    channel_id,
                    name: "admin-log".to_string(),
                },
            );
            self
        }

        fn sent(&self) -> Vec<(u64, Vec<LogEmbed>)> {
            self.sent.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ChatPlatform for MockPlatform {
        async fn fetch_user(&self, user_id: u64) -> Result<AuditUser, AdminLogError> {
            self.users
                .get(&user_id)
                .map(|u| u.clone())
                .ok_or_else(|| AdminLogError::PlatformError("Unknown User".to_string()))
        }

        fn cached_channel(&self, guild_id: u64, channel_id: u64) -> Option<CachedChannel> {
            self.channels
                .get(&channel_id)
                .filter(|c| c.guild_id == guild_id)
                .map(|c| c.clone())
        }

        async fn send_embeds(
            &self,
            channel: &CachedChannel,
            embeds: Vec<LogEmbed>,
        ) -> Result<SentLog, AdminLogError> {
            let mut sent = self.sent.lock().unwrap();
            sent.push((channel.channel_id, embeds));
            Ok(SentLog {
                channel_id: channel.channel_id,
                message_id: sent.len() as u64,
            })
        }
    }

    /// Renders `key|var=value,...` so assertions can see exactly what was looked up.
    struct KeyTranslator;

    impl Translator for KeyTranslator {
        fn translate(&self, _locale: &str, key: &str, vars: &[(&str, &str)]) -> String {
            match key {
                "log.admin.title.joined" => substitute("{targetType} {verb}", vars),
                "log.admin.description.joined" => substitute("{user} {verb} {targetType}", vars),
                other => other.to_string(),
            }
        }

        fn has_locale(&self, locale: &str) -> bool {
            locale == "en-GB"
        }

        fn default_locale(&self) -> &str {
            "en-GB"
        }
    }

    #[derive(Default)]
    struct RecordingLog {
        lines: Mutex<Vec<(String, String)>>,
    }

    impl ActivityLog for RecordingLog {
        fn info(&self, category: &str, message: &str) {
            self.lines
                .lock()
                .unwrap()
                .push((category.to_string(), message.to_string()));
        }
    }

    async fn service_with(
        log_channel: Option<u64>,
    ) -> (AdminLogService<InMemoryGuildSettingsStore>, Arc<RecordingLog>) {
        let store = InMemoryGuildSettingsStore::new();
        let mut settings = GuildSettings::new(GUILD, "en-GB");
        settings.log_channel = log_channel;
        settings.footer = Some("Powered by audit bot".to_string());
        store.save_settings(settings).await.unwrap();

        let activity = Arc::new(RecordingLog::default());
        let service = AdminLogService::new(store, Arc::new(KeyTranslator), activity.clone());
        (service, activity)
    }

    fn event(action: AdminAction, diff: Option<DiffRequest>) -> AdminEvent {
        AdminEvent {
            guild_id: GUILD,
            user_id: USER,
            action,
            target: LogTarget::new("role", 42u64).named("Moderator Role"),
            diff,
        }
    }

    #[tokio::test]
    async fn test_no_log_channel_is_silent_noop() {
        let (service, activity) = service_with(None).await;
        let platform = MockPlatform::new().with_channel(LOG_CHANNEL);

        let result = service
            .log_admin_event(&platform, event(AdminAction::Create, None))
            .await
            .unwrap();

        assert_eq!(result, None);
        assert!(platform.sent().is_empty());
        // The process log still records the event.
        assert_eq!(activity.lines.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_uncached_channel_is_silent_noop() {
        let (service, _) = service_with(Some(LOG_CHANNEL)).await;
        let platform = MockPlatform::new();

        let result = service
            .log_admin_event(&platform, event(AdminAction::Update, None))
            .await
            .unwrap();

        assert_eq!(result, None);
        assert!(platform.sent().is_empty());
    }

    #[tokio::test]
    async fn test_missing_guild_record_is_an_error() {
        let service = AdminLogService::new(
            InMemoryGuildSettingsStore::new(),
            Arc::new(KeyTranslator),
            Arc::new(TracingActivityLog),
        );
        let platform = MockPlatform::new().with_channel(LOG_CHANNEL);

        let err = service.get_log_channel(&platform, GUILD).await.unwrap_err();
        assert!(matches!(err, AdminLogError::GuildNotFound(GUILD)));

        let err = service
            .log_admin_event(&platform, event(AdminAction::Create, None))
            .await
            .unwrap_err();
        assert!(matches!(err, AdminLogError::GuildNotFound(GUILD)));
        assert!(platform.sent().is_empty());
    }

    #[tokio::test]
    async fn test_get_log_channel_resolves_cached_channel() {
        let (service, _) = service_with(Some(LOG_CHANNEL)).await;
        let platform = MockPlatform::new().with_channel(LOG_CHANNEL);

        let channel = service.get_log_channel(&platform, GUILD).await.unwrap();
        assert_eq!(channel.map(|c| c.channel_id), Some(LOG_CHANNEL));

        let (service, _) = service_with(None).await;
        assert_eq!(service.get_log_channel(&platform, GUILD).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_user_fetch_failure_propagates() {
        let (service, activity) = service_with(Some(LOG_CHANNEL)).await;
        let platform = MockPlatform::new().with_channel(LOG_CHANNEL);

        let mut unknown = event(AdminAction::Delete, None);
        unknown.user_id = 999;

        let err = service.log_admin_event(&platform, unknown).await.unwrap_err();
        assert!(matches!(err, AdminLogError::PlatformError(_)));
        assert!(platform.sent().is_empty());
        assert!(activity.lines.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_sends_danger_summary() {
        let (service, activity) = service_with(Some(LOG_CHANNEL)).await;
        let platform = MockPlatform::new().with_channel(LOG_CHANNEL);

        let sent = service
            .log_admin_event(&platform, event(AdminAction::Delete, None))
            .await
            .unwrap();

        assert_eq!(
            sent,
            Some(SentLog {
                channel_id: LOG_CHANNEL,
                message_id: 1
            })
        );

        let messages = platform.sent();
        assert_eq!(messages.len(), 1);
        let (channel_id, embeds) = &messages[0];
        assert_eq!(*channel_id, LOG_CHANNEL);
        assert_eq!(embeds.len(), 1);

        let summary = &embeds[0];
        assert_eq!(summary.colour, LogColour::Danger);
        assert_eq!(summary.author.as_ref().unwrap().name, "alice");
        assert_eq!(
            summary.title.as_deref(),
            Some("log.admin.title.target.role log.admin.verb.delete")
        );
        assert_eq!(
            summary.description.as_deref(),
            Some("<@7> log.admin.verb.delete log.admin.description.target.role")
        );
        assert_eq!(summary.fields.len(), 1);
        assert_eq!(summary.fields[0].name, "log.admin.title.target.role");
        assert_eq!(summary.fields[0].value, "Moderator Role");
        assert_eq!(summary.footer.as_deref(), Some("Powered by audit bot"));

        let lines = activity.lines.lock().unwrap();
        assert_eq!(
            lines[0],
            ("settings".to_string(), "alice#0001 deleted role 42".to_string())
        );
    }

    #[tokio::test]
    async fn test_unmapped_action_uses_default_colour() {
        let (service, activity) = service_with(Some(LOG_CHANNEL)).await;
        let platform = MockPlatform::new().with_channel(LOG_CHANNEL);

        service
            .log_admin_event(&platform, event(AdminAction::parse("frobnicate"), None))
            .await
            .unwrap();

        let messages = platform.sent();
        assert_eq!(messages[0].1[0].colour, LogColour::Default);
        assert_eq!(
            activity.lines.lock().unwrap()[0].1,
            "alice#0001 frobnicated role 42"
        );
    }

    #[tokio::test]
    async fn test_diff_adds_changes_embed() {
        let (service, _) = service_with(Some(LOG_CHANNEL)).await;
        let platform = MockPlatform::new().with_channel(LOG_CHANNEL);

        let diff = DiffRequest::new(
            Snapshot::new().text("name", "Mod Role"),
            Snapshot::new().text("name", "Moderator Role"),
        );
        service
            .log_admin_event(&platform, event(AdminAction::Update, Some(diff)))
            .await
            .unwrap();

        let messages = platform.sent();
        let embeds = &messages[0].1;
        assert_eq!(embeds.len(), 2);
        assert_eq!(embeds[0].colour, LogColour::Warning);
        assert_eq!(embeds[1].colour, LogColour::Warning);
        assert_eq!(embeds[1].title.as_deref(), Some("log.admin.changes"));
        assert_eq!(embeds[1].fields.len(), 1);
        assert_eq!(embeds[1].fields[0].name, "name");
    }

    #[tokio::test]
    async fn test_diff_with_empty_original_is_skipped() {
        let (service, _) = service_with(Some(LOG_CHANNEL)).await;
        let platform = MockPlatform::new().with_channel(LOG_CHANNEL);

        let diff = DiffRequest::new(Snapshot::new(), Snapshot::new().text("name", "New Role"));
        service
            .log_admin_event(&platform, event(AdminAction::Create, Some(diff)))
            .await
            .unwrap();

        assert_eq!(platform.sent()[0].1.len(), 1);
    }

    #[tokio::test]
    async fn test_target_without_name_shows_id() {
        let (service, _) = service_with(Some(LOG_CHANNEL)).await;
        let platform = MockPlatform::new().with_channel(LOG_CHANNEL);

        let mut unnamed = event(AdminAction::Create, None);
        unnamed.target = LogTarget::new("channel", 321u64);
        service.log_admin_event(&platform, unnamed).await.unwrap();

        assert_eq!(platform.sent()[0].1[0].fields[0].value, "321");
    }

    #[tokio::test]
    async fn test_update_settings_returns_before_and_after() {
        let service = AdminLogService::new(
            InMemoryGuildSettingsStore::new(),
            Arc::new(KeyTranslator),
            Arc::new(TracingActivityLog),
        );

        let (before, after) = service
            .update_settings(GUILD, |s| s.log_channel = Some(LOG_CHANNEL))
            .await
            .unwrap();

        assert_eq!(before.log_channel, None);
        assert_eq!(before.locale, "en-GB");
        assert_eq!(after.log_channel, Some(LOG_CHANNEL));
        assert_eq!(service.get_settings(GUILD).await.unwrap(), after);
    }
}
