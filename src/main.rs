// This is the entry point of the admin log bot.
//
// **Architecture Overview:**
// - `core/` = Business logic (platform-agnostic)
// - `infra/` = Implementations of core traits (database, locale catalogues)
// - `discord/` = Discord-specific adapters (commands, events)
//
// This file's job is to:
// 1. Load configuration
// 2. Initialize services (dependency injection)
// 3. Set up the Discord framework
// 4. Register commands and event handlers

mod config;
// These attrs point each module declaration at a more descriptive root file
// so we don't end up with half a dozen mod.rs files that all look the same.
#[path = "core/core_layer.rs"]
mod core;
#[path = "discord/discord_layer.rs"]
mod discord;
#[path = "infra/infra_layer.rs"]
mod infra;

use crate::config::BotConfig;
use crate::core::locale::Translator;
use crate::core::logging::{AdminLogService, TracingActivityLog};
use crate::discord::logging::events as admin_events;
use crate::discord::{Data, Error};
use crate::infra::locale::JsonLocaleCatalog;
use crate::infra::logging::SqliteGuildSettingsStore;
use anyhow::Context as _;
use poise::serenity_prelude as serenity;
use std::sync::Arc;

/// Event handler for non-command Discord events.
async fn event_handler(
    ctx: &serenity::Context,
    event: &serenity::FullEvent,
    _framework: poise::FrameworkContext<'_, Data, Error>,
    data: &Data,
) -> Result<(), Error> {
    let result = match event {
        serenity::FullEvent::GuildCreate { guild, .. } => {
            admin_events::handle_guild_create(data, guild).await
        }
        serenity::FullEvent::GuildRoleCreate { new } => {
            admin_events::handle_role_create(ctx, data, new).await
        }
        serenity::FullEvent::GuildRoleUpdate {
            old_data_if_available,
            new,
        } => {
            admin_events::handle_role_update(ctx, data, old_data_if_available.as_ref(), new).await
        }
        serenity::FullEvent::GuildRoleDelete {
            guild_id,
            removed_role_id,
            removed_role_data_if_available,
        } => {
            admin_events::handle_role_delete(
                ctx,
                data,
                *guild_id,
                *removed_role_id,
                removed_role_data_if_available.as_ref(),
            )
            .await
        }
        serenity::FullEvent::ChannelCreate { channel } => {
            admin_events::handle_channel_create(ctx, data, channel).await
        }
        serenity::FullEvent::ChannelUpdate { old, new } => {
            admin_events::handle_channel_update(ctx, data, old.as_ref(), new).await
        }
        serenity::FullEvent::ChannelDelete { channel, .. } => {
            admin_events::handle_channel_delete(ctx, data, channel).await
        }
        _ => Ok(()),
    };

    // A failed log entry must never take the bot down.
    if let Err(e) = result {
        tracing::error!("Error handling admin log event: {:#}", e);
    }

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging so we can see what's happening
    tracing_subscriber::fmt::init();

    // Load environment variables from .env file (if it exists)
    dotenv::dotenv().ok();

    let config = BotConfig::from_env()?;

    std::fs::create_dir_all(&config.data_dir)
        .context("Failed to create data directory for SQLite files")?;

    // ========================================================================
    // DEPENDENCY INJECTION
    // ========================================================================

    let pool = sqlx::sqlite::SqlitePoolOptions::new()
        .connect(&config.database_url())
        .await
        .context("Failed to connect to settings DB")?;
    let settings_store = SqliteGuildSettingsStore::new(pool);
    settings_store
        .migrate()
        .await
        .context("Failed to migrate settings DB")?;

    let mut catalog = JsonLocaleCatalog::bundled(config.default_locale.clone())?;
    if let Some(dir) = &config.locales_dir {
        catalog = catalog
            .load_dir(dir)
            .with_context(|| format!("Failed to load locales from {}", dir.display()))?;
    }
    if !catalog.has_locale(&config.default_locale) {
        tracing::warn!(
            locale = %config.default_locale,
            "Default locale has no catalogue, falling back to en-GB"
        );
    }
    tracing::info!(locales = ?catalog.locales(), "Locale catalogues loaded");

    let admin_log = Arc::new(AdminLogService::new(
        settings_store,
        Arc::new(catalog),
        Arc::new(TracingActivityLog),
    ));

    let data = Data { admin_log };

    // ========================================================================
    // DISCORD FRAMEWORK SETUP
    // ========================================================================

    // GUILDS covers role and channel create/update/delete events.
    let intents = serenity::GatewayIntents::GUILDS;

    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands: vec![discord::logging::commands::settings()],
            event_handler: |ctx, event, framework, data| {
                Box::pin(event_handler(ctx, event, framework, data))
            },
            ..Default::default()
        })
        .setup(|ctx, _ready, framework| {
            Box::pin(async move {
                tracing::info!("Bot is starting up...");
                poise::builtins::register_globally(ctx, &framework.options().commands).await?;
                tracing::info!("Commands registered, bot is ready");
                Ok(data)
            })
        })
        .build();

    let mut client = serenity::ClientBuilder::new(&config.discord_token, intents)
        .framework(framework)
        .await
        .context("Error creating client")?;

    client.start().await.context("Error running bot")?;
    Ok(())
}
