use crate::core::locale::LocaleMessages;
use crate::core::logging::{AdminAction, AdminEvent, DiffRequest, GuildSettings, LogTarget};
use crate::discord::logging::platform::SerenityPlatform;
use crate::discord::{Context, Error};
use poise::serenity_prelude as serenity;
use std::sync::Arc;

/// Manage the admin log for this server.
#[poise::command(
    slash_command,
    guild_only,
    required_permissions = "MANAGE_GUILD",
    subcommands("show", "log_channel", "locale", "footer")
)]
pub async fn settings(_ctx: Context<'_>) -> Result<(), Error> {
    Ok(())
}

/// Show the current admin log settings.
#[poise::command(slash_command, guild_only, required_permissions = "MANAGE_GUILD")]
pub async fn show(ctx: Context<'_>) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("Must be in a guild")?.get();
    let settings = ctx.data().admin_log.ensure_settings(guild_id).await?;
    let messages = messages_for(ctx, &settings);
    let not_set = messages.get("commands.settings.not_set");

    let embed = serenity::CreateEmbed::default()
        .title(messages.get("commands.settings.title"))
        .color(serenity::Color::BLURPLE)
        .field(
            messages.get("commands.settings.log_channel"),
            settings
                .log_channel
                .map(|id| format!("<#{}>", id))
                .unwrap_or_else(|| not_set.clone()),
            false,
        )
        .field(
            messages.get("commands.settings.locale"),
            settings.locale.clone(),
            true,
        )
        .field(
            messages.get("commands.settings.footer"),
            settings.footer.clone().unwrap_or(not_set),
            true,
        )
        .footer(serenity::CreateEmbedFooter::new(format!(
            "Guild ID: {}",
            guild_id
        )))
        .timestamp(serenity::Timestamp::now());

    ctx.send(poise::CreateReply::default().embed(embed)).await?;
    Ok(())
}

/// Set the channel admin events are posted to. Leave empty to turn the admin log off.
#[poise::command(slash_command, guild_only, required_permissions = "MANAGE_GUILD")]
pub async fn log_channel(
    ctx: Context<'_>,
    #[description = "Channel to post admin events to"]
    #[channel_types("Text")]
    channel: Option<serenity::GuildChannel>,
) -> Result<(), Error> {
    let channel_id = channel.map(|c| c.id.get());
    apply_change(ctx, move |settings| settings.log_channel = channel_id).await
}

/// Set the language used for admin log messages.
#[poise::command(slash_command, guild_only, required_permissions = "MANAGE_GUILD")]
pub async fn locale(
    ctx: Context<'_>,
    #[description = "Locale code, e.g. en-GB"] code: String,
) -> Result<(), Error> {
    let translator = ctx.data().admin_log.translator();
    if !translator.has_locale(&code) {
        let text = translator.translate(
            translator.default_locale(),
            "commands.settings.unknown_locale",
            &[("locale", code.as_str())],
        );
        ctx.send(poise::CreateReply::default().content(text).ephemeral(true))
            .await?;
        return Ok(());
    }

    apply_change(ctx, move |settings| settings.locale = code).await
}

/// Set the footer shown on admin log messages. Leave empty to remove it.
#[poise::command(slash_command, guild_only, required_permissions = "MANAGE_GUILD")]
pub async fn footer(
    ctx: Context<'_>,
    #[description = "Footer text"]
    #[max_length = 2048]
    text: Option<String>,
) -> Result<(), Error> {
    let footer = text.filter(|t| !t.trim().is_empty());
    apply_change(ctx, move |settings| settings.footer = footer).await
}

/// Save a settings change and record it in the admin log.
async fn apply_change(
    ctx: Context<'_>,
    change: impl FnOnce(&mut GuildSettings) + Send,
) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("Must be in a guild")?;
    let guild_name = ctx.guild().map(|g| g.name.clone());

    let admin_log = &ctx.data().admin_log;
    let (original, updated) = admin_log.update_settings(guild_id.get(), change).await?;

    let messages = messages_for(ctx, &updated);
    ctx.send(
        poise::CreateReply::default()
            .content(messages.get("commands.settings.saved"))
            .ephemeral(true),
    )
    .await?;

    if original == updated {
        return Ok(());
    }

    let mut target = LogTarget::new("settings", guild_id.get());
    if let Some(name) = guild_name {
        target = target.named(name);
    }
    let event = AdminEvent {
        guild_id: guild_id.get(),
        user_id: ctx.author().id.get(),
        action: AdminAction::Update,
        target,
        diff: Some(DiffRequest::new(
            original.to_snapshot(),
            updated.to_snapshot(),
        )),
    };

    let platform = SerenityPlatform::from_context(ctx.serenity_context());
    if let Err(e) = admin_log.log_admin_event(&platform, event).await {
        tracing::warn!(guild_id = guild_id.get(), error = %e, "Failed to log settings change");
    }
    Ok(())
}

fn messages_for(ctx: Context<'_>, settings: &GuildSettings) -> LocaleMessages {
    LocaleMessages::new(
        Arc::clone(ctx.data().admin_log.translator()),
        settings.locale.clone(),
    )
}
