use crate::core::logging::{make_diff, AdminAction, AdminEvent, DiffRequest, LogTarget, Snapshot};
use crate::discord::logging::platform::SerenityPlatform;
use crate::discord::logging::snapshots::{channel_snapshot, role_snapshot};
use crate::discord::Data;
use ::serenity::model::guild::audit_log::{
    Action, ChannelAction, ChannelOverwriteAction, RoleAction,
};
use anyhow::Result;
use chrono::{DateTime, Utc};
use poise::serenity_prelude::{self as serenity, Context};

// How far back to look in the audit log for the entry behind a gateway event.
const AUDIT_LOG_LOOKBACK: u8 = 10;
// Older entries belong to an earlier change of the same target.
const AUDIT_LOG_MAX_AGE_SECS: i64 = 10;

/// Make sure every guild the bot is in has a settings row, so admin log
/// lookups for it don't fail.
pub async fn handle_guild_create(data: &Data, guild: &serenity::Guild) -> Result<()> {
    data.admin_log.ensure_settings(guild.id.get()).await?;
    Ok(())
}

pub async fn handle_role_create(ctx: &Context, data: &Data, role: &serenity::Role) -> Result<()> {
    let action = Action::Role(RoleAction::Create);
    let Some(user_id) = find_actor(ctx, role.guild_id, action, role.id.get()).await else {
        return Ok(());
    };

    log_event(
        ctx,
        data,
        AdminEvent {
            guild_id: role.guild_id.get(),
            user_id,
            action: AdminAction::Create,
            target: role_target(role),
            diff: None,
        },
    )
    .await
}

pub async fn handle_role_update(
    ctx: &Context,
    data: &Data,
    old: Option<&serenity::Role>,
    new: &serenity::Role,
) -> Result<()> {
    // Without the old role there is nothing to diff against.
    let Some(old) = old else {
        return Ok(());
    };

    let original = role_snapshot(old);
    let updated = role_snapshot(new);
    // Position shuffles touch every role but change nothing we show.
    if !has_visible_changes(&original, &updated) {
        return Ok(());
    }

    let action = Action::Role(RoleAction::Update);
    let Some(user_id) = find_actor(ctx, new.guild_id, action, new.id.get()).await else {
        return Ok(());
    };

    log_event(
        ctx,
        data,
        AdminEvent {
            guild_id: new.guild_id.get(),
            user_id,
            action: AdminAction::Update,
            target: role_target(new),
            diff: Some(DiffRequest::new(original, updated)),
        },
    )
    .await
}

pub async fn handle_role_delete(
    ctx: &Context,
    data: &Data,
    guild_id: serenity::GuildId,
    role_id: serenity::RoleId,
    removed: Option<&serenity::Role>,
) -> Result<()> {
    let target = match removed {
        Some(role) => role_target(role),
        None => LogTarget::new("role", role_id.get()),
    };

    let action = Action::Role(RoleAction::Delete);
    let Some(user_id) = find_actor(ctx, guild_id, action, role_id.get()).await else {
        return Ok(());
    };

    log_event(
        ctx,
        data,
        AdminEvent {
            guild_id: guild_id.get(),
            user_id,
            action: AdminAction::Delete,
            target,
            diff: None,
        },
    )
    .await
}

pub async fn handle_channel_create(
    ctx: &Context,
    data: &Data,
    channel: &serenity::GuildChannel,
) -> Result<()> {
    let Some(user_id) = find_actor(
        ctx,
        channel.guild_id,
        Action::Channel(ChannelAction::Create),
        channel.id.get(),
    )
    .await
    else {
        return Ok(());
    };

    log_event(
        ctx,
        data,
        AdminEvent {
            guild_id: channel.guild_id.get(),
            user_id,
            action: AdminAction::Create,
            target: channel_target(channel),
            diff: None,
        },
    )
    .await
}

pub async fn handle_channel_update(
    ctx: &Context,
    data: &Data,
    old: Option<&serenity::GuildChannel>,
    new: &serenity::GuildChannel,
) -> Result<()> {
    let Some(old) = old else {
        return Ok(());
    };

    let original = channel_snapshot(old)?;
    let updated = channel_snapshot(new)?;
    if !has_visible_changes(&original, &updated) {
        return Ok(());
    }

    // Overwrite edits are logged under their own audit log actions.
    let mut user_id = None;
    for action in [
        Action::Channel(ChannelAction::Update),
        Action::ChannelOverwrite(ChannelOverwriteAction::Create),
        Action::ChannelOverwrite(ChannelOverwriteAction::Update),
        Action::ChannelOverwrite(ChannelOverwriteAction::Delete),
    ] {
        user_id = find_actor(ctx, new.guild_id, action, new.id.get()).await;
        if user_id.is_some() {
            break;
        }
    }
    let Some(user_id) = user_id else {
        return Ok(());
    };

    log_event(
        ctx,
        data,
        AdminEvent {
            guild_id: new.guild_id.get(),
            user_id,
            action: AdminAction::Update,
            target: channel_target(new),
            diff: Some(DiffRequest::new(original, updated)),
        },
    )
    .await
}

pub async fn handle_channel_delete(
    ctx: &Context,
    data: &Data,
    channel: &serenity::GuildChannel,
) -> Result<()> {
    let Some(user_id) = find_actor(
        ctx,
        channel.guild_id,
        Action::Channel(ChannelAction::Delete),
        channel.id.get(),
    )
    .await
    else {
        return Ok(());
    };

    log_event(
        ctx,
        data,
        AdminEvent {
            guild_id: channel.guild_id.get(),
            user_id,
            action: AdminAction::Delete,
            target: channel_target(channel),
            diff: None,
        },
    )
    .await
}

async fn log_event(ctx: &Context, data: &Data, event: AdminEvent) -> Result<()> {
    let platform = SerenityPlatform::from_context(ctx);
    let guild_id = event.guild_id;
    if let Some(sent) = data.admin_log.log_admin_event(&platform, event).await? {
        tracing::debug!(
            guild_id,
            channel_id = sent.channel_id,
            message_id = sent.message_id,
            "Posted admin log entry"
        );
    }
    Ok(())
}

/// The user behind the audit log entry for `target_id` that this gateway
/// event came from.
///
/// `None` when the bot can't read the audit log or no recent entry matches.
async fn find_actor(
    ctx: &Context,
    guild_id: serenity::GuildId,
    action: Action,
    target_id: u64,
) -> Option<u64> {
    let logs = match guild_id
        .audit_logs(&ctx.http, Some(action), None, None, Some(AUDIT_LOG_LOOKBACK))
        .await
    {
        Ok(logs) => logs,
        Err(e) => {
            tracing::debug!(guild_id = guild_id.get(), error = %e, "Could not read audit log");
            return None;
        }
    };

    let candidates = logs.entries.iter().map(|entry| AuditCandidate {
        target_id: entry.target_id.map(|id| id.get()),
        user_id: entry.user_id.get(),
        created_at: *entry.id.created_at(),
    });
    let actor = pick_actor(candidates, target_id, Utc::now());
    if actor.is_none() {
        tracing::debug!(guild_id = guild_id.get(), target_id, "No recent audit log entry");
    }
    actor
}

/// The parts of an audit log entry needed to attribute a change.
#[derive(Debug, Clone, Copy)]
struct AuditCandidate {
    target_id: Option<u64>,
    user_id: u64,
    created_at: DateTime<Utc>,
}

/// First entry (newest first, as Discord returns them) for `target_id`
/// created within `AUDIT_LOG_MAX_AGE_SECS` of `now`.
fn pick_actor(
    candidates: impl IntoIterator<Item = AuditCandidate>,
    target_id: u64,
    now: DateTime<Utc>,
) -> Option<u64> {
    candidates
        .into_iter()
        .filter(|c| c.target_id == Some(target_id))
        .find(|c| (now - c.created_at).num_seconds().abs() <= AUDIT_LOG_MAX_AGE_SECS)
        .map(|c| c.user_id)
}

fn has_visible_changes(original: &Snapshot, updated: &Snapshot) -> bool {
    !make_diff(&DiffRequest::new(original.clone(), updated.clone())).is_empty()
}

fn role_target(role: &serenity::Role) -> LogTarget {
    LogTarget::new("role", role.id.get()).named(role.name.clone())
}

fn channel_target(channel: &serenity::GuildChannel) -> LogTarget {
    LogTarget::new("channel", channel.id.get()).named(channel.name.clone())
}
