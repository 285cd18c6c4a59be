// Snapshots of serenity roles and channels for the admin log diff.
//
// Values are rendered as text because only text shows up in a diff block.

use crate::core::logging::{AdminLogError, Snapshot, TIMESTAMP_FIELD};
use poise::serenity_prelude as serenity;
use serde::Serialize;

pub fn role_snapshot(role: &serenity::Role) -> Snapshot {
    Snapshot::new()
        .text("name", role.name.clone())
        .text("colour", format!("#{}", role.colour.hex()))
        .text("hoist", yes_no(role.hoist))
        .text("mentionable", yes_no(role.mentionable))
        .text("permissions", permission_names(role.permissions))
        .with(TIMESTAMP_FIELD, *role.id.created_at())
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ChannelView {
    name: String,
    kind: String,
    topic: String,
    nsfw: String,
    slowmode: String,
    parent: String,
    permission_overwrites: Vec<OverwriteView>,
}

#[derive(Serialize)]
struct OverwriteView {
    id: String,
    #[serde(rename = "type")]
    kind: &'static str,
    allow: String,
    deny: String,
}

pub fn channel_snapshot(channel: &serenity::GuildChannel) -> Result<Snapshot, AdminLogError> {
    let view = ChannelView {
        name: channel.name.clone(),
        kind: channel.kind.name().to_string(),
        topic: channel.topic.clone().unwrap_or_default(),
        nsfw: yes_no(channel.nsfw),
        slowmode: channel
            .rate_limit_per_user
            .filter(|secs| *secs > 0)
            .map(|secs| format!("{}s", secs))
            .unwrap_or_default(),
        parent: channel
            .parent_id
            .map(|id| id.to_string())
            .unwrap_or_default(),
        permission_overwrites: channel
            .permission_overwrites
            .iter()
            .filter_map(overwrite_view)
            .collect(),
    };

    Snapshot::from_serializable(&view, &["permissionOverwrites"])
}

fn overwrite_view(overwrite: &serenity::PermissionOverwrite) -> Option<OverwriteView> {
    let (id, kind) = match overwrite.kind {
        serenity::PermissionOverwriteType::Member(user_id) => (user_id.get(), "member"),
        serenity::PermissionOverwriteType::Role(role_id) => (role_id.get(), "role"),
        _ => return None,
    };

    Some(OverwriteView {
        id: id.to_string(),
        kind,
        allow: permission_names(overwrite.allow),
        deny: permission_names(overwrite.deny),
    })
}

fn permission_names(permissions: serenity::Permissions) -> String {
    permissions.get_permission_names().join(", ")
}

fn yes_no(value: bool) -> String {
    let text = if value { "yes" } else { "no" };
    text.to_string()
}
