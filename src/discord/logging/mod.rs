// Discord side of the admin log: the serenity platform adapter, embed
// formatting, gateway event handlers and the `/settings` commands.

pub mod commands;
pub mod events;
pub mod formatter;
pub mod platform;
pub mod snapshots;
