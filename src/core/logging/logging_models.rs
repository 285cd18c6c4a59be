// Admin log domain models.
//
// These are pure domain types with no Discord dependencies.
// The Discord layer converts `LogEmbed` into a serenity embed.

use super::snapshot::Snapshot;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Per-guild settings the admin log reads before posting anything.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuildSettings {
    pub guild_id: u64,
    /// Channel admin events are posted to. `None` disables the admin log.
    pub log_channel: Option<u64>,
    pub locale: String,
    pub footer: Option<String>,
}

impl GuildSettings {
    pub fn new(guild_id: u64, locale: impl Into<String>) -> Self {
        Self {
            guild_id,
            log_channel: None,
            locale: locale.into(),
            footer: None,
        }
    }

    /// Snapshot used when a settings change is itself logged.
    ///
    /// Channels are plain ids: mentions don't render inside a diff block.
    pub fn to_snapshot(&self) -> Snapshot {
        Snapshot::new()
            .text(
                "logChannel",
                self.log_channel.map(|id| id.to_string()).unwrap_or_default(),
            )
            .text("locale", self.locale.clone())
            .text("footer", self.footer.clone().unwrap_or_default())
    }
}

/// What happened to the target.
///
/// `Other` carries the raw action name so callers with bespoke actions
/// still get a localised verb lookup instead of an error.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AdminAction {
    Create,
    Update,
    Delete,
    Other(String),
}

impl AdminAction {
    /// Never fails: anything that isn't a known action becomes `Other`.
    #[allow(dead_code)]
    pub fn parse(action: &str) -> Self {
        match action {
            "create" => AdminAction::Create,
            "update" => AdminAction::Update,
            "delete" => AdminAction::Delete,
            other => AdminAction::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            AdminAction::Create => "create",
            AdminAction::Update => "update",
            AdminAction::Delete => "delete",
            AdminAction::Other(name) => name,
        }
    }

    pub fn colour(&self) -> LogColour {
        match self {
            AdminAction::Create => LogColour::Success,
            AdminAction::Update => LogColour::Warning,
            AdminAction::Delete => LogColour::Danger,
            AdminAction::Other(_) => LogColour::Default,
        }
    }

    pub fn verb_key(&self) -> String {
        format!("log.admin.verb.{}", self.as_str())
    }
}

impl fmt::Display for AdminAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Embed colours used by the admin log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogColour {
    Success,
    Warning,
    Danger,
    Default,
}

impl LogColour {
    pub fn hex(self) -> u32 {
        match self {
            LogColour::Success => 0x57F287, // Green
            LogColour::Warning => 0xE67E22, // Orange
            LogColour::Danger => 0xED4245,  // Red
            LogColour::Default => 0x000000,
        }
    }
}

/// The administrative object an event is about (a role, a channel, the settings...).
#[derive(Debug, Clone, PartialEq)]
pub struct LogTarget {
    /// Type tag, also used to build locale keys (`log.admin.title.target.<kind>`).
    pub kind: String,
    pub id: String,
    pub name: Option<String>,
}

impl LogTarget {
    pub fn new(kind: impl Into<String>, id: impl ToString) -> Self {
        Self {
            kind: kind.into(),
            id: id.to_string(),
            name: None,
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.id)
    }
}

/// Before/after pair of the same entity.
#[derive(Debug, Clone, PartialEq)]
pub struct DiffRequest {
    pub original: Snapshot,
    pub updated: Snapshot,
}

impl DiffRequest {
    pub fn new(original: Snapshot, updated: Snapshot) -> Self {
        Self { original, updated }
    }
}

#[derive(Debug, Clone)]
pub struct AdminEvent {
    pub guild_id: u64,
    pub user_id: u64,
    pub action: AdminAction,
    pub target: LogTarget,
    pub diff: Option<DiffRequest>,
}

/// The acting user, as fetched from the platform.
#[derive(Debug, Clone, PartialEq)]
pub struct AuditUser {
    pub id: u64,
    pub username: String,
    /// `name#discriminator`, or just the name for migrated accounts.
    pub tag: String,
    pub avatar_url: Option<String>,
}

/// A channel that is present in the platform's local cache.
#[derive(Debug, Clone, PartialEq)]
pub struct CachedChannel {
    pub guild_id: u64,
    pub channel_id: u64,
    pub name: String,
}

/// Receipt returned after the log message was posted.
#[derive(Debug, Clone, PartialEq)]
pub struct SentLog {
    pub channel_id: u64,
    pub message_id: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EmbedAuthor {
    pub name: String,
    pub icon_url: Option<String>,
}

/// Platform-agnostic embed description.
#[derive(Debug, Clone, PartialEq)]
pub struct LogEmbed {
    pub colour: LogColour,
    pub author: Option<EmbedAuthor>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub fields: Vec<EmbedField>,
    pub footer: Option<String>,
}

impl LogEmbed {
    pub fn new(colour: LogColour) -> Self {
        Self {
            colour,
            author: None,
            title: None,
            description: None,
            fields: Vec::new(),
            footer: None,
        }
    }
}
