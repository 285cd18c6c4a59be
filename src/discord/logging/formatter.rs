use crate::core::logging::{EmbedField, LogEmbed};
use poise::serenity_prelude::{CreateEmbed, CreateEmbedAuthor, CreateEmbedFooter};

// Discord rejects embeds past these limits.
const MAX_FIELDS: usize = 25;
const MAX_FIELD_NAME: usize = 256;
const MAX_FIELD_VALUE: usize = 1024;
const MAX_TITLE: usize = 256;
const MAX_AUTHOR: usize = 256;
const MAX_DESCRIPTION: usize = 4096;
const MAX_FOOTER: usize = 2048;
// Shared by every embed in one message.
const MAX_MESSAGE_CHARS: usize = 6000;
// Below this a shortened field is not worth keeping.
const MIN_FIELD_VALUE: usize = 32;

/// Render the embeds of one log message, within Discord's per-embed and
/// per-message limits.
pub fn format_log_message(embeds: &[LogEmbed]) -> Vec<CreateEmbed> {
    fit_message(embeds).iter().map(build_embed).collect()
}

fn build_embed(embed: &LogEmbed) -> CreateEmbed {
    let mut out = CreateEmbed::default()
        .color(embed.colour.hex())
        .timestamp(poise::serenity_prelude::Timestamp::now());

    if let Some(author) = &embed.author {
        let mut builder = CreateEmbedAuthor::new(&author.name);
        if let Some(url) = &author.icon_url {
            builder = builder.icon_url(url);
        }
        out = out.author(builder);
    }

    if let Some(title) = &embed.title {
        out = out.title(title);
    }

    if let Some(description) = &embed.description {
        out = out.description(description);
    }

    out = out.fields(
        embed
            .fields
            .iter()
            .map(|field| (field.name.clone(), field.value.clone(), field.inline)),
    );

    if let Some(footer) = &embed.footer {
        out = out.footer(CreateEmbedFooter::new(footer));
    }

    out
}

/// Apply the per-embed limits to a single embed.
fn clamp_embed(embed: &LogEmbed) -> LogEmbed {
    let mut out = LogEmbed::new(embed.colour);
    out.author = embed.author.clone().map(|mut author| {
        author.name = truncate(&author.name, MAX_AUTHOR);
        author
    });
    out.title = embed.title.as_deref().map(|t| truncate(t, MAX_TITLE));
    out.description = embed
        .description
        .as_deref()
        .map(|d| truncate(d, MAX_DESCRIPTION));
    out.fields = embed
        .fields
        .iter()
        .take(MAX_FIELDS)
        .map(|field| EmbedField {
            name: truncate(&field.name, MAX_FIELD_NAME),
            value: fit_field_value(&field.value, MAX_FIELD_VALUE),
            inline: field.inline,
        })
        .collect();
    out.footer = embed.footer.as_deref().map(|f| truncate(f, MAX_FOOTER));
    out
}

/// Clamp every embed, then spend the message budget: headers of all embeds
/// first, then fields in order. Fields that no longer fit are shortened or
/// dropped.
fn fit_message(embeds: &[LogEmbed]) -> Vec<LogEmbed> {
    let mut fitted: Vec<LogEmbed> = embeds.iter().map(clamp_embed).collect();
    let mut budget = MAX_MESSAGE_CHARS;

    for embed in &mut fitted {
        embed.author = embed.author.take().and_then(|mut author| {
            author.name = spend(&author.name, &mut budget)?;
            Some(author)
        });
        embed.title = embed.title.take().and_then(|t| spend(&t, &mut budget));
        embed.description = embed.description.take().and_then(|d| spend(&d, &mut budget));
        embed.footer = embed.footer.take().and_then(|f| spend(&f, &mut budget));
    }

    let mut dropped = 0;
    for embed in &mut fitted {
        for field in std::mem::take(&mut embed.fields) {
            let name_len = field.name.chars().count();
            let value_len = field.value.chars().count();
            if name_len + value_len <= budget {
                budget -= name_len + value_len;
                embed.fields.push(field);
            } else if budget >= name_len + MIN_FIELD_VALUE {
                let value = fit_field_value(&field.value, budget - name_len);
                budget -= name_len + value.chars().count();
                embed.fields.push(EmbedField { value, ..field });
            } else {
                dropped += 1;
            }
        }
    }

    if dropped > 0 {
        tracing::warn!(dropped, "Admin log message too long, dropped fields");
    }
    fitted
}

/// Take `text` out of the budget, shortened to what is left. `None` once the
/// budget is gone.
fn spend(text: &str, budget: &mut usize) -> Option<String> {
    if *budget == 0 {
        return None;
    }
    let text = truncate(text, *budget);
    *budget -= text.chars().count();
    Some(text)
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(max_chars.saturating_sub(1)).collect();
    cut.push('…');
    cut
}

/// Shorten a field value, keeping a diff code block closed.
fn fit_field_value(value: &str, max_chars: usize) -> String {
    if value.chars().count() <= max_chars {
        return value.to_string();
    }
    match value.strip_suffix("\n```") {
        Some(body) if value.starts_with("```") && max_chars > 4 => {
            format!("{}\n```", truncate(body, max_chars - 4))
        }
        _ => truncate(value, max_chars),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::logging::{make_diff, DiffRequest, EmbedAuthor, LogColour, Snapshot};

    fn message_chars(embeds: &[LogEmbed]) -> usize {
        embeds
            .iter()
            .map(|embed| {
                let header = [
                    embed.author.as_ref().map(|a| a.name.as_str()),
                    embed.title.as_deref(),
                    embed.description.as_deref(),
                    embed.footer.as_deref(),
                ];
                let header: usize = header.iter().flatten().map(|t| t.chars().count()).sum();
                let fields: usize = embed
                    .fields
                    .iter()
                    .map(|f| f.name.chars().count() + f.value.chars().count())
                    .sum();
                header + fields
            })
            .sum()
    }

    fn summary() -> LogEmbed {
        let mut embed = LogEmbed::new(LogColour::Warning);
        embed.author = Some(EmbedAuthor {
            name: "alice".to_string(),
            icon_url: None,
        });
        embed.title = Some("Channel updated".to_string());
        embed.description = Some("<@1> updated a channel".to_string());
        embed.footer = Some("Audit".to_string());
        embed
    }

    #[test]
    fn test_short_values_are_untouched() {
        assert_eq!(
            fit_field_value("```diff\n+ a\n\n```", MAX_FIELD_VALUE),
            "```diff\n+ a\n\n```"
        );
        assert_eq!(truncate("Role", MAX_TITLE), "Role");
    }

    #[test]
    fn test_long_diff_block_stays_closed() {
        let value = format!("```diff\n+ {}\n\n```", "x".repeat(2000));
        let fitted = fit_field_value(&value, MAX_FIELD_VALUE);

        assert_eq!(fitted.chars().count(), MAX_FIELD_VALUE);
        assert!(fitted.starts_with("```diff\n"));
        assert!(fitted.ends_with("…\n```"));
    }

    #[test]
    fn test_long_plain_value_is_truncated() {
        let fitted = fit_field_value(&"é".repeat(1500), MAX_FIELD_VALUE);
        assert_eq!(fitted.chars().count(), MAX_FIELD_VALUE);
        assert!(fitted.ends_with('…'));
    }

    #[test]
    fn test_small_message_is_unchanged() {
        let mut changes = LogEmbed::new(LogColour::Warning);
        changes.title = Some("Changes".to_string());
        changes.fields = make_diff(&DiffRequest::new(
            Snapshot::new().text("name", "general"),
            Snapshot::new().text("name", "chat"),
        ));

        let embeds = vec![summary(), changes];
        assert_eq!(fit_message(&embeds), embeds);
    }

    #[test]
    fn test_large_diff_fits_message_budget() {
        let mut original = Snapshot::new();
        let mut updated = Snapshot::new();
        for i in 0..10 {
            original = original.text(format!("field{}", i), "a".repeat(800));
            updated = updated.text(format!("field{}", i), "b".repeat(800));
        }
        let mut changes = LogEmbed::new(LogColour::Warning);
        changes.title = Some("Changes".to_string());
        changes.fields = make_diff(&DiffRequest::new(original, updated));
        let embeds = vec![summary(), changes];
        assert!(message_chars(&embeds) > MAX_MESSAGE_CHARS);

        let fitted = fit_message(&embeds);

        assert!(message_chars(&fitted) <= MAX_MESSAGE_CHARS);
        // The summary survives whole and the first change is kept.
        assert_eq!(fitted[0], embeds[0]);
        assert_eq!(fitted[1].title.as_deref(), Some("Changes"));
        assert_eq!(fitted[1].fields[0].name, "field0");
        for field in &fitted[1].fields {
            assert!(field.value.starts_with("```diff\n"));
            assert!(field.value.ends_with("\n```"));
        }
    }

    #[test]
    fn test_oversized_headers_leave_no_room_for_fields() {
        let mut embed = summary();
        embed.description = Some("d".repeat(5000));
        embed.footer = Some("f".repeat(3000));
        embed.fields = vec![EmbedField {
            name: "name".to_string(),
            value: "value".to_string(),
            inline: true,
        }];

        let fitted = fit_message(&[embed]);

        assert!(message_chars(&fitted) <= MAX_MESSAGE_CHARS);
        assert_eq!(
            fitted[0].description.as_ref().map(|d| d.chars().count()),
            Some(MAX_DESCRIPTION)
        );
        assert!(fitted[0].fields.is_empty());
    }
}
