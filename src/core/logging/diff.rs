//! Renders the difference between two snapshots as embed fields.
//!
//! Nested values are flattened into dotted paths (`permissionOverwrites.123.allow`)
//! after normalisation, so keyed collections diff by element id.

use super::logging_models::{DiffRequest, EmbedField};
use super::snapshot::{Snapshot, SnapshotValue};

/// Field that never shows up in the rendered diff.
///
/// Timestamps are skipped wholesale; this mirrors a limitation of the
/// diffing the admin log has always had rather than a product decision.
pub const TIMESTAMP_FIELD: &str = "createdAt";

const FENCE: &str = "```";
const ZERO_WIDTH_SPACE: char = '\u{200b}';

#[derive(Debug, Clone, PartialEq)]
pub struct FieldChange {
    pub path: String,
    pub from: Option<SnapshotValue>,
    pub to: Option<SnapshotValue>,
}

#[allow(dead_code)]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedDiff {
    pub from: Option<String>,
    pub to: Option<String>,
}

/// Every leaf path whose value differs between the two snapshots.
///
/// Paths are reported in the order they appear in `original`, followed by
/// paths that only exist in `updated`.
pub fn compute_diff(original: &Snapshot, updated: &Snapshot) -> Vec<FieldChange> {
    let before = flatten(&original.normalize());
    let after = flatten(&updated.normalize());

    let mut changes = Vec::new();
    for (path, from) in &before {
        let to = lookup(&after, path);
        if to != Some(from) {
            changes.push(FieldChange {
                path: path.clone(),
                from: Some(from.clone()),
                to: to.cloned(),
            });
        }
    }
    for (path, to) in &after {
        if lookup(&before, path).is_none() {
            changes.push(FieldChange {
                path: path.clone(),
                from: None,
                to: Some(to.clone()),
            });
        }
    }
    changes
}

/// Build one inline `diff` code block field per changed path.
pub fn make_diff(request: &DiffRequest) -> Vec<EmbedField> {
    compute_diff(&request.original, &request.updated)
        .into_iter()
        .filter(|change| !is_timestamp_path(&change.path))
        .map(|change| {
            let from = diff_line('-', change.from.as_ref());
            let to = diff_line('+', change.to.as_ref());
            EmbedField {
                name: change.path,
                value: format!(
                    "{}diff\n{}\n{}",
                    FENCE,
                    clean_code_block_content(&(from + &to)),
                    FENCE
                ),
                inline: true,
            }
        })
        .collect()
}

/// Read a rendered diff block back into its before/after text.
///
/// Newlines stay escaped as the two characters `\n`.
#[allow(dead_code)]
pub fn parse_diff_block(block: &str) -> Option<ParsedDiff> {
    let body = block.strip_prefix("```diff\n")?.strip_suffix(FENCE)?;
    let body = restore_code_block_content(body);

    let mut parsed = ParsedDiff {
        from: None,
        to: None,
    };
    for line in body.lines() {
        if let Some(from) = line.strip_prefix("- ") {
            parsed.from = Some(from.to_string());
        } else if let Some(to) = line.strip_prefix("+ ") {
            parsed.to = Some(to.to_string());
        }
    }
    Some(parsed)
}

/// Stop user content from closing the surrounding code block early.
///
/// A zero-width space goes between every pair of adjacent back-ticks, so no
/// run of back-ticks of any length survives.
pub fn clean_code_block_content(text: &str) -> String {
    let mut cleaned = String::with_capacity(text.len());
    let mut previous = None;
    for c in text.chars() {
        if c == '`' && previous == Some('`') {
            cleaned.push(ZERO_WIDTH_SPACE);
        }
        cleaned.push(c);
        previous = Some(c);
    }
    cleaned
}

/// Undo [`clean_code_block_content`].
fn restore_code_block_content(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    chars
        .iter()
        .enumerate()
        .filter(|&(i, &c)| {
            let between_ticks = c == ZERO_WIDTH_SPACE
                && i > 0
                && chars[i - 1] == '`'
                && chars.get(i + 1) == Some(&'`');
            !between_ticks
        })
        .map(|(_, &c)| c)
        .collect()
}

fn is_timestamp_path(path: &str) -> bool {
    path == TIMESTAMP_FIELD
        || path
            .strip_prefix(TIMESTAMP_FIELD)
            .is_some_and(|rest| rest.starts_with('.'))
}

// Only non-empty text is shown; other values leave the line out.
fn diff_line(prefix: char, value: Option<&SnapshotValue>) -> String {
    match value {
        Some(SnapshotValue::Text(text)) if !text.is_empty() => {
            format!("{} {}\n", prefix, text.replace('\n', "\\n"))
        }
        _ => String::new(),
    }
}

fn lookup<'a>(leaves: &'a [(String, SnapshotValue)], path: &str) -> Option<&'a SnapshotValue> {
    leaves
        .iter()
        .find(|(candidate, _)| candidate == path)
        .map(|(_, value)| value)
}

fn flatten(snapshot: &Snapshot) -> Vec<(String, SnapshotValue)> {
    let mut leaves = Vec::new();
    for (name, value) in snapshot.fields() {
        flatten_into(name.to_string(), value, &mut leaves);
    }
    leaves
}

fn flatten_into(path: String, value: &SnapshotValue, leaves: &mut Vec<(String, SnapshotValue)>) {
    match value {
        SnapshotValue::Object(nested) => {
            for (name, child) in nested.fields() {
                flatten_into(format!("{}.{}", path, name), child, leaves);
            }
        }
        SnapshotValue::Keyed(elements) => {
            for (id, child) in elements {
                flatten_into(format!("{}.{}", path, id), child, leaves);
            }
        }
        SnapshotValue::List(items) => {
            for (index, child) in items.iter().enumerate() {
                flatten_into(format!("{}.{}", path, index), child, leaves);
            }
        }
        leaf => leaves.push((path, leaf.clone())),
    }
}
