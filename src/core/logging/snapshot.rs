//! Snapshots of administrative objects, taken before and after a change.
//!
//! A snapshot is an ordered list of named fields. Sequences come in two
//! flavours and the caller picks which one when building the snapshot:
//!
//! - [`SnapshotValue::Keyed`]: every element carries an id. Normalising turns
//!   the sequence into an id-keyed object so reordering elements is not a change.
//! - [`SnapshotValue::List`]: compared by position.

use super::logging_service::AdminLogError;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Number, Value};

#[derive(Debug, Clone, PartialEq)]
pub enum SnapshotValue {
    Null,
    Bool(bool),
    Number(Number),
    Text(String),
    Timestamp(DateTime<Utc>),
    Object(Snapshot),
    /// Elements keyed by their id, in insertion order.
    Keyed(Vec<(String, SnapshotValue)>),
    List(Vec<SnapshotValue>),
}

impl SnapshotValue {
    fn normalized(&self) -> SnapshotValue {
        match self {
            SnapshotValue::Object(snapshot) => SnapshotValue::Object(snapshot.normalize()),
            SnapshotValue::Keyed(elements) => {
                let mut keyed = Snapshot::new();
                for (id, element) in elements {
                    keyed = keyed.with(id.clone(), element.normalized());
                }
                SnapshotValue::Object(keyed)
            }
            SnapshotValue::List(items) => {
                SnapshotValue::List(items.iter().map(SnapshotValue::normalized).collect())
            }
            leaf => leaf.clone(),
        }
    }

    fn from_json(value: &Value) -> SnapshotValue {
        match value {
            Value::Null => SnapshotValue::Null,
            Value::Bool(b) => SnapshotValue::Bool(*b),
            Value::Number(n) => SnapshotValue::Number(n.clone()),
            Value::String(s) => SnapshotValue::Text(s.clone()),
            Value::Array(items) => {
                SnapshotValue::List(items.iter().map(SnapshotValue::from_json).collect())
            }
            Value::Object(map) => {
                let mut snapshot = Snapshot::new();
                for (key, value) in map {
                    snapshot = snapshot.with(key.clone(), SnapshotValue::from_json(value));
                }
                SnapshotValue::Object(snapshot)
            }
        }
    }
}

impl From<&str> for SnapshotValue {
    fn from(value: &str) -> Self {
        SnapshotValue::Text(value.to_string())
    }
}

impl From<String> for SnapshotValue {
    fn from(value: String) -> Self {
        SnapshotValue::Text(value)
    }
}

impl From<bool> for SnapshotValue {
    fn from(value: bool) -> Self {
        SnapshotValue::Bool(value)
    }
}

impl From<u64> for SnapshotValue {
    fn from(value: u64) -> Self {
        SnapshotValue::Number(Number::from(value))
    }
}

impl From<DateTime<Utc>> for SnapshotValue {
    fn from(value: DateTime<Utc>) -> Self {
        SnapshotValue::Timestamp(value)
    }
}

impl From<Snapshot> for SnapshotValue {
    fn from(value: Snapshot) -> Self {
        SnapshotValue::Object(value)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    fields: Vec<(String, SnapshotValue)>,
}

impl Snapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a field, replacing any previous value with the same name.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<SnapshotValue>) -> Self {
        let name = name.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(existing, _)| *existing == name) {
            Some(slot) => slot.1 = value,
            None => self.fields.push((name, value)),
        }
        self
    }

    pub fn text(self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.with(name, SnapshotValue::Text(value.into()))
    }

    #[allow(dead_code)]
    pub fn keyed<I, K>(self, name: impl Into<String>, elements: I) -> Self
    where
        I: IntoIterator<Item = (K, Snapshot)>,
        K: ToString,
    {
        let elements = elements
            .into_iter()
            .map(|(id, element)| (id.to_string(), SnapshotValue::Object(element)))
            .collect();
        self.with(name, SnapshotValue::Keyed(elements))
    }

    #[allow(dead_code)]
    pub fn list<I, V>(self, name: impl Into<String>, items: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<SnapshotValue>,
    {
        let items = items.into_iter().map(Into::into).collect();
        self.with(name, SnapshotValue::List(items))
    }

    pub fn get(&self, name: &str) -> Option<&SnapshotValue> {
        self.fields
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, value)| value)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &SnapshotValue)> {
        self.fields.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Replace every keyed collection with an object keyed by element id.
    pub fn normalize(&self) -> Snapshot {
        Snapshot {
            fields: self
                .fields
                .iter()
                .map(|(name, value)| (name.clone(), value.normalized()))
                .collect(),
        }
    }

    /// Build a snapshot from a JSON object.
    ///
    /// Top-level arrays named in `keyed_fields` become keyed collections using
    /// each element's `id` member; every other array stays positional. A named
    /// array with an element that has no id is left positional too.
    pub fn from_json(value: &Value, keyed_fields: &[&str]) -> Result<Snapshot, AdminLogError> {
        let map = value.as_object().ok_or_else(|| {
            AdminLogError::InvalidSnapshot("snapshot root must be a JSON object".to_string())
        })?;

        let mut snapshot = Snapshot::new();
        for (key, value) in map {
            let field = match value {
                Value::Array(items) if keyed_fields.contains(&key.as_str()) => {
                    match keyed_elements(items) {
                        Some(elements) => SnapshotValue::Keyed(elements),
                        None => {
                            tracing::warn!(
                                field = %key,
                                "Keyed snapshot field has elements without an id, diffing by position"
                            );
                            SnapshotValue::from_json(value)
                        }
                    }
                }
                other => SnapshotValue::from_json(other),
            };
            snapshot = snapshot.with(key.clone(), field);
        }
        Ok(snapshot)
    }

    pub fn from_serializable<T: Serialize>(
        value: &T,
        keyed_fields: &[&str],
    ) -> Result<Snapshot, AdminLogError> {
        let json = serde_json::to_value(value)
            .map_err(|e| AdminLogError::InvalidSnapshot(e.to_string()))?;
        Self::from_json(&json, keyed_fields)
    }
}

/// `None` as soon as one element has no usable id.
fn keyed_elements(items: &[Value]) -> Option<Vec<(String, SnapshotValue)>> {
    items
        .iter()
        .map(|item| {
            let id = match item.get("id")? {
                Value::String(id) if !id.is_empty() => id.clone(),
                Value::Number(id) => id.to_string(),
                _ => return None,
            };
            Some((id, SnapshotValue::from_json(item)))
        })
        .collect()
}
