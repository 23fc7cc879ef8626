//! Records, per-field slots, and the read-only view steps see.

use indexmap::IndexMap;
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::borrow::Cow;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// Renders a field value the way steps read it.
///
/// Absent and `null` values read as the empty string, strings read as
/// themselves, and any other scalar is rendered as JSON text.
#[must_use]
pub fn value_text(value: Option<&Value>) -> Cow<'_, str> {
    match value {
        None | Some(Value::Null) => Cow::Borrowed(""),
        Some(Value::String(s)) => Cow::Borrowed(s.as_str()),
        Some(other) => Cow::Owned(other.to_string()),
    }
}

/// Anything a form can read its input fields from.
pub trait RecordSource {
    /// Looks up the raw value for a field.
    fn get_value(&self, field: &str) -> Option<&Value>;
}

impl RecordSource for serde_json::Map<String, Value> {
    fn get_value(&self, field: &str) -> Option<&Value> {
        self.get(field)
    }
}

impl<S: std::hash::BuildHasher> RecordSource for HashMap<String, Value, S> {
    fn get_value(&self, field: &str) -> Option<&Value> {
        self.get(field)
    }
}

impl RecordSource for BTreeMap<String, Value> {
    fn get_value(&self, field: &str) -> Option<&Value> {
        self.get(field)
    }
}

impl<S: std::hash::BuildHasher> RecordSource for IndexMap<String, Value, S> {
    fn get_value(&self, field: &str) -> Option<&Value> {
        self.get(field)
    }
}

impl RecordSource for Record {
    fn get_value(&self, field: &str) -> Option<&Value> {
        self.get(field)
    }
}

/// An ordered mapping from field name to value.
///
/// Cleaned records returned by a form hold exactly the form's declared
/// fields, in declaration order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    entries: IndexMap<String, Value>,
}

impl Record {
    /// Creates an empty record.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a field, keeping the original position on replace.
    pub fn insert(&mut self, field: impl Into<String>, value: Value) {
        self.entries.insert(field.into(), value);
    }

    /// Builder-style insert.
    #[must_use]
    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(field, value.into());
        self
    }

    /// Returns the value of a field.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.entries.get(field)
    }

    /// Returns the value of a field as text (see [`value_text`]).
    #[must_use]
    pub fn text(&self, field: &str) -> Cow<'_, str> {
        value_text(self.get(field))
    }

    /// Returns true if the record holds the field.
    #[must_use]
    pub fn contains(&self, field: &str) -> bool {
        self.entries.contains_key(field)
    }

    /// Returns the field names in order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Iterates over `(field, value)` pairs in order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// Returns the number of fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the record has no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Converts into a JSON object.
    #[must_use]
    pub fn into_json(self) -> Value {
        Value::Object(self.entries.into_iter().collect())
    }
}

impl FromIterator<(String, Value)> for Record {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl From<serde_json::Map<String, Value>> for Record {
    fn from(map: serde_json::Map<String, Value>) -> Self {
        map.into_iter().collect()
    }
}

impl IntoIterator for Record {
    type Item = (String, Value);
    type IntoIter = indexmap::map::IntoIter<String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (field, value) in &self.entries {
            map.serialize_entry(field, value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Record {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        serde_json::Map::<String, Value>::deserialize(deserializer).map(Self::from)
    }
}

/// The working value of one field while its pipeline runs.
///
/// A slot is owned by exactly one pipeline, so a step can only ever write
/// the field it was scheduled for.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldSlot {
    value: Option<Value>,
}

impl FieldSlot {
    /// Creates a slot from an optional input value.
    #[must_use]
    pub fn new(value: Option<Value>) -> Self {
        Self { value }
    }

    /// Returns the raw value, if any.
    #[must_use]
    pub fn value(&self) -> Option<&Value> {
        self.value.as_ref()
    }

    /// Returns the value as text; absent reads as `""`.
    #[must_use]
    pub fn text(&self) -> Cow<'_, str> {
        value_text(self.value.as_ref())
    }

    /// Returns true if the field was never supplied and never written.
    #[must_use]
    pub fn is_absent(&self) -> bool {
        self.value.is_none()
    }

    /// Replaces the value.
    pub fn set(&mut self, value: Value) {
        self.value = Some(value);
    }

    /// Replaces the value with text.
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.value = Some(Value::String(text.into()));
    }

    /// Consumes the slot, mapping absent to `null`.
    #[must_use]
    pub fn into_value(self) -> Value {
        self.value.unwrap_or(Value::Null)
    }
}

/// A read-only snapshot of the projected input record.
///
/// Shared by every pipeline of one `process` call; cheap to clone.
#[derive(Debug, Clone, Default)]
pub struct RecordView {
    entries: Arc<IndexMap<String, Option<Value>>>,
}

impl RecordView {
    /// Projects `source` onto `fields`, dropping every other key.
    #[must_use]
    pub fn project<'a, S, I>(source: &S, fields: I) -> Self
    where
        S: RecordSource + ?Sized,
        I: IntoIterator<Item = &'a str>,
    {
        let entries: IndexMap<String, Option<Value>> = fields
            .into_iter()
            .map(|field| (field.to_string(), source.get_value(field).cloned()))
            .collect();
        Self {
            entries: Arc::new(entries),
        }
    }

    /// Returns the input value of a field, if present.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.entries.get(field).and_then(Option::as_ref)
    }

    /// Returns the input value of a field as text.
    #[must_use]
    pub fn text(&self, field: &str) -> Cow<'_, str> {
        value_text(self.get(field))
    }

    /// Returns true if the field is declared (present or not).
    #[must_use]
    pub fn is_declared(&self, field: &str) -> bool {
        self.entries.contains_key(field)
    }

    /// Returns the declared field names in order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Creates the initial slot for a field.
    #[must_use]
    pub fn slot(&self, field: &str) -> FieldSlot {
        FieldSlot::new(self.get(field).cloned())
    }

    /// Returns the number of declared fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no fields are declared.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
