//! Record model
//!
//! A record is one candidate entity (typically a lead) parsed from an
//! uploaded payload. Records are schemaless field maps; the pipeline only
//! looks at the natural key, the display name, and the required fields.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A single inbound record: field name to JSON value
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(Map<String, Value>);

impl Record {
    /// Create an empty record
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a record from a JSON value
    ///
    /// Returns `None` when the value is not a JSON object.
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(map) => Some(Self(map)),
            _ => None,
        }
    }

    /// Set a field, returning the record for chaining
    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(field.into(), value.into());
        self
    }

    /// Get a raw field value
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    /// Check whether a field is present (even if null)
    pub fn contains_field(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    /// Extract the natural key used for deduplication
    ///
    /// Strings are trimmed and numbers are rendered in decimal form. Missing,
    /// null, blank and non-scalar values yield `None`.
    pub fn natural_key(&self, key_field: &str) -> Option<String> {
        match self.0.get(key_field)? {
            Value::String(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    None
                } else {
                    Some(trimmed.to_string())
                }
            }
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    /// Human-readable label for reports (empty when absent)
    pub fn display_name(&self, display_field: &str) -> String {
        match self.0.get(display_field) {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Null) | None => String::new(),
            Some(other) => other.to_string(),
        }
    }

    /// Stamp the run tag onto the record
    ///
    /// This is the only mutation the ingestion pipeline performs.
    pub fn set_tag(&mut self, tag_field: &str, tag: &str) {
        self.0
            .insert(tag_field.to_string(), Value::String(tag.to_string()));
    }

    /// Field names present on the record
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Number of fields
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if the record has no fields
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Borrow the record as a JSON object
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Serialize the record as a compact JSON document
    pub fn to_json_string(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.0)
    }
}

impl From<Map<String, Value>> for Record {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl From<Record> for Value {
    fn from(record: Record) -> Self {
        Value::Object(record.0)
    }
}
