use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Event time in milliseconds since epoch.
pub type EventTime = i64;

/// Identifies the ordered stream a record belongs to (e.g. a station or location).
pub type PartitionKey = String;

/// A single sensor reading as delivered by an ingestion adapter.
///
/// Numeric readings are the normal case; anything else is kept as text so the
/// reducer can reject it per field instead of the adapter dropping the record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Number(f64),
    Text(String),
}

impl FieldValue {
    /// Return the value as a finite number, or `None` for text, NaN and infinities.
    pub fn as_finite(&self) -> Option<f64> {
        match self {
            FieldValue::Number(v) if v.is_finite() => Some(*v),
            _ => None,
        }
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Number(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

/// A timestamped set of named sensor readings. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub timestamp: EventTime,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<PartitionKey>,
    pub fields: BTreeMap<String, FieldValue>,
}

impl Record {
    /// Create a record with no fields and no partition key.
    pub fn new(timestamp: EventTime) -> Self {
        Self {
            timestamp,
            key: None,
            fields: BTreeMap::new(),
        }
    }

    /// Builder-style helper that adds one field.
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// Builder-style helper that sets the partition key.
    pub fn with_key(mut self, key: impl Into<PartitionKey>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub fn field(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }
}
