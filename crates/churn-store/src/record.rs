//! Customer records and lookup keys

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::StoreError;
use crate::storage_traits::StoreResult;

/// Storage-internal row identifiers. They carry no feature meaning and are
/// stripped from every record handed back to callers.
pub const INTERNAL_ID_FIELDS: &[&str] = &["id", "_id"];

/// A validated identifier fragment: trimmed and non-empty.
///
/// Lookups take an `IdFragment` rather than a raw string, so a blank input is
/// rejected before any store is touched.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct IdFragment(String);

impl IdFragment {
    /// Trim `raw` and reject it if nothing is left.
    pub fn parse(raw: &str) -> StoreResult<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(StoreError::InvalidInput);
        }
        Ok(IdFragment(trimmed.to_string()))
    }

    /// The trimmed fragment, exactly as the caller typed it.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Lowercased form used for case-insensitive matching.
    pub fn folded(&self) -> String {
        self.0.to_lowercase()
    }

    /// Anchored, case-insensitive prefix test.
    pub fn matches(&self, identifier: &str) -> bool {
        identifier.to_lowercase().starts_with(&self.folded())
    }
}

impl std::fmt::Display for IdFragment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// An open-schema customer document.
///
/// Field values are whatever the store holds: strings, numbers, booleans or
/// nulls. Only the identifier field has meaning to this crate.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CustomerRecord {
    fields: Map<String, Value>,
}

impl CustomerRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a record from a JSON value. Anything but an object is rejected.
    pub fn from_value(value: Value) -> StoreResult<Self> {
        match value {
            Value::Object(fields) => Ok(Self { fields }),
            other => Err(StoreError::Serialization(format!(
                "customer record must be a JSON object, got {}",
                json_kind(&other)
            ))),
        }
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    /// The identifier under `field`, if present as a string.
    pub fn identifier(&self, field: &str) -> Option<&str> {
        self.fields.get(field).and_then(Value::as_str)
    }

    /// Remove storage-internal row identifiers.
    pub fn strip_internal_ids(mut self) -> Self {
        for key in INTERNAL_ID_FIELDS {
            self.fields.remove(*key);
        }
        self
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.fields)
    }
}

impl From<Map<String, Value>> for CustomerRecord {
    fn from(fields: Map<String, Value>) -> Self {
        Self { fields }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
