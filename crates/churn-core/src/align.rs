//! Feature alignment: open-schema customer record -> fixed-order feature row.
//!
//! Alignment never fails. A schema field that is absent or `null` takes the
//! default the training-time preprocessing used (`0` for numeric columns,
//! `""` for categorical ones), so a partially populated record still scores.
//! Fields the schema does not name are dropped.

use churn_store::CustomerRecord;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::schema::{FeatureKind, FeatureSchema};

/// Default for a missing numeric feature.
pub const NUMERIC_DEFAULT: f64 = 0.0;

/// Default for a missing categorical feature.
pub const CATEGORICAL_DEFAULT: &str = "";

/// A single aligned value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FeatureValue {
    Numeric(f64),
    Categorical(String),
}

impl FeatureValue {
    pub fn kind(&self) -> FeatureKind {
        match self {
            FeatureValue::Numeric(_) => FeatureKind::Numeric,
            FeatureValue::Categorical(_) => FeatureKind::Categorical,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FeatureValue::Numeric(v) => Some(*v),
            FeatureValue::Categorical(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FeatureValue::Categorical(s) => Some(s),
            FeatureValue::Numeric(_) => None,
        }
    }

    fn into_json(self) -> Value {
        match self {
            FeatureValue::Numeric(v) => serde_json::Number::from_f64(v)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            FeatureValue::Categorical(s) => Value::String(s),
        }
    }
}

/// A named feature in an aligned row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    pub name: String,
    pub value: FeatureValue,
}

/// A fixed-order row: every numeric feature, then every categorical feature,
/// each group in schema order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureRow {
    features: Vec<Feature>,
    numeric_len: usize,
}

impl FeatureRow {
    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn features(&self) -> &[Feature] {
        &self.features
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.features.iter().map(|f| f.name.as_str())
    }

    /// The numeric group.
    pub fn numeric(&self) -> &[Feature] {
        &self.features[..self.numeric_len]
    }

    /// The categorical group.
    pub fn categorical(&self) -> &[Feature] {
        &self.features[self.numeric_len..]
    }

    pub fn get(&self, name: &str) -> Option<&FeatureValue> {
        self.features
            .iter()
            .find(|f| f.name == name)
            .map(|f| &f.value)
    }

    /// Render the row back into a record holding only schema fields.
    pub fn to_record(&self) -> CustomerRecord {
        self.features
            .iter()
            .fold(CustomerRecord::new(), |record, f| {
                record.with(f.name.clone(), f.value.clone().into_json())
            })
    }
}

/// Map `record` onto `schema`.
pub fn align(record: &CustomerRecord, schema: &FeatureSchema) -> FeatureRow {
    let features = schema
        .columns()
        .map(|(name, kind)| {
            let raw = record.get(name);
            let value = match kind {
                FeatureKind::Numeric => FeatureValue::Numeric(numeric_value(raw)),
                FeatureKind::Categorical => FeatureValue::Categorical(categorical_value(raw)),
            };
            Feature {
                name: name.to_string(),
                value,
            }
        })
        .collect();

    FeatureRow {
        features,
        numeric_len: schema.numeric().len(),
    }
}

/// Numbers pass through; numeric strings are parsed the way the training
/// data was coerced, and anything unparseable takes the default.
fn numeric_value(raw: Option<&Value>) -> f64 {
    let parsed = match raw {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        Some(Value::Bool(b)) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    };
    parsed
        .filter(|v| v.is_finite())
        .unwrap_or(NUMERIC_DEFAULT)
}

fn categorical_value(raw: Option<&Value>) -> String {
    match raw {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(true)) => "True".to_string(),
        Some(Value::Bool(false)) => "False".to_string(),
        _ => CATEGORICAL_DEFAULT.to_string(),
    }
}
