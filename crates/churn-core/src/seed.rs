//! Seeding the customer store from an exported dataset.
//!
//! Accepts a JSON array of customer objects or newline-delimited JSON. Numeric
//! schema columns that arrive as strings are coerced to numbers, and blank or
//! unparseable values become `null`, matching how the training data was
//! cleaned before the model was fit.

use std::path::Path;

use churn_store::{CustomerRecord, CustomerStore, StoreError};
use serde_json::{Number, Value};
use tracing::{info, instrument, warn};

use crate::schema::FeatureSchema;

#[derive(Debug, thiserror::Error)]
pub enum SeedError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("record {index}: invalid JSON: {source}")]
    Parse {
        index: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("record {index}: expected a JSON object")]
    NotAnObject { index: usize },

    #[error("record {index}: missing string identifier '{field}'")]
    MissingIdentifier { index: usize, field: String },

    #[error("store rejected records: {0}")]
    Store(#[from] StoreError),
}

/// Whether seeding clears the collection first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SeedMode {
    #[default]
    Replace,
    Append,
}

/// Counts reported after a seed run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeedReport {
    pub parsed: usize,
    pub written: usize,
    pub coerced_to_null: usize,
}

/// Parse and clean customer documents from `text`.
///
/// Returns the records and how many numeric values were nulled out.
pub fn parse_records(
    text: &str,
    schema: &FeatureSchema,
    id_field: &str,
) -> Result<(Vec<CustomerRecord>, usize), SeedError> {
    let values = if text.trim_start().starts_with('[') {
        let array: Vec<Value> =
            serde_json::from_str(text).map_err(|source| SeedError::Parse { index: 0, source })?;
        array
    } else {
        text.lines()
            .filter(|line| !line.trim().is_empty())
            .enumerate()
            .map(|(index, line)| {
                serde_json::from_str(line).map_err(|source| SeedError::Parse { index, source })
            })
            .collect::<Result<_, _>>()?
    };

    let mut nulled = 0;
    let mut records = Vec::with_capacity(values.len());
    for (index, value) in values.into_iter().enumerate() {
        let Value::Object(mut fields) = value else {
            return Err(SeedError::NotAnObject { index });
        };
        if !matches!(fields.get(id_field), Some(Value::String(_))) {
            return Err(SeedError::MissingIdentifier {
                index,
                field: id_field.to_string(),
            });
        }
        for name in schema.numeric() {
            let Some(slot) = fields.get_mut(name) else {
                continue;
            };
            let parsed = match slot {
                Value::String(raw) => raw.trim().parse::<f64>().ok().and_then(Number::from_f64),
                _ => continue,
            };
            *slot = match parsed {
                Some(n) => Value::Number(n),
                None => {
                    nulled += 1;
                    Value::Null
                }
            };
        }
        records.push(CustomerRecord::from(fields).strip_internal_ids());
    }

    Ok((records, nulled))
}

/// Load `path` into `store`.
#[instrument(skip(store, schema), fields(path = %path.display()))]
pub async fn seed_store(
    store: &dyn CustomerStore,
    path: &Path,
    schema: &FeatureSchema,
    id_field: &str,
    mode: SeedMode,
) -> Result<SeedReport, SeedError> {
    let text = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| SeedError::Io {
            path: path.display().to_string(),
            source,
        })?;

    let (records, coerced_to_null) = parse_records(&text, schema, id_field)?;
    if coerced_to_null > 0 {
        warn!(coerced_to_null, "Unparseable numeric values stored as null");
    }

    let parsed = records.len();
    let written = match mode {
        SeedMode::Replace => store.replace_all(records).await?,
        SeedMode::Append => store.insert_many(records).await?,
    };

    info!(parsed, written, ?mode, "Customer store seeded");
    Ok(SeedReport {
        parsed,
        written,
        coerced_to_null,
    })
}
