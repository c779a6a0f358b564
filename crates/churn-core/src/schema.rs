//! Feature schema: the ordered columns a fitted pipeline expects.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// Errors raised while loading or validating a feature schema.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error("failed to read schema {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse schema: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("feature schema has no features")]
    Empty,

    #[error("feature '{0}' appears more than once")]
    Duplicate(String),
}

/// Whether a column is scaled as a number or one-hot encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeatureKind {
    Numeric,
    Categorical,
}

/// Numeric and categorical feature names, each in training order.
///
/// Aligned rows always list every numeric feature first, then every
/// categorical one, matching the column transformer the model was fit with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureSchema {
    numeric: Vec<String>,
    categorical: Vec<String>,
}

impl FeatureSchema {
    /// Build and validate a schema.
    pub fn new<N, C>(numeric: N, categorical: C) -> Result<Self, SchemaError>
    where
        N: IntoIterator,
        N::Item: Into<String>,
        C: IntoIterator,
        C::Item: Into<String>,
    {
        let schema = Self {
            numeric: numeric.into_iter().map(Into::into).collect(),
            categorical: categorical.into_iter().map(Into::into).collect(),
        };
        schema.validate()?;
        Ok(schema)
    }

    /// Columns of the Telco customer-churn dataset, as the pipeline saw them.
    ///
    /// `customerID` and the `Churn` target are never features, and
    /// `SeniorCitizen` was left out of training.
    pub fn telco() -> Self {
        Self {
            numeric: ["tenure", "MonthlyCharges", "TotalCharges"]
                .into_iter()
                .map(String::from)
                .collect(),
            categorical: [
                "gender",
                "Partner",
                "Dependents",
                "PhoneService",
                "MultipleLines",
                "InternetService",
                "OnlineSecurity",
                "OnlineBackup",
                "DeviceProtection",
                "TechSupport",
                "StreamingTV",
                "StreamingMovies",
                "Contract",
                "PaperlessBilling",
                "PaymentMethod",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
        }
    }

    /// Parse a schema from `{"numeric": [...], "categorical": [...]}`.
    pub fn from_json(text: &str) -> Result<Self, SchemaError> {
        let schema: Self = serde_json::from_str(text)?;
        schema.validate()?;
        Ok(schema)
    }

    pub fn load(path: &Path) -> Result<Self, SchemaError> {
        let text = std::fs::read_to_string(path).map_err(|source| SchemaError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&text)
    }

    fn validate(&self) -> Result<(), SchemaError> {
        if self.len() == 0 {
            return Err(SchemaError::Empty);
        }
        let mut seen = HashSet::new();
        for name in self.numeric.iter().chain(&self.categorical) {
            if !seen.insert(name.as_str()) {
                return Err(SchemaError::Duplicate(name.clone()));
            }
        }
        Ok(())
    }

    pub fn numeric(&self) -> &[String] {
        &self.numeric
    }

    pub fn categorical(&self) -> &[String] {
        &self.categorical
    }

    /// Total number of columns: `len(numeric) + len(categorical)`.
    pub fn len(&self) -> usize {
        self.numeric.len() + self.categorical.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Every column in row order, tagged with its kind.
    pub fn columns(&self) -> impl Iterator<Item = (&str, FeatureKind)> {
        self.numeric
            .iter()
            .map(|n| (n.as_str(), FeatureKind::Numeric))
            .chain(
                self.categorical
                    .iter()
                    .map(|n| (n.as_str(), FeatureKind::Categorical)),
            )
    }

    pub fn kind_of(&self, name: &str) -> Option<FeatureKind> {
        self.columns().find(|(n, _)| *n == name).map(|(_, k)| k)
    }
}

impl Default for FeatureSchema {
    fn default() -> Self {
        Self::telco()
    }
}
