//! Inference engine: a pre-fit classification pipeline behind [`ChurnModel`].
//!
//! The concrete engine, [`PipelineModel`], is a logistic-regression pipeline
//! exported to JSON: a standard scaler over the numeric columns, a one-hot
//! encoder over the categorical columns (unknown categories encode as all
//! zeros), then `sigmoid(intercept + coefficients · x)`.
//!
//! The artifact records the exact columns it was fit on. A row whose names,
//! order or value kinds differ is refused rather than scored, since scoring
//! a misaligned row silently produces garbage.

use std::collections::HashSet;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, info};

use crate::align::{FeatureRow, FeatureValue};
use crate::schema::{FeatureKind, FeatureSchema};

/// A row the engine cannot score.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InferenceError {
    #[error("expected {expected} features, got {actual}")]
    ColumnCount { expected: usize, actual: usize },

    #[error("feature {position} should be '{expected}', got '{actual}'")]
    ColumnOrder {
        position: usize,
        expected: String,
        actual: String,
    },

    #[error("feature '{name}' should be {expected:?}")]
    KindMismatch { name: String, expected: FeatureKind },

    #[error("feature '{name}' is not a finite number")]
    NonFinite { name: String },

    #[error("engine returned probability {0}, outside [0, 1]")]
    InvalidProbability(f64),
}

/// Errors raised while loading a model artifact.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("failed to read model artifact {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse model artifact: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid model artifact: {0}")]
    Invalid(String),
}

/// A fitted binary classifier.
///
/// Implementations are deterministic and side-effect free; the same row
/// always yields the same probability.
pub trait ChurnModel: Send + Sync {
    /// Probability of the positive (churn) class for one aligned row.
    fn predict_proba(&self, row: &FeatureRow) -> Result<f64, InferenceError>;
}

/// SHA-256 of the artifact bytes, identifying which model is serving.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModelDigest(String);

impl ModelDigest {
    pub fn from_bytes(data: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(data);
        ModelDigest(hex::encode(hasher.finalize()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Short form (first 12 hex chars).
    pub fn short(&self) -> &str {
        &self.0[..12.min(self.0.len())]
    }
}

impl std::fmt::Display for ModelDigest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Standard-scaler parameters for one numeric column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumericColumn {
    pub name: String,
    pub mean: f64,
    pub scale: f64,
}

/// One-hot categories for one categorical column, in encoder order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoricalColumn {
    pub name: String,
    pub categories: Vec<String>,
}

/// On-disk form of a fitted pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineArtifact {
    #[serde(default)]
    pub model_name: Option<String>,
    #[serde(default)]
    pub trained_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub roc_auc: Option<f64>,
    pub numeric: Vec<NumericColumn>,
    pub categorical: Vec<CategoricalColumn>,
    pub coefficients: Vec<f64>,
    pub intercept: f64,
}

impl PipelineArtifact {
    /// Width of the encoded vector the classifier consumes.
    pub fn encoded_width(&self) -> usize {
        self.numeric.len()
            + self
                .categorical
                .iter()
                .map(|c| c.categories.len())
                .sum::<usize>()
    }

    fn validate(&self) -> Result<(), ModelError> {
        let width = self.encoded_width();
        if self.coefficients.len() != width {
            return Err(ModelError::Invalid(format!(
                "{} coefficients for an encoded width of {}",
                self.coefficients.len(),
                width
            )));
        }

        let mut seen = HashSet::new();
        let names = self
            .numeric
            .iter()
            .map(|c| &c.name)
            .chain(self.categorical.iter().map(|c| &c.name));
        for name in names {
            if !seen.insert(name.as_str()) {
                return Err(ModelError::Invalid(format!("duplicate column '{name}'")));
            }
        }

        let finite = self.intercept.is_finite()
            && self.coefficients.iter().all(|c| c.is_finite())
            && self
                .numeric
                .iter()
                .all(|c| c.mean.is_finite() && c.scale.is_finite());
        if !finite {
            return Err(ModelError::Invalid(
                "non-finite parameter in artifact".to_string(),
            ));
        }
        Ok(())
    }
}

/// A loaded, validated pipeline. Immutable once built.
#[derive(Debug, Clone)]
pub struct PipelineModel {
    artifact: PipelineArtifact,
    schema: FeatureSchema,
    digest: ModelDigest,
}

impl PipelineModel {
    /// Parse and validate an artifact from raw JSON bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, ModelError> {
        let artifact: PipelineArtifact = serde_json::from_slice(bytes)?;
        Self::build(artifact, ModelDigest::from_bytes(bytes))
    }

    /// Build from an in-memory artifact; the digest covers its JSON form.
    pub fn from_artifact(artifact: PipelineArtifact) -> Result<Self, ModelError> {
        let bytes = serde_json::to_vec(&artifact)?;
        Self::build(artifact, ModelDigest::from_bytes(&bytes))
    }

    /// Read an artifact from disk.
    pub fn load(path: &Path) -> Result<Self, ModelError> {
        let bytes = std::fs::read(path).map_err(|source| ModelError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let model = Self::from_slice(&bytes)?;
        info!(
            path = %path.display(),
            digest = %model.digest.short(),
            model = model.artifact.model_name.as_deref().unwrap_or("unnamed"),
            trained_at = ?model.artifact.trained_at,
            "Model artifact loaded"
        );
        Ok(model)
    }

    fn build(artifact: PipelineArtifact, digest: ModelDigest) -> Result<Self, ModelError> {
        artifact.validate()?;
        let schema = FeatureSchema::new(
            artifact.numeric.iter().map(|c| c.name.clone()),
            artifact.categorical.iter().map(|c| c.name.clone()),
        )
        .map_err(|e| ModelError::Invalid(e.to_string()))?;
        Ok(Self {
            artifact,
            schema,
            digest,
        })
    }

    /// The columns this pipeline was fit on.
    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    pub fn digest(&self) -> &ModelDigest {
        &self.digest
    }

    pub fn artifact(&self) -> &PipelineArtifact {
        &self.artifact
    }

    /// Refuse rows that do not match the fit-time columns exactly.
    fn check_columns(&self, row: &FeatureRow) -> Result<(), InferenceError> {
        if row.len() != self.schema.len() {
            return Err(InferenceError::ColumnCount {
                expected: self.schema.len(),
                actual: row.len(),
            });
        }
        for (position, ((expected, kind), feature)) in
            self.schema.columns().zip(row.features()).enumerate()
        {
            if feature.name != expected {
                return Err(InferenceError::ColumnOrder {
                    position,
                    expected: expected.to_string(),
                    actual: feature.name.clone(),
                });
            }
            if feature.value.kind() != kind {
                return Err(InferenceError::KindMismatch {
                    name: feature.name.clone(),
                    expected: kind,
                });
            }
        }
        Ok(())
    }
}

impl ChurnModel for PipelineModel {
    fn predict_proba(&self, row: &FeatureRow) -> Result<f64, InferenceError> {
        self.check_columns(row)?;

        let coefficients = &self.artifact.coefficients;
        let mut logit = self.artifact.intercept;
        let mut offset = 0;

        for (column, feature) in self.artifact.numeric.iter().zip(row.numeric()) {
            let x = match feature.value {
                FeatureValue::Numeric(x) if x.is_finite() => x,
                _ => {
                    return Err(InferenceError::NonFinite {
                        name: feature.name.clone(),
                    })
                }
            };
            // sklearn leaves zero-variance columns unscaled
            let scale = if column.scale == 0.0 { 1.0 } else { column.scale };
            logit += coefficients[offset] * (x - column.mean) / scale;
            offset += 1;
        }

        for (column, feature) in self.artifact.categorical.iter().zip(row.categorical()) {
            if let Some(category) = feature.value.as_str() {
                if let Some(i) = column.categories.iter().position(|c| c == category) {
                    logit += coefficients[offset + i];
                }
            }
            offset += column.categories.len();
        }

        let probability = sigmoid(logit);
        debug!(logit, probability, "Pipeline scored row");
        Ok(probability)
    }
}

fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::align::align;
    use churn_store::CustomerRecord;
    use serde_json::json;

    fn artifact() -> PipelineArtifact {
        PipelineArtifact {
            model_name: Some("logreg".to_string()),
            trained_at: None,
            roc_auc: Some(0.84),
            numeric: vec![NumericColumn {
                name: "tenure".to_string(),
                mean: 10.0,
                scale: 5.0,
            }],
            categorical: vec![CategoricalColumn {
                name: "Contract".to_string(),
                categories: vec!["Month-to-month".to_string(), "Two year".to_string()],
            }],
            coefficients: vec![-1.0, 2.0, -3.0],
            intercept: 0.5,
        }
    }

    fn row(value: serde_json::Value, model: &PipelineModel) -> FeatureRow {
        align(&CustomerRecord::from_value(value).unwrap(), model.schema())
    }

    #[test]
    fn test_scores_match_hand_computation() {
        let model = PipelineModel::from_artifact(artifact()).unwrap();
        let r = row(json!({"tenure": 0, "Contract": "Month-to-month"}), &model);

        // 0.5 + (-1.0 * (0 - 10) / 5) + 2.0 = 4.5
        let expected = 1.0 / (1.0 + (-4.5f64).exp());
        let p = model.predict_proba(&r).unwrap();
        assert!((p - expected).abs() < 1e-12);
    }

    #[test]
    fn test_unknown_category_encodes_as_zeros() {
        let model = PipelineModel::from_artifact(artifact()).unwrap();
        let known = row(json!({"tenure": 10, "Contract": "Two year"}), &model);
        let unknown = row(json!({"tenure": 10, "Contract": "Forever"}), &model);
        let missing = row(json!({"tenure": 10}), &model);

        let p_unknown = model.predict_proba(&unknown).unwrap();
        assert!((p_unknown - sigmoid(0.5)).abs() < 1e-12);
        assert_eq!(model.predict_proba(&missing).unwrap(), p_unknown);
        assert!((model.predict_proba(&known).unwrap() - sigmoid(-2.5)).abs() < 1e-12);
    }

    #[test]
    fn test_zero_scale_is_treated_as_one() {
        let mut a = artifact();
        a.numeric[0].scale = 0.0;
        let model = PipelineModel::from_artifact(a).unwrap();
        let r = row(json!({"tenure": 12}), &model);
        assert!((model.predict_proba(&r).unwrap() - sigmoid(0.5 - 2.0)).abs() < 1e-12);
    }

    #[test]
    fn test_probability_is_deterministic_and_bounded() {
        let model = PipelineModel::from_artifact(artifact()).unwrap();
        for tenure in [-1e6, -10.0, 0.0, 3.5, 72.0, 1e6] {
            let r = row(json!({"tenure": tenure, "Contract": "Two year"}), &model);
            let p = model.predict_proba(&r).unwrap();
            assert!((0.0..=1.0).contains(&p), "tenure {tenure} gave {p}");
            assert_eq!(model.predict_proba(&r).unwrap(), p);
        }
    }

    #[test]
    fn test_rejects_row_for_other_schema() {
        let model = PipelineModel::from_artifact(artifact()).unwrap();
        let drifted = align(&CustomerRecord::new(), &FeatureSchema::telco());
        let err = model.predict_proba(&drifted).unwrap_err();
        assert!(matches!(err, InferenceError::ColumnCount { expected: 2, actual: 18 }));
    }

    #[test]
    fn test_rejects_reordered_row() {
        let model = PipelineModel::from_artifact(artifact()).unwrap();
        let swapped = FeatureSchema::new(["Contract"], ["tenure"]).unwrap();
        let r = align(&CustomerRecord::new(), &swapped);
        let err = model.predict_proba(&r).unwrap_err();
        assert!(matches!(err, InferenceError::ColumnOrder { position: 0, .. }));
    }

    #[test]
    fn test_artifact_validation() {
        let mut short = artifact();
        short.coefficients.pop();
        assert!(matches!(
            PipelineModel::from_artifact(short),
            Err(ModelError::Invalid(_))
        ));

        let mut dup = artifact();
        dup.categorical[0].name = "tenure".to_string();
        assert!(matches!(
            PipelineModel::from_artifact(dup),
            Err(ModelError::Invalid(_))
        ));
    }

    #[test]
    fn test_load_from_disk_and_digest() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("churn_pipeline.json");
        let bytes = serde_json::to_vec_pretty(&artifact()).unwrap();
        std::fs::write(&path, &bytes).unwrap();

        let model = PipelineModel::load(&path).unwrap();
        assert_eq!(model.digest(), &ModelDigest::from_bytes(&bytes));
        assert_eq!(model.digest().as_str().len(), 64);
        assert_eq!(model.digest().short().len(), 12);
        assert_eq!(model.schema().numeric(), ["tenure".to_string()]);
    }

    #[test]
    fn test_load_missing_file() {
        let err = PipelineModel::load(Path::new("/nonexistent/churn_pipeline.json")).unwrap_err();
        assert!(matches!(err, ModelError::Io { .. }));
    }

    #[test]
    fn test_trained_at_parses_rfc3339() {
        let json = json!({
            "model_name": "rf",
            "trained_at": "2024-03-01T12:00:00Z",
            "numeric": [],
            "categorical": [{"name": "Contract", "categories": ["One year"]}],
            "coefficients": [0.25],
            "intercept": 0.0
        });
        let model = PipelineModel::from_slice(json.to_string().as_bytes()).unwrap();
        assert!(model.artifact().trained_at.is_some());
        assert!(model.artifact().roc_auc.is_none());
    }
}
