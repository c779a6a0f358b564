//! Prediction orchestration: validate, look up, align, infer, decide.
//!
//! [`ChurnPredictor`] holds the process-wide collaborators (store handle,
//! loaded engine, schema, policy) and is shared read-only across requests.
//! Each call is one lookup and one inference with no retries.

use std::sync::Arc;

use churn_store::{CustomerStore, IdFragment};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument};

use crate::align::align;
use crate::decision::DecisionPolicy;
use crate::error::{ChurnError, Result};
use crate::model::{ChurnModel, InferenceError};
use crate::schema::FeatureSchema;

/// Outcome of one scored lookup. Built per request and never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    /// Full identifier of the record the fragment resolved to
    #[serde(rename = "customer_id_matched")]
    pub identifier_matched: String,
    /// The trimmed fragment that was searched
    pub input_used: String,
    #[serde(rename = "churn_probability")]
    pub probability: f64,
    #[serde(rename = "churn_prediction")]
    pub label: u8,
}

pub struct ChurnPredictor {
    store: Arc<dyn CustomerStore>,
    model: Arc<dyn ChurnModel>,
    schema: FeatureSchema,
    policy: DecisionPolicy,
    id_field: String,
}

impl ChurnPredictor {
    pub fn new(
        store: Arc<dyn CustomerStore>,
        model: Arc<dyn ChurnModel>,
        schema: FeatureSchema,
        policy: DecisionPolicy,
    ) -> Self {
        Self {
            store,
            model,
            schema,
            policy,
            id_field: "customerID".to_string(),
        }
    }

    /// Field read back as `customer_id_matched`.
    pub fn with_id_field(mut self, field: impl Into<String>) -> Self {
        self.id_field = field.into();
        self
    }

    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    pub fn policy(&self) -> &DecisionPolicy {
        &self.policy
    }

    /// Score the customer whose identifier starts with `raw`.
    ///
    /// A missing, empty or whitespace-only input fails with `InvalidInput`
    /// before the store is queried.
    #[instrument(skip(self, raw), fields(request_id = %uuid::Uuid::new_v4()))]
    pub async fn predict_by_id(&self, raw: Option<&str>) -> Result<PredictionResult> {
        let fragment = IdFragment::parse(raw.unwrap_or_default())?;
        debug!(input = %fragment, "Input validated");

        let record = self.store.find_customer(&fragment).await.map_err(|e| {
            let err = ChurnError::from(e);
            if let ChurnError::Store(inner) = &err {
                error!(error = %inner, "Customer lookup failed");
            }
            err
        })?;

        let identifier_matched = record
            .identifier(&self.id_field)
            .unwrap_or(fragment.as_str())
            .to_string();

        let row = align(&record, &self.schema);

        let probability = self
            .model
            .predict_proba(&row)
            .and_then(check_probability)
            .map_err(|e| {
                error!(customer = %identifier_matched, error = %e, "Inference failed");
                ChurnError::InferenceFailure(e)
            })?;

        let label = self.policy.decide(probability);
        info!(
            customer = %identifier_matched,
            probability,
            label,
            "Churn scored"
        );

        Ok(PredictionResult {
            identifier_matched,
            input_used: fragment.as_str().to_string(),
            probability,
            label,
        })
    }
}

fn check_probability(p: f64) -> std::result::Result<f64, InferenceError> {
    if (0.0..=1.0).contains(&p) {
        Ok(p)
    } else {
        Err(InferenceError::InvalidProbability(p))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_probability() {
        assert_eq!(check_probability(0.0), Ok(0.0));
        assert_eq!(check_probability(1.0), Ok(1.0));
        assert!(check_probability(1.01).is_err());
        assert!(check_probability(-0.01).is_err());
        assert!(check_probability(f64::NAN).is_err());
    }

    #[test]
    fn test_result_wire_names() {
        let result = PredictionResult {
            identifier_matched: "7590-VHVEG".to_string(),
            input_used: "7590".to_string(),
            probability: 0.62,
            label: 1,
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["customer_id_matched"], "7590-VHVEG");
        assert_eq!(json["input_used"], "7590");
        assert_eq!(json["churn_probability"], 0.62);
        assert_eq!(json["churn_prediction"], 1);
    }
}
