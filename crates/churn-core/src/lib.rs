//! Churn-Core: feature alignment and churn inference
//!
//! Given a customer record found by identifier prefix, produce a churn
//! probability and a binary decision consistent with how the model was fit.
//!
//! - [`align`]: record -> fixed-order [`FeatureRow`] (never fails)
//! - [`ChurnModel`] / [`PipelineModel`]: the inference engine
//! - [`DecisionPolicy`]: probability -> `0 | 1`
//! - [`ChurnPredictor`]: per-request orchestration over injected collaborators

pub mod align;
pub mod decision;
pub mod error;
pub mod model;
pub mod predictor;
pub mod schema;
pub mod seed;
pub mod telemetry;

pub use align::{align, Feature, FeatureRow, FeatureValue};
pub use decision::{DecisionPolicy, InvalidThreshold, DEFAULT_THRESHOLD};
pub use error::{ChurnError, Result};
pub use model::{
    CategoricalColumn, ChurnModel, InferenceError, ModelDigest, ModelError, NumericColumn,
    PipelineArtifact, PipelineModel,
};
pub use predictor::{ChurnPredictor, PredictionResult};
pub use schema::{FeatureKind, FeatureSchema, SchemaError};
pub use seed::{seed_store, SeedError, SeedMode, SeedReport};
pub use telemetry::init_tracing;
