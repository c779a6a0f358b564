//! Request-level error taxonomy for churn scoring.

use churn_store::StoreError;

use crate::model::InferenceError;

/// Errors a single prediction request can end in.
///
/// `InvalidInput` and `NotFound` are user-correctable; everything else is a
/// server-side failure for that request only.
#[derive(Debug, thiserror::Error)]
pub enum ChurnError {
    #[error("Please provide a customer_id")]
    InvalidInput,

    #[error("No customer found matching the input '{fragment}'")]
    NotFound { fragment: String },

    #[error("inference failed: {0}")]
    InferenceFailure(#[from] InferenceError),

    #[error("customer store error: {0}")]
    Store(StoreError),
}

impl From<StoreError> for ChurnError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::InvalidInput => ChurnError::InvalidInput,
            StoreError::NotFound { fragment } => ChurnError::NotFound { fragment },
            other => ChurnError::Store(other),
        }
    }
}

/// Result type for churn scoring operations.
pub type Result<T> = std::result::Result<T, ChurnError>;
