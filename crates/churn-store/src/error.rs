//! Error types for churn-store

use thiserror::Error;

/// Errors that can occur in the customer store layer
#[derive(Error, Debug)]
pub enum StoreError {
    /// Database connection error
    #[error("Database connection failed: {0}")]
    Connection(String),

    /// Database query error
    #[error("Database query failed: {0}")]
    Query(String),

    /// Serialization error
    #[error("Serialization failed: {0}")]
    Serialization(String),

    /// Schema setup error
    #[error("Schema setup failed: {0}")]
    SchemaSetup(String),

    /// The identifier fragment was missing or blank
    #[error("identifier fragment must not be empty")]
    InvalidInput,

    /// No record's identifier starts with the fragment
    #[error("no customer found matching '{fragment}'")]
    NotFound { fragment: String },

    /// A configured field name cannot be used in a query
    #[error("invalid field name: {0}")]
    InvalidField(String),

    /// A record lacks the identifier field
    #[error("record has no '{field}' identifier")]
    MissingIdentifier { field: String },
}

impl From<surrealdb::Error> for StoreError {
    fn from(err: surrealdb::Error) -> Self {
        StoreError::Query(err.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Serialization(err.to_string())
    }
}
