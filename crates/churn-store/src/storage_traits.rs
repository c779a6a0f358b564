//! Storage trait definitions for the customer store
//!
//! `CustomerStore` is the only seam between the scoring path and the
//! document database. It is async and backend-agnostic; an in-memory fake is
//! provided for testing via the `fakes` module.

use async_trait::async_trait;

use crate::error::StoreError;
use crate::record::{CustomerRecord, IdFragment};

/// Result type for store operations
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Customer document store.
///
/// Guarantees:
/// - `find_customer` matches the fragment as an anchored, case-insensitive
///   prefix of the identifier field and never mutates the store.
/// - When several records match, the first one found is returned.
/// - Returned records never carry storage-internal row identifiers.
/// - A miss is `StoreError::NotFound` carrying the trimmed fragment.
#[async_trait]
pub trait CustomerStore: Send + Sync {
    /// Resolve a fragment to exactly one customer record.
    async fn find_customer(&self, fragment: &IdFragment) -> StoreResult<CustomerRecord>;

    /// Clear the collection and insert `records`. Returns how many were written.
    async fn replace_all(&self, records: Vec<CustomerRecord>) -> StoreResult<usize>;

    /// Insert `records` without clearing. Returns how many were written.
    async fn insert_many(&self, records: Vec<CustomerRecord>) -> StoreResult<usize>;

    /// Number of stored records.
    async fn count(&self) -> StoreResult<usize>;
}
