//! In-memory fakes for storage traits (testing only)
//!
//! Provides `MemoryCustomerStore`, which satisfies the `CustomerStore`
//! contract without any external dependencies and counts lookups so tests can
//! assert that a request never reached the store.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::StoreError;
use crate::record::{CustomerRecord, IdFragment};
use crate::storage_traits::*;

/// In-memory customer store backed by a `Vec` in insertion order.
#[derive(Debug)]
pub struct MemoryCustomerStore {
    id_field: String,
    records: Mutex<Vec<CustomerRecord>>,
    lookups: AtomicUsize,
}

impl Default for MemoryCustomerStore {
    fn default() -> Self {
        Self::new("customerID")
    }
}

impl MemoryCustomerStore {
    pub fn new(id_field: impl Into<String>) -> Self {
        Self {
            id_field: id_field.into(),
            records: Mutex::new(Vec::new()),
            lookups: AtomicUsize::new(0),
        }
    }

    /// Build a store keyed on `customerID` and preloaded with `records`.
    pub fn with_records(records: impl IntoIterator<Item = CustomerRecord>) -> Self {
        let store = Self::default();
        store.records.lock().unwrap().extend(records);
        store
    }

    /// How many times `find_customer` has been called.
    pub fn lookup_count(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }

    fn check_identifiers(&self, records: &[CustomerRecord]) -> StoreResult<()> {
        if records.iter().any(|r| r.identifier(&self.id_field).is_none()) {
            return Err(StoreError::MissingIdentifier {
                field: self.id_field.clone(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl CustomerStore for MemoryCustomerStore {
    async fn find_customer(&self, fragment: &IdFragment) -> StoreResult<CustomerRecord> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        let records = self.records.lock().unwrap();
        records
            .iter()
            .find(|r| {
                r.identifier(&self.id_field)
                    .map(|id| fragment.matches(id))
                    .unwrap_or(false)
            })
            .cloned()
            .map(CustomerRecord::strip_internal_ids)
            .ok_or_else(|| StoreError::NotFound {
                fragment: fragment.as_str().to_string(),
            })
    }

    async fn replace_all(&self, records: Vec<CustomerRecord>) -> StoreResult<usize> {
        self.check_identifiers(&records)?;
        let written = records.len();
        let mut stored = self.records.lock().unwrap();
        *stored = records;
        Ok(written)
    }

    async fn insert_many(&self, records: Vec<CustomerRecord>) -> StoreResult<usize> {
        self.check_identifiers(&records)?;
        let written = records.len();
        self.records.lock().unwrap().extend(records);
        Ok(written)
    }

    async fn count(&self) -> StoreResult<usize> {
        Ok(self.records.lock().unwrap().len())
    }
}
