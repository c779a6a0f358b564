//! Churn-Store: customer record persistence for the churn scoring service
//!
//! This crate owns every interaction with the customer document store. The
//! scoring path only ever needs one read, a case-insensitive prefix lookup on
//! the customer identifier; seeding needs a bulk replace.
//!
//! ## Key Components
//!
//! - `CustomerStore`: backend-agnostic async trait
//! - `SurrealCustomerStore`: SurrealDB implementation (in-memory, local or remote)
//! - `MemoryCustomerStore`: in-memory fake for tests
//! - `CustomerRecord` / `IdFragment`: open-schema record and validated lookup key

mod config;
mod error;
pub mod fakes;
mod record;
pub mod storage_traits;
mod surreal_store;

pub use config::StoreConfig;
pub use error::StoreError;
pub use record::{CustomerRecord, IdFragment, INTERNAL_ID_FIELDS};
pub use storage_traits::{CustomerStore, StoreResult};
pub use surreal_store::SurrealCustomerStore;
