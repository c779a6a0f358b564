//! SurrealDB-backed CustomerStore implementation
//!
//! Customer documents live in a SCHEMALESS table so arbitrary dataset columns
//! survive untouched. Lookups are a single read:
//!
//! ```text
//! SELECT * OMIT id FROM <table>
//! WHERE string::starts_with(string::lowercase(<string> (<id_field> ?? '')), $prefix)
//! LIMIT 1
//! ```
//!
//! Supports in-memory (`mem://`), local (`surrealkv://`) and remote
//! (`ws://`, `wss://`) connections.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use surrealdb::engine::any::Any;
use surrealdb::opt::auth::{Database, Root};
use surrealdb::Surreal;
use tracing::{debug, info, instrument};

use crate::config::StoreConfig;
use crate::error::StoreError;
use crate::record::{CustomerRecord, IdFragment};
use crate::storage_traits::{CustomerStore, StoreResult};

/// SurrealDB-backed implementation of [`CustomerStore`].
#[derive(Clone)]
pub struct SurrealCustomerStore {
    db: Surreal<Any>,
    table: String,
    id_field: String,
}

impl SurrealCustomerStore {
    /// Connect to an in-memory database with default names.
    pub async fn in_memory() -> StoreResult<Self> {
        Self::connect(StoreConfig::in_memory()).await
    }

    /// Connect, sign in if credentials are configured, select the
    /// namespace/database and make sure the customer table exists.
    #[instrument(skip(config), fields(url = %config.url, namespace = %config.namespace, database = %config.database))]
    pub async fn connect(config: StoreConfig) -> StoreResult<Self> {
        validate_name(&config.table)?;
        validate_name(&config.id_field)?;

        if let Some(path) = config.local_path() {
            std::fs::create_dir_all(path).map_err(|e| {
                StoreError::Connection(format!(
                    "Failed to create database directory {}: {}",
                    path, e
                ))
            })?;
        }

        info!("Connecting to customer store");
        let db = surrealdb::engine::any::connect(&config.url)
            .await
            .map_err(|e| {
                StoreError::Connection(format!("Failed to connect to {}: {}", config.url, e))
            })?;

        if let (Some(username), Some(password)) = (&config.username, &config.password) {
            if config.is_root {
                db.signin(Root {
                    username: username.as_str(),
                    password: password.as_str(),
                })
                .await
                .map_err(|e| StoreError::Connection(format!("Root auth failed: {e}")))?;
            } else {
                db.signin(Database {
                    namespace: &config.namespace,
                    database: &config.database,
                    username: username.as_str(),
                    password: password.as_str(),
                })
                .await
                .map_err(|e| StoreError::Connection(format!("DB auth failed: {e}")))?;
            }
        }

        db.use_ns(&config.namespace)
            .use_db(&config.database)
            .await
            .map_err(|e| {
                StoreError::Connection(format!("Failed to select namespace/database: {}", e))
            })?;

        let store = Self {
            db,
            table: config.table,
            id_field: config.id_field,
        };
        store.init_schema().await?;

        info!(table = %store.table, "Customer store connected");
        Ok(store)
    }

    /// Define the customer table and an index on the identifier field.
    ///
    /// Idempotent.
    async fn init_schema(&self) -> StoreResult<()> {
        debug!("Initializing customer table");

        let sql = format!(
            "DEFINE TABLE IF NOT EXISTS {table} SCHEMALESS;
             DEFINE INDEX IF NOT EXISTS idx_{table}_{field} ON {table} FIELDS {field};",
            table = self.table,
            field = self.id_field,
        );

        self.db
            .query(sql)
            .await
            .and_then(|r| r.check())
            .map_err(|e| StoreError::SchemaSetup(e.to_string()))?;

        Ok(())
    }

    fn reject_missing_identifiers(&self, records: &[CustomerRecord]) -> StoreResult<()> {
        if records.iter().any(|r| r.identifier(&self.id_field).is_none()) {
            return Err(StoreError::MissingIdentifier {
                field: self.id_field.clone(),
            });
        }
        Ok(())
    }

    async fn insert(&self, records: Vec<CustomerRecord>) -> StoreResult<usize> {
        let written = records.len();
        if written == 0 {
            return Ok(0);
        }

        let docs: Vec<Value> = records
            .into_iter()
            .map(|r| r.strip_internal_ids().into_value())
            .collect();

        self.db
            .query(format!("INSERT INTO {} $docs RETURN NONE", self.table))
            .bind(("docs", docs))
            .await?
            .check()?;

        Ok(written)
    }
}

#[async_trait]
impl CustomerStore for SurrealCustomerStore {
    #[instrument(skip(self, fragment), fields(fragment = %fragment))]
    async fn find_customer(&self, fragment: &IdFragment) -> StoreResult<CustomerRecord> {
        debug!("Looking up customer by identifier prefix");

        let sql = format!(
            "SELECT * OMIT id FROM {table} \
             WHERE string::starts_with(string::lowercase(<string> ({field} ?? '')), $prefix) \
             LIMIT 1",
            table = self.table,
            field = self.id_field,
        );

        let mut result = self
            .db
            .query(sql)
            .bind(("prefix", fragment.folded()))
            .await?;

        let rows: Vec<Value> = result.take(0)?;
        match rows.into_iter().next() {
            Some(row) => Ok(CustomerRecord::from_value(row)?.strip_internal_ids()),
            None => Err(StoreError::NotFound {
                fragment: fragment.as_str().to_string(),
            }),
        }
    }

    #[instrument(skip(self, records), fields(count = records.len()))]
    async fn replace_all(&self, records: Vec<CustomerRecord>) -> StoreResult<usize> {
        self.reject_missing_identifiers(&records)?;

        self.db
            .query(format!("DELETE {}", self.table))
            .await?
            .check()?;

        let written = self.insert(records).await?;
        info!(written, "Customer table replaced");
        Ok(written)
    }

    #[instrument(skip(self, records), fields(count = records.len()))]
    async fn insert_many(&self, records: Vec<CustomerRecord>) -> StoreResult<usize> {
        self.reject_missing_identifiers(&records)?;
        self.insert(records).await
    }

    async fn count(&self) -> StoreResult<usize> {
        #[derive(Deserialize)]
        struct CountRow {
            count: usize,
        }

        let mut result = self
            .db
            .query(format!("SELECT count() FROM {} GROUP ALL", self.table))
            .await?;

        let rows: Vec<CountRow> = result.take(0)?;
        Ok(rows.into_iter().next().map(|r| r.count).unwrap_or(0))
    }
}

/// Table and field names are interpolated into SurrealQL, so only plain
/// identifiers are accepted.
fn validate_name(name: &str) -> StoreResult<()> {
    let mut chars = name.chars();
    let valid = match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    };
    if valid {
        Ok(())
    } else {
        Err(StoreError::InvalidField(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn customer(id: &str) -> CustomerRecord {
        CustomerRecord::from_value(json!({
            "customerID": id,
            "tenure": 1,
            "MonthlyCharges": 29.85,
            "Churn": "No"
        }))
        .unwrap()
    }

    #[test]
    fn test_validate_name() {
        assert!(validate_name("customerID").is_ok());
        assert!(validate_name("_private").is_ok());
        assert!(validate_name("customer_number").is_ok());
        assert!(validate_name("").is_err());
        assert!(validate_name("1st").is_err());
        assert!(validate_name("a; DELETE customers").is_err());
        assert!(validate_name("a-b").is_err());
    }

    #[tokio::test]
    async fn test_connect_in_memory() {
        let store = SurrealCustomerStore::in_memory().await;
        assert!(store.is_ok(), "Failed to connect: {:?}", store.err());
    }

    #[tokio::test]
    async fn test_connect_rejects_bad_field_name() {
        let config = StoreConfig::in_memory().with_id_field("id; REMOVE TABLE x");
        let err = SurrealCustomerStore::connect(config).await.err().unwrap();
        assert!(matches!(err, StoreError::InvalidField(_)));
    }

    #[tokio::test]
    async fn test_find_strips_internal_id() {
        let store = SurrealCustomerStore::in_memory().await.unwrap();
        store
            .replace_all(vec![customer("7590-VHVEG")])
            .await
            .unwrap();

        let found = store
            .find_customer(&IdFragment::parse("7590").unwrap())
            .await
            .unwrap();

        assert_eq!(found.identifier("customerID"), Some("7590-VHVEG"));
        assert!(!found.contains("id"));
        assert_eq!(found.get("tenure"), Some(&json!(1)));
    }

    #[tokio::test]
    async fn test_replace_all_clears_previous_rows() {
        let store = SurrealCustomerStore::in_memory().await.unwrap();
        store
            .replace_all(vec![customer("A-1"), customer("A-2")])
            .await
            .unwrap();
        assert_eq!(store.count().await.unwrap(), 2);

        store.replace_all(vec![customer("B-1")]).await.unwrap();
        assert_eq!(store.count().await.unwrap(), 1);

        let err = store
            .find_customer(&IdFragment::parse("A-").unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_count_on_empty_table() {
        let store = SurrealCustomerStore::in_memory().await.unwrap();
        assert_eq!(store.count().await.unwrap(), 0);
    }
}
