//! Connection settings for the customer store

/// Where and how to reach the customer document store.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Connection URL (`mem://`, `surrealkv://path`, `ws://host:port`, `wss://...`)
    pub url: String,
    /// Optional sign-in username
    pub username: Option<String>,
    /// Optional sign-in password
    pub password: Option<String>,
    /// Sign in as a root user (true) or a database user (false)
    pub is_root: bool,
    /// Namespace (default: "churn")
    pub namespace: String,
    /// Database name (default: "churndb")
    pub database: String,
    /// Table holding customer documents (default: "customers")
    pub table: String,
    /// Field holding the customer identifier (default: "customerID")
    pub id_field: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::new("surrealkv://.churn/db")
    }
}

impl StoreConfig {
    /// Create a configuration for `url` with default names and no credentials
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            username: None,
            password: None,
            is_root: false,
            namespace: "churn".to_string(),
            database: "churndb".to_string(),
            table: "customers".to_string(),
            id_field: "customerID".to_string(),
        }
    }

    /// In-memory configuration, used by tests
    pub fn in_memory() -> Self {
        Self::new("mem://")
    }

    /// Set sign-in credentials
    pub fn with_credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    /// Set whether the credentials belong to a root user
    pub fn with_root(mut self, is_root: bool) -> Self {
        self.is_root = is_root;
        self
    }

    /// Set custom namespace
    pub fn with_namespace(mut self, ns: impl Into<String>) -> Self {
        self.namespace = ns.into();
        self
    }

    /// Set custom database
    pub fn with_database(mut self, db: impl Into<String>) -> Self {
        self.database = db.into();
        self
    }

    /// Set custom table
    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        self.table = table.into();
        self
    }

    /// Set the identifier field
    pub fn with_id_field(mut self, field: impl Into<String>) -> Self {
        self.id_field = field.into();
        self
    }

    /// Local directory backing a `surrealkv://` URL, if any
    pub fn local_path(&self) -> Option<&str> {
        self.url.strip_prefix("surrealkv://")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_point_at_local_persistence() {
        let config = StoreConfig::default();
        assert_eq!(config.local_path(), Some(".churn/db"));
        assert_eq!(config.table, "customers");
        assert_eq!(config.id_field, "customerID");
        assert!(config.username.is_none());
    }

    #[test]
    fn builder_overrides() {
        let config = StoreConfig::in_memory()
            .with_credentials("svc", "secret")
            .with_root(true)
            .with_namespace("ns")
            .with_database("db")
            .with_table("people")
            .with_id_field("customer_number");

        assert_eq!(config.url, "mem://");
        assert!(config.local_path().is_none());
        assert_eq!(config.username.as_deref(), Some("svc"));
        assert!(config.is_root);
        assert_eq!(config.namespace, "ns");
        assert_eq!(config.database, "db");
        assert_eq!(config.table, "people");
        assert_eq!(config.id_field, "customer_number");
    }
}
