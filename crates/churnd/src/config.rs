//! Command-line and environment configuration.
//!
//! Every option can also come from the environment (and so from `.env`,
//! which `main` loads before parsing).

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use churn_store::StoreConfig;
use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "churnd")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Churn scoring service", long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Serve POST /predict_by_id
    Serve(ServeArgs),

    /// Load customer documents (JSON array or JSONL) into the store
    Seed(SeedArgs),
}

/// Customer store connection options.
#[derive(Args, Debug, Clone)]
pub struct StoreArgs {
    /// Store URL (mem://, surrealkv://path, ws://host:port, wss://...)
    #[arg(long, env = "CHURN_DB_URL", default_value = "surrealkv://.churn/db")]
    pub db_url: String,

    /// Sign-in username
    #[arg(long, env = "CHURN_DB_USER")]
    pub db_user: Option<String>,

    /// Sign-in password
    #[arg(long, env = "CHURN_DB_PASS", hide_env_values = true)]
    pub db_pass: Option<String>,

    /// Credentials belong to a root user
    #[arg(long, env = "CHURN_DB_ROOT")]
    pub db_root: bool,

    #[arg(long, env = "CHURN_DB_NAMESPACE", default_value = "churn")]
    pub db_namespace: String,

    #[arg(long, env = "CHURN_DB_DATABASE", default_value = "churndb")]
    pub db_database: String,

    /// Table holding customer documents
    #[arg(long, env = "CHURN_DB_TABLE", default_value = "customers")]
    pub db_table: String,

    /// Field holding the customer identifier
    #[arg(long, env = "CHURN_ID_FIELD", default_value = "customerID")]
    pub id_field: String,
}

impl StoreArgs {
    pub fn to_config(&self) -> StoreConfig {
        let mut config = StoreConfig::new(&self.db_url)
            .with_root(self.db_root)
            .with_namespace(&self.db_namespace)
            .with_database(&self.db_database)
            .with_table(&self.db_table)
            .with_id_field(&self.id_field);
        if let (Some(user), Some(pass)) = (&self.db_user, &self.db_pass) {
            config = config.with_credentials(user, pass);
        }
        config
    }
}

#[derive(Args, Debug, Clone)]
pub struct ServeArgs {
    #[command(flatten)]
    pub store: StoreArgs,

    /// Address to bind
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: IpAddr,

    /// Port to listen on
    #[arg(short, long, env = "PORT", default_value_t = 5000)]
    pub port: u16,

    /// Fitted pipeline artifact (JSON)
    #[arg(long, env = "MODEL_PATH", default_value = "models/churn_pipeline.json")]
    pub model_path: PathBuf,

    /// Feature schema (JSON); must match the model's columns
    #[arg(long, env = "FEATURE_SCHEMA_PATH")]
    pub schema_path: Option<PathBuf>,

    /// Probabilities strictly above this are labelled churn
    #[arg(long, env = "CHURN_THRESHOLD", default_value_t = churn_core::DEFAULT_THRESHOLD)]
    pub threshold: f64,
}

impl ServeArgs {
    pub fn addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

#[derive(Args, Debug, Clone)]
pub struct SeedArgs {
    #[command(flatten)]
    pub store: StoreArgs,

    /// Customer documents to load
    #[arg(short, long)]
    pub file: PathBuf,

    /// Append instead of clearing the table first
    #[arg(long)]
    pub keep_existing: bool,

    /// Feature schema (JSON) naming the numeric columns to coerce
    #[arg(long, env = "FEATURE_SCHEMA_PATH")]
    pub schema_path: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serve_parses_explicit_options() {
        let cli = Cli::try_parse_from([
            "churnd",
            "--json",
            "serve",
            "--db-url",
            "mem://",
            "--db-user",
            "svc",
            "--db-pass",
            "pw",
            "--host",
            "127.0.0.1",
            "--port",
            "8080",
            "--model-path",
            "m.json",
            "--threshold",
            "0.35",
        ])
        .unwrap();

        assert!(cli.json);
        let Command::Serve(args) = cli.command else {
            panic!("expected serve");
        };
        assert_eq!(args.addr().to_string(), "127.0.0.1:8080");
        assert_eq!(args.model_path, PathBuf::from("m.json"));
        assert_eq!(args.threshold, 0.35);

        let config = args.store.to_config();
        assert_eq!(config.url, "mem://");
        assert_eq!(config.username.as_deref(), Some("svc"));
        assert_eq!(config.password.as_deref(), Some("pw"));
    }

    #[test]
    fn seed_requires_file() {
        assert!(Cli::try_parse_from(["churnd", "seed"]).is_err());

        let cli = Cli::try_parse_from([
            "churnd",
            "seed",
            "--file",
            "customers.jsonl",
            "--keep-existing",
            "--id-field",
            "customer_number",
        ])
        .unwrap();
        let Command::Seed(args) = cli.command else {
            panic!("expected seed");
        };
        assert!(args.keep_existing);
        assert_eq!(args.store.to_config().id_field, "customer_number");
    }

    #[test]
    fn credentials_need_both_halves() {
        let cli = Cli::try_parse_from([
            "churnd", "seed", "--file", "c.json", "--db-user", "only-user",
        ])
        .unwrap();
        let Command::Seed(args) = cli.command else {
            panic!("expected seed");
        };
        // A password may still come from CHURN_DB_PASS; without one, no sign-in.
        if args.store.db_pass.is_none() {
            assert!(args.store.to_config().username.is_none());
        }
    }

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
