//! churnd: score customers for churn over HTTP, or seed the customer store.

use std::sync::Arc;

use anyhow::{Context, Result};
use churn_core::{
    init_tracing, seed_store, ChurnPredictor, DecisionPolicy, FeatureSchema, PipelineModel,
    SeedMode,
};
use churn_store::SurrealCustomerStore;
use churnd::config::{Cli, Command, SeedArgs, ServeArgs};
use churnd::startup::{resolve_schema, serve};
use churnd::{build_router, AppState};
use clap::Parser;
use tokio::net::TcpListener;
use tracing::{info, Level};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    init_tracing(cli.json, level);

    match cli.command {
        Command::Serve(args) => cmd_serve(args).await,
        Command::Seed(args) => cmd_seed(args).await,
    }
}

async fn cmd_serve(args: ServeArgs) -> Result<()> {
    let policy = DecisionPolicy::new(args.threshold).context("invalid --threshold")?;

    let model = PipelineModel::load(&args.model_path)
        .with_context(|| format!("failed to load model {}", args.model_path.display()))?;
    let schema = resolve_schema(args.schema_path.as_deref(), &model)?;

    let config = args.store.to_config();
    let id_field = config.id_field.clone();
    let store = SurrealCustomerStore::connect(config)
        .await
        .with_context(|| format!("failed to connect to customer store {}", args.store.db_url))?;

    let digest = model.digest().clone();
    let predictor = ChurnPredictor::new(Arc::new(store), Arc::new(model), schema, policy)
        .with_id_field(id_field);
    let state = AppState::new(Arc::new(predictor), Some(digest));

    let listener = TcpListener::bind(args.addr())
        .await
        .with_context(|| format!("failed to bind {}", args.addr()))?;
    serve(listener, build_router(state)).await
}

async fn cmd_seed(args: SeedArgs) -> Result<()> {
    let schema = match &args.schema_path {
        Some(path) => FeatureSchema::load(path)
            .with_context(|| format!("failed to load feature schema {}", path.display()))?,
        None => FeatureSchema::telco(),
    };
    let mode = if args.keep_existing {
        SeedMode::Append
    } else {
        SeedMode::Replace
    };

    let config = args.store.to_config();
    let id_field = config.id_field.clone();
    let store = SurrealCustomerStore::connect(config)
        .await
        .with_context(|| format!("failed to connect to customer store {}", args.store.db_url))?;

    let report = seed_store(&store, &args.file, &schema, &id_field, mode)
        .await
        .with_context(|| format!("failed to seed from {}", args.file.display()))?;

    info!(
        written = report.written,
        coerced_to_null = report.coerced_to_null,
        "Seed complete"
    );
    println!("Seeded {} customer records", report.written);
    Ok(())
}
