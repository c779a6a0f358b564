//! Startup checks and the serve loop.
//!
//! Anything wrong here aborts the process before the listener is bound.

use std::path::Path;

use anyhow::{bail, Context, Result};
use churn_core::{FeatureSchema, PipelineModel};
use tokio::net::TcpListener;
use tracing::info;

/// Resolve the feature schema and make sure it matches the model's columns.
///
/// Without an explicit schema file the Telco layout is assumed.
pub fn resolve_schema(path: Option<&Path>, model: &PipelineModel) -> Result<FeatureSchema> {
    let schema = match path {
        Some(path) => FeatureSchema::load(path)
            .with_context(|| format!("failed to load feature schema {}", path.display()))?,
        None => FeatureSchema::telco(),
    };

    if &schema != model.schema() {
        bail!(
            "feature schema ({} numeric, {} categorical) does not match the {} columns model {} was fit on",
            schema.numeric().len(),
            schema.categorical().len(),
            model.schema().len(),
            model.digest().short(),
        );
    }
    Ok(schema)
}

/// Serve `router` until ctrl-c.
pub async fn serve(listener: TcpListener, router: axum::Router) -> Result<()> {
    let addr = listener.local_addr()?;
    info!(%addr, "churnd listening");
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Shutdown signal received");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use churn_core::{NumericColumn, PipelineArtifact};

    fn tenure_only_model() -> PipelineModel {
        PipelineModel::from_artifact(PipelineArtifact {
            model_name: None,
            trained_at: None,
            roc_auc: None,
            numeric: vec![NumericColumn {
                name: "tenure".to_string(),
                mean: 30.0,
                scale: 20.0,
            }],
            categorical: vec![],
            coefficients: vec![-0.5],
            intercept: 0.0,
        })
        .unwrap()
    }

    #[test]
    fn test_default_schema_must_match_model() {
        let err = resolve_schema(None, &tenure_only_model()).unwrap_err();
        assert!(err.to_string().contains("does not match"));
    }

    #[test]
    fn test_schema_file_matching_model() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("schema.json");
        std::fs::write(&path, r#"{"numeric": ["tenure"], "categorical": []}"#).unwrap();

        let schema = resolve_schema(Some(&path), &tenure_only_model()).unwrap();
        assert_eq!(schema.numeric(), ["tenure".to_string()]);
    }

    #[test]
    fn test_missing_schema_file() {
        let err = resolve_schema(Some(Path::new("/nonexistent/schema.json")), &tenure_only_model())
            .unwrap_err();
        assert!(err.to_string().contains("failed to load feature schema"));
    }
}
