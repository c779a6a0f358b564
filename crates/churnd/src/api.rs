//! HTTP surface: a landing page, `POST /predict_by_id` and `GET /health`.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{FromRequest, Request, State};
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Form, Json, Router};
use churn_core::{ChurnError, ChurnPredictor, ModelDigest, PredictionResult};
use serde::Deserialize;
use serde_json::{json, Value};
use tower_http::trace::TraceLayer;

const INDEX_HTML: &str = include_str!("../static/index.html");

/// Shared per-process state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub predictor: Arc<ChurnPredictor>,
    pub model_digest: Option<ModelDigest>,
}

impl AppState {
    pub fn new(predictor: Arc<ChurnPredictor>, model_digest: Option<ModelDigest>) -> Self {
        Self {
            predictor,
            model_digest,
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/predict_by_id", post(predict_by_id))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Maps a scoring failure onto its HTTP status and `{"error": ...}` body.
#[derive(Debug)]
pub struct ApiError(pub ChurnError);

impl From<ChurnError> for ApiError {
    fn from(err: ChurnError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self.0 {
            ChurnError::InvalidInput => (StatusCode::BAD_REQUEST, self.0.to_string()),
            ChurnError::NotFound { .. } => (StatusCode::NOT_FOUND, self.0.to_string()),
            // Details are logged by the predictor; clients get a fixed message.
            ChurnError::InferenceFailure(_) | ChurnError::Store(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Prediction failed".to_string(),
            ),
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "model_digest": state.model_digest.as_ref().map(|d| d.as_str()),
        "threshold": state.predictor.policy().threshold(),
    }))
}

async fn predict_by_id(
    State(state): State<AppState>,
    request: Request,
) -> Result<Json<PredictionResult>, ApiError> {
    let customer_id = read_customer_id(request).await;
    let result = state.predictor.predict_by_id(customer_id.as_deref()).await?;
    Ok(Json(result))
}

#[derive(Deserialize)]
struct FormBody {
    customer_id: Option<String>,
}

/// Pull `customer_id` out of a JSON or form-encoded body.
///
/// Anything unreadable yields `None`, which the predictor rejects as
/// invalid input.
async fn read_customer_id(request: Request) -> Option<String> {
    let is_form = request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|ct| ct.starts_with("application/x-www-form-urlencoded"));

    if is_form {
        let Form(body) = Form::<FormBody>::from_request(request, &()).await.ok()?;
        return body.customer_id;
    }

    let bytes = Bytes::from_request(request, &()).await.ok()?;
    let body: Value = serde_json::from_slice(&bytes).ok()?;
    match body.get("customer_id")? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use churn_core::InferenceError;
    use churn_store::StoreError;

    async fn body_json(response: Response) -> (StatusCode, Value) {
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_invalid_input_is_400() {
        let (status, body) = body_json(ApiError(ChurnError::InvalidInput).into_response()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({"error": "Please provide a customer_id"}));
    }

    #[tokio::test]
    async fn test_not_found_is_404_with_fragment() {
        let err = ChurnError::NotFound {
            fragment: "doesnotexist".to_string(),
        };
        let (status, body) = body_json(ApiError(err).into_response()).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(
            body,
            json!({"error": "No customer found matching the input 'doesnotexist'"})
        );
    }

    #[tokio::test]
    async fn test_failures_hide_detail() {
        for err in [
            ChurnError::InferenceFailure(InferenceError::InvalidProbability(2.0)),
            ChurnError::Store(StoreError::Query("connection reset".to_string())),
        ] {
            let (status, body) = body_json(ApiError(err).into_response()).await;
            assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
            assert_eq!(body, json!({"error": "Prediction failed"}));
        }
    }

    fn request(content_type: &str, body: &'static str) -> Request {
        Request::builder()
            .method("POST")
            .uri("/predict_by_id")
            .header(header::CONTENT_TYPE, content_type)
            .body(axum::body::Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn test_read_customer_id_variants() {
        let cases = [
            ("application/json", r#"{"customer_id": "7590"}"#, Some("7590")),
            ("application/json", r#"{"customer_id": 7590}"#, Some("7590")),
            ("application/json", r#"{"customer_id": null}"#, None),
            ("application/json", r#"{"customer_id": ["7590"]}"#, None),
            ("application/json", r#"{}"#, None),
            ("application/json", "not json", None),
            ("application/json", r#"["7590"]"#, None),
            ("text/plain", r#"{"customer_id": "7590"}"#, Some("7590")),
            ("application/x-www-form-urlencoded", "customer_id=7590-VH", Some("7590-VH")),
            ("application/x-www-form-urlencoded", "other=1", None),
        ];
        for (content_type, body, expected) in cases {
            let got = read_customer_id(request(content_type, body)).await;
            assert_eq!(got.as_deref(), expected, "{content_type}: {body}");
        }
    }
}
