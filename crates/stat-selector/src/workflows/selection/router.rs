use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::Serialize;
use serde_json::json;

use super::artifacts::RecommendError;
use super::domain::CaseSubmission;
use super::encoding::{HandleUnknown, FEATURE_COLUMNS};
use super::service::{SelectionError, TestSelectionService};

/// Router builder exposing the recommendation endpoints.
pub fn selection_router(service: Arc<TestSelectionService>) -> Router {
    Router::new()
        .route("/api/v1/recommendations", post(recommend_handler))
        .route("/api/v1/model", get(model_handler))
        .with_state(service)
}

pub(crate) async fn recommend_handler(
    State(service): State<Arc<TestSelectionService>>,
    payload: Result<axum::Json<CaseSubmission>, JsonRejection>,
) -> Response {
    let submission = match payload {
        Ok(axum::Json(submission)) => submission,
        Err(rejection) => return malformed_body(&rejection),
    };

    match service.submit(submission) {
        Ok(result) => (StatusCode::OK, axum::Json(result)).into_response(),
        Err(SelectionError::InvalidInput(error)) => {
            let payload = json!({
                "error": error.to_string(),
                "field": error.field(),
            });
            (StatusCode::BAD_REQUEST, axum::Json(payload)).into_response()
        }
        Err(SelectionError::Recommend(RecommendError::Encoding(error))) => {
            let payload = json!({
                "error": error.to_string(),
            });
            (StatusCode::UNPROCESSABLE_ENTITY, axum::Json(payload)).into_response()
        }
        Err(other) => {
            let payload = json!({
                "error": other.to_string(),
            });
            (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(payload)).into_response()
        }
    }
}

/// Bodies that never reach the submission boundary: bad JSON, wrong types, missing fields.
fn malformed_body(rejection: &JsonRejection) -> Response {
    let message = rejection.body_text();
    let field = rejected_field(&message);
    let payload = json!({
        "error": message,
        "field": field,
    });
    (StatusCode::BAD_REQUEST, axum::Json(payload)).into_response()
}

/// Pulls the offending key out of serde's message, e.g. "missing field `normality`"
/// or `num_groups: invalid type: string "3", expected i64`.
fn rejected_field(message: &str) -> Option<String> {
    if let Some((_, rest)) = message.split_once("missing field `") {
        return rest.split_once('`').map(|(field, _)| field.to_string());
    }
    let (_, detail) = message.split_once(": ")?;
    let (path, _) = detail.split_once(": ")?;
    let field = path.trim();
    let is_path = !field.is_empty()
        && field
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || "_.[]".contains(ch));
    is_path.then(|| field.to_string())
}

#[derive(Debug, Serialize)]
pub struct ModelInfoView {
    pub version: String,
    pub classes: Vec<String>,
    pub handle_unknown: HandleUnknown,
    pub features: Vec<&'static str>,
    pub n_features: usize,
}

pub(crate) async fn model_handler(State(service): State<Arc<TestSelectionService>>) -> Response {
    let bundle = service.bundle();
    let view = ModelInfoView {
        version: bundle.version().to_string(),
        classes: bundle.classifier().classes().to_vec(),
        handle_unknown: bundle.encoder().handle_unknown(),
        features: FEATURE_COLUMNS.to_vec(),
        n_features: bundle.classifier().n_features(),
    };
    (StatusCode::OK, axum::Json(view)).into_response()
}
