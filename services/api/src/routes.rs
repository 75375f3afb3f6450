use crate::infra::AppState;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Extension;
use axum::Json;
use serde_json::json;
use stat_selector::workflows::selection::{selection_router, TestSelectionService};
use std::sync::Arc;

pub(crate) fn with_selection_routes(service: Arc<TestSelectionService>) -> axum::Router {
    selection_router(service)
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Acquire);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use metrics_exporter_prometheus::PrometheusBuilder;
    use stat_selector::workflows::selection::{
        train_bundle, ModelBundle, TrainingCorpus, TrainingOptions,
    };
    use std::sync::atomic::{AtomicBool, Ordering};
    use tower::ServiceExt;

    const CORPUS: &str = include_str!("../../../crates/stat-selector/data/training_corpus.csv");

    fn service() -> Arc<TestSelectionService> {
        let corpus = TrainingCorpus::from_reader(CORPUS.as_bytes()).expect("corpus parses");
        let (classifier, encoder) =
            train_bundle(&corpus, &TrainingOptions::new("routes-test")).expect("trains");
        let bundle = ModelBundle::new(classifier, encoder).expect("artifacts pair up");
        Arc::new(TestSelectionService::new(Arc::new(bundle)))
    }

    fn state(ready: bool) -> AppState {
        AppState {
            readiness: Arc::new(AtomicBool::new(ready)),
            metrics: Arc::new(PrometheusBuilder::new().build_recorder().handle()),
        }
    }

    #[tokio::test]
    async fn readiness_reports_initializing_until_flagged() {
        let state = state(false);

        let response = readiness_endpoint(Extension(state.clone()))
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        state.readiness.store(true, Ordering::Release);
        let response = readiness_endpoint(Extension(state)).await.into_response();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn metrics_are_rendered_as_prometheus_text() {
        let response = metrics_endpoint(Extension(state(true))).await.into_response();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).expect("content type"),
            "text/plain; version=0.0.4"
        );
    }

    #[tokio::test]
    async fn operational_and_selection_routes_share_one_router() {
        let router = with_selection_routes(service()).layer(Extension(state(true)));

        let health = router
            .clone()
            .oneshot(
                axum::http::Request::get("/health")
                    .body(axum::body::Body::empty())
                    .unwrap(),
            )
            .await
            .expect("route executes");
        assert_eq!(health.status(), StatusCode::OK);

        let model = router
            .oneshot(
                axum::http::Request::get("/api/v1/model")
                    .body(axum::body::Body::empty())
                    .unwrap(),
            )
            .await
            .expect("route executes");
        assert_eq!(model.status(), StatusCode::OK);
        let body = axum::body::to_bytes(model.into_body(), 64 * 1024)
            .await
            .expect("read body");
        let payload: serde_json::Value = serde_json::from_slice(&body).expect("json payload");
        assert_eq!(payload["version"], "routes-test");
    }
}
