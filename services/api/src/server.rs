use crate::cli::ServeArgs;
use crate::infra::AppState;
use crate::routes::with_selection_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use stat_selector::config::AppConfig;
use stat_selector::error::AppError;
use stat_selector::telemetry;
use stat_selector::workflows::selection::{ModelBundle, TestSelectionService};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let bundle = Arc::new(ModelBundle::load_configured(&config.artifacts)?);
    let model_version = bundle.version().to_string();
    let selection_service = Arc::new(TestSelectionService::new(bundle));

    let app = with_selection_routes(selection_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, %model_version, "statistical test selector ready");

    axum::serve(listener, app).await?;
    Ok(())
}
