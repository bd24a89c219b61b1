use crate::cli::ServeArgs;
use crate::infra::{load_model, AppState};
use crate::routes::with_forecast_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use sales_forecaster::config::AppConfig;
use sales_forecaster::error::AppError;
use sales_forecaster::forecasting::Forecaster;
use sales_forecaster::telemetry;
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
    if let Some(model) = args.model.take() {
        config.model.artifact_path = model;
    }

    telemetry::init(&config.telemetry)?;

    // Loaded once, before binding.
    let model = load_model(&config.model.artifact_path)?;
    let model_name = model.name().to_string();
    let forecaster = Arc::new(Forecaster::new(Arc::new(model)));

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let app = with_forecast_routes(forecaster)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, model = %model_name, "sales forecaster ready");

    axum::serve(listener, app).await?;
    Ok(())
}
