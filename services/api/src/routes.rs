use crate::infra::AppState;
use crate::page::{render_page, PageOutcome};
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Extension, Form, Json, Router};
use chrono::Local;
use sales_forecaster::forecasting::{forecast_router, DemandModel, Forecaster, RawInput};
use serde_json::json;
use std::sync::Arc;
use tracing::info;

pub(crate) fn with_forecast_routes<M>(forecaster: Arc<Forecaster<M>>) -> Router
where
    M: DemandModel + ?Sized + 'static,
{
    let pages = Router::new()
        .route("/", get(form_page))
        .route("/forecast", post(submit_forecast::<M>))
        .with_state(forecaster.clone());

    forecast_router(forecaster)
        .merge(pages)
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
}

pub(crate) async fn form_page() -> Html<String> {
    let today = Local::now().date_naive();
    let defaults = RawInput::with_defaults(today, "TAG", "Free");
    Html(render_page(&defaults, None))
}

pub(crate) async fn submit_forecast<M>(
    State(forecaster): State<Arc<Forecaster<M>>>,
    Form(raw): Form<RawInput>,
) -> Response
where
    M: DemandModel + ?Sized + 'static,
{
    match forecaster.forecast(&raw) {
        Ok(forecast) => {
            info!(
                prediction = forecast.prediction,
                tier = forecast.tier.label(),
                "forecast generated"
            );
            let page = render_page(&raw, Some(PageOutcome::Forecast(&forecast)));
            (StatusCode::OK, Html(page)).into_response()
        }
        Err(failure) => {
            let page = render_page(&raw, Some(PageOutcome::Failure(&failure)));
            (StatusCode::UNPROCESSABLE_ENTITY, Html(page)).into_response()
        }
    }
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
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
