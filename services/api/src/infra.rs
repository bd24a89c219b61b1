use chrono::NaiveDate;
use metrics_exporter_prometheus::PrometheusHandle;
use sales_forecaster::forecasting::ForecastModel;
use sales_forecaster::forecasting::ModelLoadError;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::error;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Loads the artifact once for the process, logging the failure before it halts startup.
pub(crate) fn load_model(path: &Path) -> Result<ForecastModel, ModelLoadError> {
    ForecastModel::load(path).map_err(|err| {
        error!(path = %path.display(), error = %err, "model artifact unavailable");
        err
    })
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}

pub(crate) fn parse_price(raw: &str) -> Result<f64, String> {
    let price: f64 = raw
        .trim()
        .parse()
        .map_err(|err| format!("failed to parse '{raw}' as a price ({err})"))?;
    if price.is_finite() && price >= 0.0 {
        Ok(price)
    } else {
        Err(format!("price must be a non-negative number, got {raw}"))
    }
}
