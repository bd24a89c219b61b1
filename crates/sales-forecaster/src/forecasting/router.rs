use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::encoder::{
    deserialize_price, FeatureRecord, RawInput, DEFAULT_PRICE, DEFAULT_STOCK_LEVEL,
};
use super::model::DemandModel;
use super::schema::{FeatureSchema, SchemaView};
use super::service::Forecaster;

/// JSON body for a single forecast. Omitted fields take the form defaults.
#[derive(Debug, Deserialize)]
pub struct ForecastRequest {
    #[serde(default)]
    pub date: Option<NaiveDate>,
    pub category: String,
    pub size: String,
    #[serde(default = "default_stock_level")]
    pub stock_level: u32,
    #[serde(default = "default_price", deserialize_with = "deserialize_price")]
    pub price: f64,
}

impl ForecastRequest {
    pub fn into_raw_input(self, today: NaiveDate) -> RawInput {
        RawInput {
            date: self.date.unwrap_or(today),
            category: self.category,
            size: self.size,
            stock_level: self.stock_level,
            price: self.price,
        }
    }
}

fn default_stock_level() -> u32 {
    DEFAULT_STOCK_LEVEL
}

fn default_price() -> f64 {
    DEFAULT_PRICE
}

#[derive(Debug, Serialize)]
pub struct ForecastResponse {
    pub date: NaiveDate,
    pub prediction: f64,
    pub display: String,
    pub tier: &'static str,
    pub message: &'static str,
    pub features: FeatureRecord,
}

/// Router builder exposing the JSON forecasting endpoints.
pub fn forecast_router<M>(forecaster: Arc<Forecaster<M>>) -> Router
where
    M: DemandModel + ?Sized + 'static,
{
    Router::new()
        .route("/api/v1/forecast", post(forecast_handler::<M>))
        .route("/api/v1/schema", get(schema_handler))
        .with_state(forecaster)
}

pub(crate) async fn forecast_handler<M>(
    State(forecaster): State<Arc<Forecaster<M>>>,
    Json(request): Json<ForecastRequest>,
) -> Response
where
    M: DemandModel + ?Sized + 'static,
{
    let raw = request.into_raw_input(Local::now().date_naive());

    match forecaster.forecast(&raw) {
        Ok(forecast) => {
            let body = ForecastResponse {
                date: raw.date,
                prediction: forecast.prediction,
                display: forecast.display(),
                tier: forecast.tier.label(),
                message: forecast.tier.message(),
                features: forecast.features,
            };
            (StatusCode::OK, Json(body)).into_response()
        }
        Err(failure) => {
            let payload = json!({
                "error": failure.to_string(),
                "features": failure.record,
            });
            (StatusCode::UNPROCESSABLE_ENTITY, Json(payload)).into_response()
        }
    }
}

pub(crate) async fn schema_handler() -> Json<SchemaView> {
    Json(FeatureSchema::trained().view())
}
