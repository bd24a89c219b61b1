use crate::config::ConfigError;
use crate::forecasting::{ModelLoadError, PredictionFailure};
use crate::telemetry::TelemetryError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use std::fmt;

#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Telemetry(TelemetryError),
    Io(std::io::Error),
    Server(axum::Error),
    Model(ModelLoadError),
    Prediction(PredictionFailure),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration error: {}", err),
            AppError::Telemetry(err) => write!(f, "telemetry error: {}", err),
            AppError::Io(err) => write!(f, "io error: {}", err),
            AppError::Server(err) => write!(f, "server error: {}", err),
            AppError::Model(err) => write!(f, "model error: {}", err),
            AppError::Prediction(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Telemetry(err) => Some(err),
            AppError::Io(err) => Some(err),
            AppError::Server(err) => Some(err),
            AppError::Model(err) => Some(err),
            AppError::Prediction(err) => Some(err),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::Prediction(failure) => {
                let body = Json(json!({
                    "error": failure.to_string(),
                    "features": failure.record,
                }));
                (StatusCode::UNPROCESSABLE_ENTITY, body).into_response()
            }
            other => {
                let body = Json(json!({ "error": other.to_string() }));
                (StatusCode::INTERNAL_SERVER_ERROR, body).into_response()
            }
        }
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<TelemetryError> for AppError {
    fn from(value: TelemetryError) -> Self {
        Self::Telemetry(value)
    }
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<axum::Error> for AppError {
    fn from(value: axum::Error) -> Self {
        Self::Server(value)
    }
}

impl From<ModelLoadError> for AppError {
    fn from(value: ModelLoadError) -> Self {
        Self::Model(value)
    }
}

impl From<PredictionFailure> for AppError {
    fn from(value: PredictionFailure) -> Self {
        Self::Prediction(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forecasting::{encode, RawInput};
    use chrono::NaiveDate;
    use std::path::PathBuf;

    #[test]
    fn model_errors_name_the_missing_path() {
        let error = AppError::from(ModelLoadError::NotFound {
            path: PathBuf::from("amazon_sales_forecaster.bin"),
        });
        let message = error.to_string();
        assert!(message.starts_with("model error: model file not found"));
        assert!(message.contains("amazon_sales_forecaster.bin"));
        assert_eq!(
            error.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn prediction_failures_map_to_unprocessable_entity() {
        let date = NaiveDate::from_ymd_opt(2024, 6, 15).expect("valid date");
        let failure = PredictionFailure {
            message: "shape mismatch".to_string(),
            record: encode(&RawInput::with_defaults(date, "JNE", "M")),
        };
        let response = AppError::from(failure).into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }
}
