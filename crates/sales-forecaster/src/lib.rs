pub mod config;
pub mod error;
pub mod forecasting;
pub mod telemetry;
