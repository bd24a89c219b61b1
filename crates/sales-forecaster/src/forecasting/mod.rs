//! Demand forecasting: feature encoding, model invocation, and tier classification.

pub mod adapter;
pub mod classifier;
pub mod encoder;
pub mod model;
pub mod router;
pub mod schema;
mod service;

pub use adapter::{display_value, predict_one, PredictionFailure};
pub use classifier::DemandTier;
pub use encoder::{encode, FeatureRecord, RawInput};
pub use model::{
    DemandModel, Estimator, ForecastModel, ModelArtifact, ModelError, ModelLoadError,
    RegressionTree, TreeNode,
};
pub use router::forecast_router;
pub use schema::FeatureSchema;
pub use service::{Forecast, Forecaster};
