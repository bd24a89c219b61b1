use super::encoder::FeatureRecord;
use super::model::DemandModel;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use tracing::warn;

/// Model failure caught at the adapter boundary, with the record that triggered it.
#[derive(Debug, Clone, thiserror::Error)]
#[error("error making prediction: {message}")]
pub struct PredictionFailure {
    pub message: String,
    pub record: FeatureRecord,
}

impl PredictionFailure {
    fn new(message: impl Into<String>, record: &FeatureRecord) -> Self {
        Self {
            message: message.into(),
            record: record.clone(),
        }
    }
}

/// Scores one record, converting every model failure (including a panic) into a
/// [`PredictionFailure`] so the caller stays available for the next request.
pub fn predict_one<M>(model: &M, record: &FeatureRecord) -> Result<f64, PredictionFailure>
where
    M: DemandModel + ?Sized,
{
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| model.predict(record)));

    let failure = match outcome {
        Ok(Ok(prediction)) if prediction.is_finite() => return Ok(prediction),
        Ok(Ok(prediction)) => {
            PredictionFailure::new(format!("model returned a non-finite value ({prediction})"), record)
        }
        Ok(Err(err)) => PredictionFailure::new(err.to_string(), record),
        Err(payload) => PredictionFailure::new(
            format!("model panicked: {}", panic_message(payload.as_ref())),
            record,
        ),
    };

    warn!(error = %failure.message, "prediction failed");
    Err(failure)
}

/// Prediction as shown to the user, one decimal place.
pub fn display_value(prediction: f64) -> String {
    format!("{prediction:.1}")
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
