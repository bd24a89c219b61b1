use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use super::adapter::{display_value, predict_one, PredictionFailure};
use super::classifier::DemandTier;
use super::encoder::{encode, FeatureRecord, RawInput};
use super::model::DemandModel;

/// Composes the encoder, the prediction adapter, and the tier classifier.
pub struct Forecaster<M: ?Sized> {
    model: Arc<M>,
}

/// Outcome of one successful forecast.
#[derive(Debug, Clone, Serialize)]
pub struct Forecast {
    pub prediction: f64,
    pub tier: DemandTier,
    pub features: FeatureRecord,
}

impl Forecast {
    pub fn display(&self) -> String {
        display_value(self.prediction)
    }
}

impl<M> Forecaster<M>
where
    M: DemandModel + ?Sized,
{
    pub fn new(model: Arc<M>) -> Self {
        Self { model }
    }

    pub fn forecast(&self, raw: &RawInput) -> Result<Forecast, PredictionFailure> {
        let features = encode(raw);
        let prediction = predict_one(self.model.as_ref(), &features)?;
        let tier = DemandTier::classify(prediction);

        debug!(
            prediction,
            tier = tier.label(),
            category = %raw.category,
            "forecast computed"
        );

        Ok(Forecast {
            prediction,
            tier,
            features,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forecasting::model::ModelError;
    use chrono::NaiveDate;

    struct StockEcho;

    impl DemandModel for StockEcho {
        fn predict(&self, record: &FeatureRecord) -> Result<f64, ModelError> {
            record
                .get("Stock")
                .ok_or_else(|| ModelError::MissingFeature("Stock".to_string()))
        }
    }

    fn input(stock_level: u32) -> RawInput {
        let date = NaiveDate::from_ymd_opt(2024, 6, 15).expect("valid date");
        RawInput {
            stock_level,
            ..RawInput::with_defaults(date, "JNE", "M")
        }
    }

    #[test]
    fn forecast_classifies_prediction() {
        let forecaster = Forecaster::new(Arc::new(StockEcho));

        let high = forecaster.forecast(&input(25)).expect("forecast");
        assert_eq!(high.tier, DemandTier::High);
        assert_eq!(high.display(), "25.0");
        assert_eq!(high.features.get("Category_JNE"), Some(1.0));

        let low = forecaster.forecast(&input(4)).expect("forecast");
        assert_eq!(low.tier, DemandTier::Low);

        let boundary = forecaster.forecast(&input(20)).expect("forecast");
        assert_eq!(boundary.tier, DemandTier::Moderate);
    }

    #[test]
    fn accepts_shared_trait_objects() {
        let model: Arc<dyn DemandModel> = Arc::new(StockEcho);
        let forecaster = Forecaster::new(model);
        let forecast = forecaster.forecast(&input(5)).expect("forecast");
        assert_eq!(forecast.tier, DemandTier::Moderate);
    }
}
