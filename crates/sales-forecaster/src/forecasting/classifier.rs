use serde::Serialize;

/// Predictions strictly above this are high demand.
pub const HIGH_DEMAND_THRESHOLD: f64 = 20.0;
/// Predictions strictly below this are low demand.
pub const LOW_DEMAND_THRESHOLD: f64 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DemandTier {
    High,
    Moderate,
    Low,
}

impl DemandTier {
    /// Both thresholds are exclusive, so 5.0 and 20.0 are moderate.
    pub fn classify(prediction: f64) -> Self {
        if prediction > HIGH_DEMAND_THRESHOLD {
            Self::High
        } else if prediction < LOW_DEMAND_THRESHOLD {
            Self::Low
        } else {
            Self::Moderate
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::High => "high demand",
            Self::Moderate => "moderate demand",
            Self::Low => "low demand",
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            Self::High => "High Demand Expected! Ensure stock is available.",
            Self::Moderate => "Moderate Demand.",
            Self::Low => "Low Demand Expected. Consider a discount?",
        }
    }
}
