use super::schema::{self, FeatureSchema};
use chrono::{Datelike, NaiveDate};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tracing::debug;

pub const DEFAULT_STOCK_LEVEL: u32 = 50;
pub const DEFAULT_PRICE: f64 = 500.0;

/// Product attributes captured by one form submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawInput {
    pub date: NaiveDate,
    pub category: String,
    pub size: String,
    pub stock_level: u32,
    #[serde(deserialize_with = "deserialize_price")]
    pub price: f64,
}

impl RawInput {
    /// Input carrying the form's default stock level and price.
    pub fn with_defaults(
        date: NaiveDate,
        category: impl Into<String>,
        size: impl Into<String>,
    ) -> Self {
        Self {
            date,
            category: category.into(),
            size: size.into(),
            stock_level: DEFAULT_STOCK_LEVEL,
            price: DEFAULT_PRICE,
        }
    }
}

/// Rejects negative and non-finite prices at the deserialization boundary.
pub fn deserialize_price<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let price = f64::deserialize(deserializer)?;
    if price.is_finite() && price >= 0.0 {
        Ok(price)
    } else {
        Err(serde::de::Error::custom(format!(
            "price must be a non-negative number, got {price}"
        )))
    }
}

/// Numeric row laid out exactly like the trained schema.
#[derive(Debug, Clone)]
pub struct FeatureRecord {
    schema: &'static FeatureSchema,
    values: Vec<f64>,
}

impl FeatureRecord {
    fn zeroed(schema: &'static FeatureSchema) -> Self {
        Self {
            schema,
            values: vec![0.0; schema.len()],
        }
    }

    /// Returns `false` when `column` is not part of the schema; the record is left untouched.
    fn set(&mut self, column: &str, value: f64) -> bool {
        match self.schema.position(column) {
            Some(index) => {
                self.values[index] = value;
                true
            }
            None => false,
        }
    }

    pub fn columns(&self) -> &[String] {
        self.schema.columns()
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, column: &str) -> Option<f64> {
        self.schema
            .position(column)
            .map(|index| self.values[index])
    }

    /// Column/value pairs in schema order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> + '_ {
        self.columns()
            .iter()
            .map(String::as_str)
            .zip(self.values.iter().copied())
    }

    /// The one-hot column set to 1, if the category matched the vocabulary.
    pub fn active_category(&self) -> Option<&str> {
        let range = self.schema.category_range();
        let offset = range.start;
        self.values[range]
            .iter()
            .position(|value| *value == 1.0)
            .map(|index| self.schema.columns()[offset + index].as_str())
    }
}

impl PartialEq for FeatureRecord {
    fn eq(&self, other: &Self) -> bool {
        self.columns() == other.columns() && self.values == other.values
    }
}

impl Serialize for FeatureRecord {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (column, value) in self.iter() {
            map.serialize_entry(column, &value)?;
        }
        map.end()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct TemporalFeatures {
    pub(crate) month: u32,
    pub(crate) is_weekend: bool,
}

impl TemporalFeatures {
    pub(crate) fn from_date(schema: &FeatureSchema, date: NaiveDate) -> Self {
        Self {
            month: date.month(),
            is_weekend: schema.is_weekend(date.weekday()),
        }
    }
}

/// Maps raw form input onto the trained column layout.
///
/// Total for every input: an unknown size takes the fallback ordinal and an unknown
/// category leaves the whole one-hot block at zero.
pub fn encode(raw: &RawInput) -> FeatureRecord {
    let schema = FeatureSchema::trained();
    let mut record = FeatureRecord::zeroed(schema);

    let temporal = TemporalFeatures::from_date(schema, raw.date);
    record.set(schema::MONTH, f64::from(temporal.month));
    record.set(schema::IS_WEEKEND, if temporal.is_weekend { 1.0 } else { 0.0 });
    record.set(
        schema::SIZE_ENCODED,
        f64::from(schema.size_ordinal(&raw.size)),
    );
    record.set(schema::STOCK, f64::from(raw.stock_level));
    record.set(schema::RATE, raw.price);

    let category_column = schema::category_column(&raw.category);
    if !record.set(&category_column, 1.0) {
        debug!(
            category = %raw.category,
            "category outside trained vocabulary; one-hot block left empty"
        );
    }

    record
}
