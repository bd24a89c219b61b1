use crate::infra::{load_model, parse_date, parse_price};
use chrono::{Local, NaiveDate};
use clap::Args;
use sales_forecaster::config::AppConfig;
use sales_forecaster::error::AppError;
use sales_forecaster::forecasting::encoder::{DEFAULT_PRICE, DEFAULT_STOCK_LEVEL};
use sales_forecaster::forecasting::{FeatureSchema, Forecast, Forecaster, RawInput};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Args, Debug)]
pub(crate) struct ForecastArgs {
    /// Product category code, matched exactly against the trained vocabulary
    #[arg(long)]
    pub(crate) category: String,
    /// Garment size (Free, XS, S, M, L, XL, XXL, 3XL)
    #[arg(long)]
    pub(crate) size: String,
    /// Sales date (YYYY-MM-DD). Defaults to today.
    #[arg(long, value_parser = parse_date)]
    pub(crate) date: Option<NaiveDate>,
    /// Current stock level
    #[arg(long, default_value_t = DEFAULT_STOCK_LEVEL)]
    pub(crate) stock: u32,
    /// Selling price (RATE)
    #[arg(long, value_parser = parse_price, default_value_t = DEFAULT_PRICE)]
    pub(crate) price: f64,
    /// Override the configured model artifact path
    #[arg(long)]
    pub(crate) model: Option<PathBuf>,
    /// Print the encoded feature record alongside the forecast
    #[arg(long)]
    pub(crate) show_features: bool,
}

impl ForecastArgs {
    fn raw_input(&self, today: NaiveDate) -> RawInput {
        RawInput {
            date: self.date.unwrap_or(today),
            category: self.category.clone(),
            size: self.size.clone(),
            stock_level: self.stock,
            price: self.price,
        }
    }
}

pub(crate) fn run_forecast(args: ForecastArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let model_path = args
        .model
        .clone()
        .unwrap_or(config.model.artifact_path);

    let model = load_model(&model_path)?;
    let forecaster = Forecaster::new(Arc::new(model));
    let raw = args.raw_input(Local::now().date_naive());

    match forecaster.forecast(&raw) {
        Ok(forecast) => {
            println!("{}", render_forecast(&raw, &forecast, args.show_features));
            Ok(())
        }
        Err(failure) => {
            println!("Debug - Input Data:");
            println!("{}", render_features(failure.record.iter()));
            Err(failure.into())
        }
    }
}

pub(crate) fn run_schema() {
    let schema = FeatureSchema::trained();
    println!("Feature schema v{} ({} columns)", schema.version(), schema.len());
    for (index, column) in schema.columns().iter().enumerate() {
        println!("{index:>3}  {column}");
    }

    println!("\nSize ordinals");
    for (size, ordinal) in schema.size_table() {
        println!("- {size}: {ordinal}");
    }
}

fn render_forecast(raw: &RawInput, forecast: &Forecast, show_features: bool) -> String {
    let mut output = String::new();
    output.push_str("Amazon demand forecast\n");
    output.push_str(&format!(
        "Product: {:?} size {} on {} | stock {} | price {:.2}\n",
        raw.category, raw.size, raw.date, raw.stock_level, raw.price
    ));
    if forecast.features.active_category().is_none() {
        output.push_str("Note: category not in the trained vocabulary; no category column set\n");
    }
    output.push_str(&format!("\nPredicted Sales: {} Units\n", forecast.display()));
    output.push_str(&format!(
        "[{}] {}\n",
        forecast.tier.label(),
        forecast.tier.message()
    ));

    if show_features {
        output.push_str("\nEncoded features\n");
        output.push_str(&render_features(forecast.features.iter()));
    }

    output
}

fn render_features<'a>(features: impl Iterator<Item = (&'a str, f64)>) -> String {
    features
        .map(|(column, value)| format!("- {column}: {value}"))
        .collect::<Vec<_>>()
        .join("\n")
}
