use chrono::NaiveDate;
use sales_forecaster::error::AppError;
use sales_forecaster::forecasting::{
    DemandTier, Estimator, FeatureSchema, ForecastModel, Forecaster, ModelArtifact,
    ModelLoadError, RawInput, RegressionTree,
};
use std::sync::Arc;
use tempfile::TempDir;

fn reference_input() -> RawInput {
    let saturday = NaiveDate::from_ymd_opt(2024, 6, 15).expect("valid date");
    RawInput::with_defaults(saturday, "JNE", "M")
}

/// Weekend JNE orders sell well; everything else is driven by stock on hand.
fn forest_artifact() -> ModelArtifact {
    let schema = FeatureSchema::trained();
    let weekend = schema.position("Is_Weekend").expect("weekend column");
    let jne = schema.position("Category_JNE").expect("jne column");
    let stock = schema.position("Stock").expect("stock column");

    let trees = vec![
        RegressionTree::split(
            jne,
            0.5,
            RegressionTree::split(
                stock,
                10.0,
                RegressionTree::leaf(2.0),
                RegressionTree::leaf(8.0),
            ),
            RegressionTree::split(
                weekend,
                0.5,
                RegressionTree::leaf(12.0),
                RegressionTree::leaf(30.0),
            ),
        ),
        RegressionTree::split(
            stock,
            10.0,
            RegressionTree::leaf(1.0),
            RegressionTree::leaf(20.0),
        ),
    ];

    ModelArtifact::for_trained_schema("amazon-sales-forest", Estimator::Forest { trees })
}

fn saved_model(dir: &TempDir) -> ForecastModel {
    let path = dir.path().join("amazon_sales_forecaster.bin");
    forest_artifact().save(&path).expect("artifact saved");
    ForecastModel::load(&path).expect("artifact loads")
}

#[test]
fn reference_submission_flows_through_saved_model() {
    let dir = TempDir::new().expect("temp dir");
    let model = saved_model(&dir);
    assert_eq!(model.name(), "amazon-sales-forest");

    let forecaster = Forecaster::new(Arc::new(model));
    let forecast = forecaster
        .forecast(&reference_input())
        .expect("forecast succeeds");

    assert_eq!(forecast.features.get("Month"), Some(6.0));
    assert_eq!(forecast.features.get("Is_Weekend"), Some(1.0));
    assert_eq!(forecast.features.get("Size_Encoded"), Some(3.0));
    assert_eq!(forecast.features.get("Stock"), Some(50.0));
    assert_eq!(forecast.features.get("RATE"), Some(500.0));
    assert_eq!(forecast.features.active_category(), Some("Category_JNE"));

    assert!((forecast.prediction - 25.0).abs() < 1e-9);
    assert_eq!(forecast.display(), "25.0");
    assert_eq!(forecast.tier, DemandTier::High);
}

#[test]
fn out_of_vocabulary_category_still_scores() {
    let dir = TempDir::new().expect("temp dir");
    let forecaster = Forecaster::new(Arc::new(saved_model(&dir)));

    let input = RawInput {
        category: "Western".to_string(),
        stock_level: 5,
        ..reference_input()
    };
    let forecast = forecaster.forecast(&input).expect("forecast succeeds");

    assert_eq!(forecast.features.active_category(), None);
    assert!((forecast.prediction - 1.5).abs() < 1e-9);
    assert_eq!(forecast.tier, DemandTier::Low);
}

#[test]
fn missing_artifact_names_the_path() {
    let dir = TempDir::new().expect("temp dir");
    let path = dir.path().join("amazon_sales_forecaster.bin");

    let error = ForecastModel::load(&path).expect_err("missing artifact is fatal");
    match &error {
        ModelLoadError::NotFound { path: reported } => assert_eq!(reported, &path),
        other => panic!("expected not found, got {other:?}"),
    }

    let message = AppError::from(error).to_string();
    assert!(message.contains("amazon_sales_forecaster.bin"));
}

#[test]
fn corrupt_artifact_is_rejected() {
    let dir = TempDir::new().expect("temp dir");
    let path = dir.path().join("garbage.bin");
    std::fs::write(&path, b"\x01\x00\x00\x00not a model").expect("write garbage");

    let error = ForecastModel::load(&path).expect_err("corrupt artifact rejected");
    assert!(matches!(error, ModelLoadError::Corrupt { .. }));
    assert!(error.to_string().contains("garbage.bin"));
}

#[test]
fn schema_drift_surfaces_as_prediction_failure() {
    let mut names = FeatureSchema::trained().columns().to_vec();
    names.retain(|name| name != "Category_sEt");
    let coefficients = vec![1.0; names.len()];
    let artifact = ModelArtifact::new(
        "retrained-without-sEt",
        names,
        Estimator::Linear {
            intercept: 0.0,
            coefficients,
        },
    );

    let dir = TempDir::new().expect("temp dir");
    let path = dir.path().join("drifted.bin");
    artifact.save(&path).expect("artifact saved");
    let forecaster = Forecaster::new(Arc::new(ForecastModel::load(&path).expect("loads")));

    let failure = forecaster
        .forecast(&reference_input())
        .expect_err("drifted model fails at prediction time");
    assert!(failure.message.contains("32 columns"));
    assert_eq!(failure.record.get("Category_JNE"), Some(1.0));

    let retry = RawInput {
        category: "SET".to_string(),
        ..reference_input()
    };
    assert!(forecaster.forecast(&retry).is_err());
}
