//! End-to-end tests: CSV -> cleaning -> features -> training -> registry -> inference

use agri_price_core::features::{MIN_PRICE, MONTH};
use agri_price_core::{
    InferenceAdapter, InferenceError, QueryRow, Regressor, UnseenCategoryPolicy, FEATURE_COUNT,
};
use agri_price_registry::ModelRegistry;
use agri_price_trainer::{dataset, pipeline, DataCleaner, PipelineConfig, RawRecord};
use anyhow::Result;
use chrono::{Days, NaiveDate};
use std::io::Write;
use tempfile::{NamedTempFile, TempDir};

const COMMODITIES: [(&str, f64); 3] = [("Tomato", 1200.0), ("Onion", 2000.0), ("Potato", 900.0)];

/// 100 rows over three commodities with deterministic price movement
fn synthetic_csv() -> Result<NamedTempFile> {
    let mut file = NamedTempFile::new()?;
    writeln!(
        file,
        "State,District,Market,Commodity,Variety,Grade,Arrival_Date,Min Price,Max Price,Modal Price"
    )?;
    let start = NaiveDate::from_ymd_opt(2023, 11, 1).unwrap();
    for i in 0..100u64 {
        let (commodity, base) = COMMODITIES[(i % 3) as usize];
        let market = ["Azadpur", "Ghazipur", "Okhla"][(i % 4 % 3) as usize];
        let wobble = ((i * 37) % 17) as f64 * 6.0;
        let modal = base + wobble + (i / 3) as f64 * 2.5;
        let min = modal - 100.0 - (i % 5) as f64 * 10.0;
        let max = modal + 120.0;
        let date = (start + Days::new(i)).format("%d-%m-%Y");
        writeln!(
            file,
            "Delhi,Delhi,{market},{commodity},Local,FAQ,{date},{min},{max},{modal}"
        )?;
    }
    file.flush()?;
    Ok(file)
}

fn fast_config(models: &std::path::Path) -> PipelineConfig {
    let mut config = PipelineConfig::default();
    config.forest.n_estimators = 25;
    config.boosting.n_rounds = 40;
    config.registry.model_dir = models.to_path_buf();
    config
}

fn query(commodity: &str) -> QueryRow {
    QueryRow {
        state: "Delhi".into(),
        district: "Delhi".into(),
        market: "Azadpur".into(),
        commodity: commodity.into(),
        variety: "Local".into(),
        grade: "FAQ".into(),
        arrival_date: "15-12-2023".into(),
        min_price: 1150.0,
        max_price: 1400.0,
    }
}

#[test]
fn test_end_to_end_training_and_reload() -> Result<()> {
    let csv = synthetic_csv()?;
    let models = TempDir::new()?;
    let config = fast_config(models.path());
    let registry = ModelRegistry::open(models.path());

    let raw = dataset::load_csv(csv.path())?;
    assert_eq!(raw.len(), 100);
    let run = pipeline::train_and_save(&raw, &[], &config, &registry)?;
    let report = &run.artifacts().report;

    assert_eq!(report.train_rows, 80);
    assert_eq!(report.test_rows, 20);
    for metrics in [report.bagging, report.boosted] {
        assert!(metrics.rmse >= 0.0);
        assert!(metrics.mae >= 0.0);
        assert!(metrics.r2 <= 1.0);
    }
    // Commodity drives the price, so the models must beat the mean predictor
    assert!(report.bagging.r2 > 0.5, "forest r2 {}", report.bagging.r2);
    assert!(report.boosted.r2 > 0.5, "boosted r2 {}", report.boosted.r2);

    let loaded = ModelRegistry::open(models.path()).load_artifacts()?;
    let test_rows = &run.outcome.test_rows;
    let before = run.artifacts().bagging.predict_rows(test_rows);
    let after = loaded.bagging.predict_rows(test_rows);
    assert!(before.iter().zip(&after).all(|(a, b)| a.to_bits() == b.to_bits()));
    let before = run.artifacts().boosted.predict_rows(test_rows);
    let after = loaded.boosted.predict_rows(test_rows);
    assert!(before.iter().zip(&after).all(|(a, b)| a.to_bits() == b.to_bits()));

    let adapter = InferenceAdapter::new(loaded, UnseenCategoryPolicy::Reject)?;
    let prediction = adapter.predict(&query("Tomato"))?;
    assert!((800.0..=2500.0).contains(&prediction.bagging));
    assert!(prediction.boosted.is_finite());
    Ok(())
}

#[test]
fn test_swapping_feature_columns_changes_predictions() -> Result<()> {
    let csv = synthetic_csv()?;
    let models = TempDir::new()?;
    let raw = dataset::load_csv(csv.path())?;
    let run = pipeline::run_training(&raw, &[], &fast_config(models.path()))?;

    let rows = &run.outcome.test_rows;
    let swapped: Vec<[f64; FEATURE_COUNT]> = rows
        .iter()
        .map(|r| {
            let mut r = *r;
            r.swap(MIN_PRICE, MONTH);
            r
        })
        .collect();

    let boosted = &run.artifacts().boosted;
    assert_ne!(boosted.predict_rows(rows), boosted.predict_rows(&swapped));
    let bagging = &run.artifacts().bagging;
    assert_ne!(bagging.predict_rows(rows), bagging.predict_rows(&swapped));
    Ok(())
}

#[test]
fn test_unseen_commodity_is_rejected() -> Result<()> {
    let csv = synthetic_csv()?;
    let models = TempDir::new()?;
    let raw = dataset::load_csv(csv.path())?;
    let run = pipeline::run_training(&raw, &[], &fast_config(models.path()))?;

    let strict = InferenceAdapter::new(run.artifacts().clone(), UnseenCategoryPolicy::Reject)?;
    match strict.predict(&query("Saffron")) {
        Err(InferenceError::UnseenCategory { field, value }) => {
            assert_eq!(field, "Commodity");
            assert_eq!(value, "Saffron");
        }
        other => panic!("expected UnseenCategory, got {other:?}"),
    }

    let lenient = InferenceAdapter::new(run.artifacts().clone(), UnseenCategoryPolicy::Fallback)?;
    assert!(lenient.predict(&query("Saffron")).is_ok());
    Ok(())
}

#[test]
fn test_query_rows_as_reference_avoid_unseen_errors() -> Result<()> {
    let csv = synthetic_csv()?;
    let models = TempDir::new()?;
    let config = fast_config(models.path());
    let registry = ModelRegistry::open(models.path());
    let q = query("Garlic");

    let artifacts =
        pipeline::load_or_train(&registry, &config, Some(csv.path()), std::slice::from_ref(&q))?;
    let adapter = InferenceAdapter::new(artifacts, UnseenCategoryPolicy::Reject)?;
    let (prediction, report) = adapter.predict_with_report(&q)?;
    assert!(prediction.bagging.is_finite());
    assert_eq!(report.test_rows, 20);
    Ok(())
}

#[test]
fn test_training_is_deterministic() -> Result<()> {
    let csv = synthetic_csv()?;
    let models = TempDir::new()?;
    let raw = dataset::load_csv(csv.path())?;
    let config = fast_config(models.path());

    let a = pipeline::run_training(&raw, &[], &config)?;
    let b = pipeline::run_training(&raw, &[], &config)?;
    assert_eq!(a.artifacts().bagging, b.artifacts().bagging);
    assert_eq!(a.artifacts().boosted, b.artifacts().boosted);
    assert_eq!(a.artifacts().preprocessor, b.artifacts().preprocessor);
    assert_eq!(a.artifacts().report.bagging, b.artifacts().report.bagging);
    Ok(())
}

#[test]
fn test_price_columns_are_never_reordered() {
    let row = |date: &str, min: f64, max: f64, modal: f64| RawRecord {
        state: "Delhi".into(),
        district: "Delhi".into(),
        market: "Okhla".into(),
        commodity: "Tomato".into(),
        variety: "Local".into(),
        grade: "FAQ".into(),
        arrival_date: date.into(),
        min_price: Some(min),
        max_price: Some(max),
        modal_price: Some(modal),
    };
    // Modal below Min, Max below Min: kept exactly as given
    let raw = vec![
        row("01-01-2024", 1000.0, 900.0, 800.0),
        row("02-01-2024", 1010.0, 910.0, 810.0),
        row("03-01-2024", 1020.0, 920.0, 820.0),
    ];
    let (records, _) = DataCleaner::default().clean(&raw);
    for (record, raw) in records.iter().zip(&raw) {
        assert_eq!(Some(record.min_price), raw.min_price);
        assert_eq!(Some(record.max_price), raw.max_price);
        assert_eq!(Some(record.modal_price), raw.modal_price);
    }
}
