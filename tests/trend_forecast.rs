mod common;

use common::Fixture;
use energy_outlook::error::AppError;
use energy_outlook::forecast::trend;
use energy_outlook::store::{BlobStore, DirBlobStore};

#[test]
fn solar_forecast_after_history_is_three_predicted_points() {
    let fx = Fixture::standard();
    let pipeline = fx.pipeline();
    pipeline.train_all().unwrap();

    let points = pipeline.forecast_trend("solar", 2024, 2026).unwrap();
    assert_eq!(points.len(), 3);
    assert_eq!(
        points.iter().map(|p| p.year).collect::<Vec<_>>(),
        vec![2024, 2025, 2026]
    );
    assert!(points.iter().all(|p| p.provenance.is_predicted()));
    assert!(points.iter().all(|p| p.value.is_finite()));
}

#[test]
fn repeated_forecasts_are_bit_identical() {
    let fx = Fixture::standard();
    let pipeline = fx.pipeline();
    pipeline.train("solar").unwrap();

    let a = pipeline.forecast_trend("solar", 2020, 2040).unwrap();
    let b = pipeline.forecast_trend("Solar", 2020, 2040).unwrap();
    assert_eq!(a.len(), b.len());
    for (x, y) in a.iter().zip(&b) {
        assert_eq!(x.year, y.year);
        assert_eq!(x.value.to_bits(), y.value.to_bits());
        assert_eq!(x.provenance, y.provenance);
    }

    // A fresh pipeline reading the persisted model gives the same numbers.
    let c = fx.pipeline().forecast_trend("solar", 2020, 2040).unwrap();
    assert_eq!(a, c);
}

#[test]
fn historical_years_inherit_record_provenance() {
    let fx = Fixture::standard();
    let pipeline = fx.pipeline();
    pipeline.train("wind").unwrap();

    let points = pipeline.forecast_trend("wind", 2022, 2025).unwrap();
    let predicted: Vec<bool> = points.iter().map(|p| p.provenance.is_predicted()).collect();
    assert_eq!(predicted, vec![false, false, true, true]);
}

#[test]
fn years_before_history_are_predicted() {
    let fx = Fixture::standard();
    let pipeline = fx.pipeline();
    pipeline.train("hydro").unwrap();

    let points = pipeline.forecast_trend("hydro", 2013, 2015).unwrap();
    assert!(points[0].provenance.is_predicted());
    assert!(points[1].provenance.is_predicted());
    assert!(!points[2].provenance.is_predicted());
}

#[test]
fn inverted_range_is_empty_not_an_error() {
    let fx = Fixture::standard();
    let pipeline = fx.pipeline();
    pipeline.train("solar").unwrap();
    assert!(pipeline.forecast_trend("solar", 2030, 2024).unwrap().is_empty());
}

#[test]
fn last_historical_year_reuses_last_drivers() {
    let fx = Fixture::standard();
    let pipeline = fx.pipeline();
    let dataset = pipeline.national_dataset().unwrap();
    let cfg = &pipeline.config().trend;

    let rows = trend::project_drivers(&dataset.filled, cfg, 2023, 2023).unwrap();
    let pop = dataset.filled.series(&cfg.population_column).unwrap();
    let base = dataset.filled.series(&cfg.baseline_column).unwrap();
    assert_eq!(rows[0].population, pop.last().copied().flatten().unwrap());
    assert_eq!(rows[0].baseline, 12_000.0);
    assert_eq!(rows[0].baseline, base.last().copied().flatten().unwrap());
}

#[test]
fn unknown_metric_and_missing_model() {
    let fx = Fixture::standard();
    let pipeline = fx.pipeline();

    let err = pipeline.forecast_trend("tidal", 2024, 2026).unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
    assert_eq!(err.exit_code(), 2);

    let err = pipeline.forecast_trend("biomass", 2024, 2026).unwrap_err();
    assert!(matches!(err, AppError::ModelUnavailable { .. }));
    assert_eq!(err.exit_code(), 3);
}

#[test]
fn training_persists_one_file_per_target() {
    let fx = Fixture::standard();
    let pipeline = fx.pipeline();
    let models = pipeline.train_all().unwrap();
    assert_eq!(models.len(), 5);
    assert_eq!(pipeline.store().blobs().dir(), fx.model_dir());
    assert!(models.iter().all(|m| m.evaluation.is_some()));

    let keys = DirBlobStore::new(fx.model_dir()).keys().unwrap();
    assert_eq!(
        keys,
        vec!["biomass_gwh", "geothermal_gwh", "hydro_gwh", "solar_gwh", "wind_gwh"]
    );
    assert!(fx.model_dir().join("solar_gwh.model.json").exists());
}

#[test]
fn corrupt_model_file_is_unavailable() {
    let fx = Fixture::standard();
    let pipeline = fx.pipeline();
    pipeline.train("solar").unwrap();
    std::fs::write(fx.model_dir().join("solar_gwh.model.json"), b"{ truncated").unwrap();

    let err = pipeline.forecast_trend("solar", 2024, 2026).unwrap_err();
    assert!(matches!(err, AppError::ModelUnavailable { .. }));
}

#[test]
fn single_row_dataset_has_undefined_growth() {
    let csv = "Year,Population (in millions),Non-Renewable Energy (GWh),Solar (GWh)\n2023,100,5000,10\n";
    let fx = Fixture::new(csv, &common::costs_csv());
    let pipeline = fx.pipeline();
    let dataset = pipeline.national_dataset().unwrap();

    let err = trend::project_drivers(&dataset.filled, &pipeline.config().trend, 2024, 2026).unwrap_err();
    assert!(matches!(err, AppError::GrowthRateUndefined { .. }));
    assert_eq!(err.exit_code(), 4);
}

#[test]
fn extreme_year_is_invalid_input_not_a_panic() {
    let fx = Fixture::standard();
    let pipeline = fx.pipeline();
    pipeline.train("solar").unwrap();

    let err = pipeline.forecast_trend("solar", i32::MIN, i32::MIN).unwrap_err();
    assert!(matches!(err, AppError::InvalidInput { .. }));
}
