//! Trend Forecaster.
//!
//! One linear model per target metric over `(year, population, baseline)`.
//!
//! Training fits the coefficients on every usable row of the forward-filled
//! dataset; a seeded 80/20 split is fitted separately only to report MAE/MSE.
//!
//! Forecasting projects the two drivers forward by compounding their last value
//! at the mean historical growth rate, then feeds them through the model.

use chrono::Utc;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use tracing::{debug, info};

use crate::config::{TargetConfig, TrendConfig};
use crate::domain::{DriverRow, Evaluation, FittedTrendModel, ForecastPoint, HistoricalDataset, Provenance};
use crate::error::AppError;
use crate::math::{compound, fit_linear, mean_absolute_error, mean_growth_rate, mean_squared_error};
use crate::store::normalize_metric_key;

const MIN_TRAINING_ROWS: usize = 2;

/// Fit the model for `target` on the forward-filled dataset.
pub fn train(
    dataset: &HistoricalDataset,
    target: &TargetConfig,
    cfg: &TrendConfig,
) -> Result<FittedTrendModel, AppError> {
    let (features, y) = training_rows(dataset, &target.column, cfg)?;

    let fit = fit_linear(&features, &y).ok_or_else(|| {
        AppError::NumericalFailure(format!("least squares failed for `{}`", target.column))
    })?;

    let evaluation = evaluate(&features, &y, cfg.test_fraction, cfg.split_seed);
    match &evaluation {
        Some(e) => info!(
            target = %target.column,
            mae = e.mae,
            mse = e.mse,
            n_train = e.n_train,
            n_test = e.n_test,
            "trend model trained"
        ),
        None => info!(target = %target.column, rows = y.len(), "trend model trained (no hold-out)"),
    }

    Ok(FittedTrendModel {
        metric: normalize_metric_key(&target.key),
        target_column: target.column.clone(),
        feature_names: vec![
            "Year".to_string(),
            cfg.population_column.clone(),
            cfg.baseline_column.clone(),
        ],
        intercept: fit.intercept,
        coefficients: fit.coefficients,
        n_rows: y.len(),
        split_seed: cfg.split_seed,
        evaluation,
        trained_at: Utc::now(),
    })
}

/// Rows where the target and every driver are present.
fn training_rows(
    dataset: &HistoricalDataset,
    target_column: &str,
    cfg: &TrendConfig,
) -> Result<(Vec<Vec<f64>>, Vec<f64>), AppError> {
    let column = |name: &str| {
        dataset
            .column_index(name)
            .ok_or_else(|| AppError::DataUnavailable(format!("dataset has no column `{name}`")))
    };
    let target_idx = column(target_column)?;
    let pop_idx = column(&cfg.population_column)?;
    let base_idx = column(&cfg.baseline_column)?;

    let mut features = Vec::new();
    let mut y = Vec::new();
    for r in dataset.records() {
        if let (Some(t), Some(p), Some(b)) = (r.values[target_idx], r.values[pop_idx], r.values[base_idx]) {
            features.push(vec![r.year as f64, p, b]);
            y.push(t);
        }
    }

    if y.len() < MIN_TRAINING_ROWS {
        return Err(AppError::NumericalFailure(format!(
            "`{target_column}` has {} usable rows, need at least {MIN_TRAINING_ROWS}",
            y.len()
        )));
    }
    Ok((features, y))
}

/// Hold-out MAE/MSE from a seeded shuffle split. `None` when the data is too
/// small to leave both sides non-empty.
fn evaluate(features: &[Vec<f64>], y: &[f64], test_fraction: f64, seed: u64) -> Option<Evaluation> {
    let n = y.len();
    let n_test = ((n as f64) * test_fraction).ceil() as usize;
    if n_test == 0 || n_test >= n {
        return None;
    }

    let mut order: Vec<usize> = (0..n).collect();
    order.shuffle(&mut StdRng::seed_from_u64(seed));
    let (test, train) = order.split_at(n_test);

    let train_x: Vec<Vec<f64>> = train.iter().map(|&i| features[i].clone()).collect();
    let train_y: Vec<f64> = train.iter().map(|&i| y[i]).collect();
    let fit = fit_linear(&train_x, &train_y)?;

    let actual: Vec<f64> = test.iter().map(|&i| y[i]).collect();
    let predicted: Vec<f64> = test.iter().map(|&i| fit.predict(&features[i])).collect();

    Some(Evaluation {
        mae: mean_absolute_error(&actual, &predicted),
        mse: mean_squared_error(&actual, &predicted),
        n_train: train.len(),
        n_test: test.len(),
    })
}

/// Projected drivers for every year in `[start, end]`; empty when `start > end`.
pub fn project_drivers(
    dataset: &HistoricalDataset,
    cfg: &TrendConfig,
    start: i32,
    end: i32,
) -> Result<Vec<DriverRow>, AppError> {
    if start > end {
        return Ok(Vec::new());
    }
    let last_year = dataset
        .last_year()
        .ok_or_else(|| AppError::DataUnavailable("dataset is empty".to_string()))?;

    let (pop_last, pop_rate) = driver_growth(dataset, &cfg.population_column)?;
    let (base_last, base_rate) = driver_growth(dataset, &cfg.baseline_column)?;
    debug!(pop_rate, base_rate, last_year, "driver growth rates");

    (start..=end)
        .map(|year| {
            let exponent = year.checked_sub(last_year).ok_or_else(|| {
                AppError::invalid_input(
                    "year",
                    format!("{year} is out of range relative to last historical year {last_year}"),
                )
            })?;
            Ok(DriverRow {
                year,
                population: compound(pop_last, pop_rate, exponent),
                baseline: compound(base_last, base_rate, exponent),
            })
        })
        .collect()
}

/// Last value and mean growth rate of one driver column.
fn driver_growth(dataset: &HistoricalDataset, column: &str) -> Result<(f64, f64), AppError> {
    let undefined = || AppError::GrowthRateUndefined {
        column: column.to_string(),
    };
    let series = dataset.series(column).ok_or_else(undefined)?;
    let rate = mean_growth_rate(&series).ok_or_else(undefined)?;
    let last = series.last().copied().flatten().ok_or_else(undefined)?;
    Ok((last, rate))
}

/// Predict `model` over `[start, end]` using the forward-filled dataset.
pub fn forecast(
    model: &FittedTrendModel,
    dataset: &HistoricalDataset,
    cfg: &TrendConfig,
    start: i32,
    end: i32,
) -> Result<Vec<ForecastPoint>, AppError> {
    let drivers = project_drivers(dataset, cfg, start, end)?;
    Ok(drivers
        .iter()
        .map(|d| ForecastPoint {
            year: d.year,
            value: model.predict(d),
            provenance: dataset
                .record_for_year(d.year)
                .map_or(Provenance::Predicted, |r| r.provenance),
        })
        .collect())
}
