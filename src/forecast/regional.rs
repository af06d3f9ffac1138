//! Regional Disaggregator.
//!
//! Every `(sub-region, metric)` pair gets its own straight-line trend against
//! year, fitted on the raw (not forward-filled) observations of its column.
//! Only the target year is evaluated, and only when it lies strictly after the
//! pair's last observation; a target at or before that year yields nothing for
//! the pair.
//!
//! Estimated consumption of a sub-region is its share of the aggregate
//! region's forecast generation applied to the aggregate forecast consumption.
//! Years where the aggregate forecast is missing, or aggregate generation is
//! zero, are reported as undefined (`None`).
//!
//! Columns follow the `"{region} {metric}"` convention. The mapping is resolved
//! once per dataset into a [`ColumnMap`], so a missing sub-region is known
//! before any fitting starts.

use rayon::prelude::*;
use tracing::{debug, warn};

use crate::config::RegionalConfig;
use crate::domain::{Diagnostic, HistoricalDataset, RegionalEstimate, RegionalForecast, RegionalKind};
use crate::error::AppError;
use crate::math::{LinearFit, fit_line};

/// Columns present for one sub-region, in configured metric order.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionColumns {
    pub region: String,
    /// `(metric, column name)` pairs.
    pub columns: Vec<(String, String)>,
}

impl RegionColumns {
    pub fn column_for(&self, metric: &str) -> Option<&str> {
        self.columns
            .iter()
            .find(|(m, _)| m == metric)
            .map(|(_, c)| c.as_str())
    }
}

/// `(region, metric) -> column` mapping for one dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnMap {
    pub regions: Vec<RegionColumns>,
    /// Configured sub-regions with none of their columns present.
    pub missing: Vec<String>,
}

impl ColumnMap {
    pub fn resolve(dataset: &HistoricalDataset, cfg: &RegionalConfig) -> Self {
        let mut regions = Vec::new();
        let mut missing = Vec::new();
        for region in &cfg.sub_regions {
            let columns: Vec<(String, String)> = cfg
                .metrics
                .iter()
                .filter_map(|metric| {
                    let name = column_name(region, metric);
                    dataset.has_column(&name).then(|| (metric.clone(), name))
                })
                .collect();
            if columns.is_empty() {
                missing.push(region.clone());
            } else {
                regions.push(RegionColumns {
                    region: region.clone(),
                    columns,
                });
            }
        }
        Self { regions, missing }
    }
}

pub fn column_name(region: &str, metric: &str) -> String {
    format!("{region} {metric}")
}

pub fn consumption_label(region: &str) -> String {
    format!("{region} Estimated Consumption (GWh)")
}

/// Straight-line trend of one column against year.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnTrend {
    pub last_year: i32,
    pub fit: LinearFit,
}

impl ColumnTrend {
    /// `None` when the series has no observations or the fit fails.
    pub fn fit(series: &[(i32, f64)]) -> Option<Self> {
        let last_year = series.iter().map(|(y, _)| *y).max()?;
        let (x, y): (Vec<f64>, Vec<f64>) = series.iter().map(|&(yr, v)| (yr as f64, v)).unzip();
        let fit = fit_line(&x, &y)?;
        Some(Self { last_year, fit })
    }

    /// Trend value at `year`, only for years strictly after the last observation.
    pub fn predict_after_last(&self, year: i32) -> Option<f64> {
        (year > self.last_year).then(|| self.fit.predict(&[year as f64]))
    }
}

/// Trend of one aggregate column.
fn aggregate_trend(dataset: &HistoricalDataset, column: &str) -> Result<ColumnTrend, AppError> {
    let series = dataset.observed(column).ok_or_else(|| {
        AppError::NumericalFailure(format!("aggregate column `{column}` is absent"))
    })?;
    ColumnTrend::fit(&series).ok_or_else(|| {
        AppError::NumericalFailure(format!("aggregate column `{column}` has no usable observations"))
    })
}

/// Sub-region share of aggregate consumption; `None` when undefined.
pub fn estimated_consumption(
    region_generation: f64,
    aggregate_generation: Option<f64>,
    aggregate_consumption: Option<f64>,
) -> Option<f64> {
    let total = aggregate_generation?;
    let consumption = aggregate_consumption?;
    if total == 0.0 {
        return None;
    }
    let value = region_generation / total * consumption;
    value.is_finite().then_some(value)
}

/// Disaggregate the raw dataset for `target_year`.
pub fn disaggregate(
    dataset: &HistoricalDataset,
    cfg: &RegionalConfig,
    target_year: i32,
) -> Result<RegionalForecast, AppError> {
    let map = ColumnMap::resolve(dataset, cfg);
    let aggregate = Aggregate {
        generation: aggregate_trend(dataset, &cfg.aggregate_generation_column())?.predict_after_last(target_year),
        consumption: aggregate_trend(dataset, &cfg.aggregate_consumption_column())?.predict_after_last(target_year),
    };

    let mut diagnostics: Vec<Diagnostic> = map
        .missing
        .iter()
        .map(|region| {
            warn!(%region, "no columns for sub-region; skipped");
            Diagnostic::new(region.clone(), "no columns found for sub-region; skipped")
        })
        .collect();

    let per_region: Vec<(Vec<RegionalEstimate>, Vec<Diagnostic>)> = map
        .regions
        .par_iter()
        .map(|columns| forecast_region(dataset, cfg, columns, target_year, aggregate))
        .collect();

    let mut rows = Vec::new();
    for (region_rows, region_diags) in per_region {
        rows.extend(region_rows);
        diagnostics.extend(region_diags);
    }
    debug!(target_year, rows = rows.len(), skipped = map.missing.len(), "regional forecast");

    Ok(RegionalForecast {
        target_year,
        rows,
        diagnostics,
    })
}

/// Aggregate forecasts at the target year.
#[derive(Debug, Clone, Copy)]
struct Aggregate {
    generation: Option<f64>,
    consumption: Option<f64>,
}

fn forecast_region(
    dataset: &HistoricalDataset,
    cfg: &RegionalConfig,
    columns: &RegionColumns,
    target_year: i32,
    aggregate: Aggregate,
) -> (Vec<RegionalEstimate>, Vec<Diagnostic>) {
    let region = &columns.region;
    let mut rows = Vec::new();
    let mut diagnostics = Vec::new();

    for (metric, column) in &columns.columns {
        let series = dataset.observed(column).unwrap_or_default();
        let Some(trend) = ColumnTrend::fit(&series) else {
            diagnostics.push(Diagnostic::new(
                region.clone(),
                format!("`{column}` has no observations; metric skipped"),
            ));
            continue;
        };
        let Some(value) = trend.predict_after_last(target_year) else {
            continue;
        };

        rows.push(RegionalEstimate {
            year: target_year,
            region: region.clone(),
            label: metric.clone(),
            kind: RegionalKind::Metric,
            value: Some(value),
        });

        if *metric == cfg.generation_metric {
            rows.push(RegionalEstimate {
                year: target_year,
                region: region.clone(),
                label: consumption_label(region),
                kind: RegionalKind::EstimatedConsumption,
                value: estimated_consumption(value, aggregate.generation, aggregate.consumption),
            });
        }
    }

    if columns.column_for(&cfg.generation_metric).is_none() {
        diagnostics.push(Diagnostic::new(
            region.clone(),
            format!("no `{}` column; consumption not estimated", cfg.generation_metric),
        ));
    }

    (rows, diagnostics)
}
