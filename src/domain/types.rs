//! Result and model types shared across components.
//!
//! These types are serializable so an HTTP layer (or the `outlook`
//! binary) can emit them as JSON/CSV without re-shaping.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};

use crate::domain::Provenance;

/// A row-level problem encountered while loading a dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct RowError {
    /// 1-based line (CSV) or element position (JSON store).
    pub line: usize,
    pub message: String,
}

/// One point of a trend forecast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    pub year: i32,
    pub value: f64,
    pub provenance: Provenance,
}

/// Explanatory driver values fed into a trend model for one year.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DriverRow {
    pub year: i32,
    pub population: f64,
    pub baseline: f64,
}

/// Hold-out evaluation of a trained trend model (diagnostics only).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub mae: f64,
    pub mse: f64,
    pub n_train: usize,
    pub n_test: usize,
}

/// Fitted linear coefficients for one target metric.
///
/// `value = intercept + Σ coefficients[i] * feature_i`, with features ordered as
/// `feature_names` (year, population, non-renewable baseline).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FittedTrendModel {
    /// Normalized metric key (model store key).
    pub metric: String,
    pub target_column: String,
    pub feature_names: Vec<String>,
    pub intercept: f64,
    pub coefficients: Vec<f64>,
    pub n_rows: usize,
    pub split_seed: u64,
    pub evaluation: Option<Evaluation>,
    pub trained_at: DateTime<Utc>,
}

impl FittedTrendModel {
    pub fn predict(&self, row: &DriverRow) -> f64 {
        let features = [row.year as f64, row.population, row.baseline];
        self.intercept
            + self
                .coefficients
                .iter()
                .zip(features.iter())
                .map(|(b, x)| b * x)
                .sum::<f64>()
    }
}

/// What a regional row measures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegionalKind {
    /// A directly forecast metric column.
    Metric,
    /// Consumption derived from the generation share of the aggregate region.
    EstimatedConsumption,
}

/// One row of the regional disaggregation output.
///
/// `value` is `None` when the quantity is undefined for that year (aggregate
/// forecast missing, or zero aggregate generation); it serializes as `null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionalEstimate {
    pub year: i32,
    pub region: String,
    pub label: String,
    pub kind: RegionalKind,
    pub value: Option<f64>,
}

/// A non-fatal note attached to a partial result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub subject: String,
    pub message: String,
}

impl Diagnostic {
    pub fn new(subject: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionalForecast {
    pub target_year: i32,
    pub rows: Vec<RegionalEstimate>,
    pub diagnostics: Vec<Diagnostic>,
}

impl RegionalForecast {
    pub fn regions(&self) -> Vec<&str> {
        let mut out: Vec<&str> = Vec::new();
        for r in &self.rows {
            if !out.contains(&r.region.as_str()) {
                out.push(&r.region);
            }
        }
        out
    }
}

/// Years needed to recover an investment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PaybackPeriod {
    Years(f64),
    /// Savings are zero or negative: the investment never pays back.
    Never,
}

impl PaybackPeriod {
    pub fn is_never(self) -> bool {
        matches!(self, PaybackPeriod::Never)
    }
}

impl Serialize for PaybackPeriod {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            PaybackPeriod::Years(y) => serializer.serialize_f64(*y),
            PaybackPeriod::Never => serializer.serialize_str("never"),
        }
    }
}

/// Full output of an investment recommendation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InvestmentResult {
    pub year: i32,
    pub budget: f64,
    /// Floor-clamped unit technology cost (per unit of capacity).
    pub predicted_unit_cost: f64,
    /// Non-negative unit utility price (per kWh).
    pub predicted_unit_price: f64,
    pub capacity: f64,
    pub yearly_output: f64,
    pub yearly_savings: f64,
    pub payback: PaybackPeriod,
}
