//! Investment Recommender.
//!
//! Two curves are fitted to the cost/price dataset:
//!
//! - unit technology cost: `a * exp(-b * (year - min_year)) + c`, clamped to a
//!   configured floor when queried
//! - unit utility price: quadratic in year, clamped to be non-negative
//!
//! Fitting happens once per dataset snapshot. [`CurveCache`] keeps the fitted
//! pair keyed by the dataset fingerprint and refits only when the data changes
//! or the cache is explicitly invalidated.

use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, info};

use crate::config::InvestmentConfig;
use crate::domain::{HistoricalDataset, InvestmentResult, PaybackPeriod};
use crate::error::AppError;
use crate::fit::{DecayFitOptions, fit_exponential_decay, fit_quadratic};
use crate::models::{ExponentialDecay, Quadratic};

const DAYS_PER_YEAR: f64 = 365.0;

/// Fitted cost and price curves for one dataset snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct InvestmentCurveModel {
    pub cost: ExponentialDecay,
    pub price: Quadratic,
}

impl InvestmentCurveModel {
    pub fn fit(dataset: &HistoricalDataset, cfg: &InvestmentConfig) -> Result<Self, AppError> {
        let (cost_years, cost_values) = observed_xy(dataset, &cfg.cost_column, cfg.cost_scale)?;
        let (price_years, price_values) = observed_xy(dataset, &cfg.price_column, 1.0)?;

        let opts = DecayFitOptions {
            max_evaluations: cfg.max_evaluations,
            ..DecayFitOptions::default()
        };
        let cost = fit_exponential_decay(&cost_years, &cost_values, &opts)?;
        let price = fit_quadratic(&price_years, &price_values)?;

        info!(
            a = cost.curve.a,
            b = cost.curve.b,
            c = cost.curve.c,
            rmse = cost.rmse,
            evaluations = cost.evaluations,
            "cost curve fitted"
        );
        debug!(c0 = price.c0, c1 = price.c1, c2 = price.c2, "price curve fitted");

        Ok(Self {
            cost: cost.curve,
            price,
        })
    }

    /// Predicted unit cost, never below `floor`.
    pub fn unit_cost(&self, year: i32, floor: f64) -> f64 {
        self.cost.eval(year as f64).max(floor)
    }

    /// Predicted unit price, never negative.
    pub fn unit_price(&self, year: i32) -> f64 {
        self.price.eval(year as f64).max(0.0)
    }
}

fn observed_xy(
    dataset: &HistoricalDataset,
    column: &str,
    scale: f64,
) -> Result<(Vec<f64>, Vec<f64>), AppError> {
    let observed = dataset
        .observed(column)
        .ok_or_else(|| AppError::DataUnavailable(format!("cost dataset has no column `{column}`")))?;
    Ok(observed
        .into_iter()
        .map(|(year, v)| (year as f64, v * scale))
        .unzip())
}

pub fn validate_budget(budget: f64) -> Result<(), AppError> {
    if budget.is_finite() && budget > 0.0 {
        Ok(())
    } else {
        Err(AppError::InvalidBudget(budget))
    }
}

/// Capacity, output, savings and payback for `budget` invested in `year`.
pub fn recommend(
    model: &InvestmentCurveModel,
    cfg: &InvestmentConfig,
    budget: f64,
    year: i32,
) -> Result<InvestmentResult, AppError> {
    validate_budget(budget)?;

    let unit_cost = model.unit_cost(year, cfg.cost_floor);
    let unit_price = model.unit_price(year);

    let capacity = if unit_cost > 0.0 { budget / unit_cost } else { 0.0 };
    let yearly_output = capacity * cfg.daily_yield_per_unit * DAYS_PER_YEAR;
    let yearly_savings = yearly_output * unit_price;
    let payback = if yearly_savings > 0.0 {
        PaybackPeriod::Years(budget / yearly_savings)
    } else {
        PaybackPeriod::Never
    };

    Ok(InvestmentResult {
        year,
        budget,
        predicted_unit_cost: unit_cost,
        predicted_unit_price: unit_price,
        capacity,
        yearly_output,
        yearly_savings,
        payback,
    })
}

/// Fitted curves for the most recent dataset snapshot.
#[derive(Debug, Default)]
pub struct CurveCache {
    slot: RwLock<Option<(u64, Arc<InvestmentCurveModel>)>>,
}

impl CurveCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached curves for `dataset`, fitting them on a miss.
    pub fn get_or_fit(
        &self,
        dataset: &HistoricalDataset,
        cfg: &InvestmentConfig,
    ) -> Result<Arc<InvestmentCurveModel>, AppError> {
        let fingerprint = dataset.fingerprint();
        if let Some((fp, model)) = self.slot.read().as_ref() {
            if *fp == fingerprint {
                debug!(fingerprint, "curve cache hit");
                return Ok(Arc::clone(model));
            }
        }

        debug!(fingerprint, "curve cache miss");
        let model = Arc::new(InvestmentCurveModel::fit(dataset, cfg)?);
        *self.slot.write() = Some((fingerprint, Arc::clone(&model)));
        Ok(model)
    }

    pub fn invalidate(&self) {
        if self.slot.write().take().is_some() {
            debug!("curve cache invalidated");
        }
    }

    pub fn is_cached(&self) -> bool {
        self.slot.read().is_some()
    }
}
