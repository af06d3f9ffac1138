//! Non-linear least squares fit of `a * exp(-b * (year - origin)) + c`.
//!
//! Two stages:
//!
//! 1. Grid search over `b`. For each candidate rate the curve is linear in
//!    `(a, c)`, solved by OLS; candidates are evaluated in parallel and the
//!    lowest SSE wins (ties broken by grid index, so the result is
//!    deterministic).
//! 2. Levenberg–Marquardt refinement of `(a, b, c)` jointly, starting from the
//!    grid winner, with a hard evaluation budget. Exhausting the budget
//!    without meeting a convergence test is a `FitFailure`.

use nalgebra::{Matrix3, Vector3};
use rayon::prelude::*;
use tracing::debug;

use crate::error::AppError;
use crate::fit::rate_grid::rate_grid;
use crate::math::fit_line;
use crate::models::ExponentialDecay;

/// Fewest observations for three free parameters.
const MIN_POINTS: usize = 3;

/// Relative SSE reduction below which an accepted step counts as converged.
const FTOL: f64 = 1e-10;
/// Relative step size below which an accepted step counts as converged.
const XTOL: f64 = 1e-10;
const LAMBDA_INIT: f64 = 1e-3;
/// Damping beyond which no descent direction is left (stationary point).
const LAMBDA_MAX: f64 = 1e16;

#[derive(Debug, Clone)]
pub struct DecayFitOptions {
    pub rate_min: f64,
    pub rate_max: f64,
    pub rate_steps: usize,
    /// Budget of objective evaluations for the refinement stage.
    pub max_evaluations: usize,
}

impl Default for DecayFitOptions {
    fn default() -> Self {
        Self {
            rate_min: 1e-3,
            rate_max: 5.0,
            rate_steps: 120,
            max_evaluations: 5000,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DecayFit {
    pub curve: ExponentialDecay,
    pub sse: f64,
    pub rmse: f64,
    pub evaluations: usize,
}

#[derive(Debug, Clone)]
struct Candidate {
    idx: usize,
    curve: ExponentialDecay,
    sse: f64,
}

/// Fit the decay curve to `(year, value)` observations.
pub fn fit_exponential_decay(
    years: &[f64],
    values: &[f64],
    opts: &DecayFitOptions,
) -> Result<DecayFit, AppError> {
    if years.len() != values.len() {
        return Err(AppError::FitFailure(format!(
            "mismatched inputs: {} years vs {} values",
            years.len(),
            values.len()
        )));
    }
    if years.len() < MIN_POINTS {
        return Err(AppError::FitFailure(format!(
            "decay curve needs at least {MIN_POINTS} observations, got {}",
            years.len()
        )));
    }
    if years.iter().chain(values).any(|v| !v.is_finite()) {
        return Err(AppError::FitFailure("non-finite observation".to_string()));
    }

    let origin = years.iter().copied().fold(f64::INFINITY, f64::min);
    let grid = rate_grid(opts.rate_min, opts.rate_max, opts.rate_steps)?;

    let seed = grid_search(years, values, origin, &grid).ok_or_else(|| {
        AppError::FitFailure("no valid decay candidates on the rate grid".to_string())
    })?;
    debug!(rate = seed.curve.b, sse = seed.sse, "decay grid seed");

    let (curve, sse, evaluations) = refine(years, values, seed.curve, opts.max_evaluations)?;
    let rmse = (sse / years.len() as f64).sqrt();

    Ok(DecayFit {
        curve,
        sse,
        rmse,
        evaluations,
    })
}

fn grid_search(years: &[f64], values: &[f64], origin: f64, grid: &[f64]) -> Option<Candidate> {
    let candidates: Vec<Candidate> = grid
        .par_iter()
        .enumerate()
        .filter_map(|(idx, &b)| {
            let basis: Vec<f64> = years.iter().map(|y| (-b * (y - origin)).exp()).collect();
            let line = fit_line(&basis, values)?;
            let curve = ExponentialDecay {
                a: line.coefficients[0],
                b,
                c: line.intercept,
                origin,
            };
            let sse = sse(&curve, years, values);
            sse.is_finite().then_some(Candidate { idx, curve, sse })
        })
        .collect();

    let mut best = candidates.first()?;
    for c in &candidates[1..] {
        if c.sse < best.sse || (c.sse == best.sse && c.idx < best.idx) {
            best = c;
        }
    }
    Some(best.clone())
}

fn refine(
    years: &[f64],
    values: &[f64],
    start: ExponentialDecay,
    max_evaluations: usize,
) -> Result<(ExponentialDecay, f64, usize), AppError> {
    let mut curve = start;
    let mut cost = sse(&curve, years, values);
    let mut evaluations = 1usize;
    let mut lambda = LAMBDA_INIT;

    let scale: f64 = values.iter().map(|v| v * v).sum();
    let exact = f64::EPSILON * scale.max(f64::MIN_POSITIVE);

    loop {
        if cost <= exact {
            return Ok((curve, cost, evaluations));
        }

        let (jtj, g) = normal_equations(&curve, years, values);
        if g.amax() <= 1e-12 * (1.0 + cost) {
            return Ok((curve, cost, evaluations));
        }

        // Inner loop: raise damping until a step reduces the cost.
        loop {
            if evaluations >= max_evaluations {
                return Err(AppError::FitFailure(format!(
                    "decay refinement did not converge within {max_evaluations} evaluations"
                )));
            }
            if lambda > LAMBDA_MAX {
                // No descent direction left: local minimum.
                return Ok((curve, cost, evaluations));
            }

            let mut damped = jtj;
            for i in 0..3 {
                damped[(i, i)] += lambda * jtj[(i, i)].max(1e-12);
            }

            let Some(delta) = damped.lu().solve(&g) else {
                lambda *= 10.0;
                continue;
            };

            let p = Vector3::from(curve.params());
            let p_new = p + delta;
            let candidate = curve.with_params([p_new[0], p_new[1], p_new[2]]);
            let new_cost = sse(&candidate, years, values);
            evaluations += 1;

            if new_cost.is_finite() && new_cost < cost {
                let reduction = cost - new_cost;
                let small_step = delta.norm() <= XTOL * (p.norm() + XTOL);
                curve = candidate;
                cost = new_cost;
                lambda = (lambda / 10.0).max(1e-12);
                if reduction <= FTOL * cost || small_step {
                    return Ok((curve, cost, evaluations));
                }
                break;
            }

            lambda *= 10.0;
        }
    }
}

/// `JᵀJ` and `Jᵀr` for residuals `r = y - f(x)`.
fn normal_equations(curve: &ExponentialDecay, years: &[f64], values: &[f64]) -> (Matrix3<f64>, Vector3<f64>) {
    let mut jtj = Matrix3::zeros();
    let mut g = Vector3::zeros();
    for (&x, &y) in years.iter().zip(values) {
        let j = Vector3::from(curve.gradient(x));
        let r = y - curve.eval(x);
        jtj += j * j.transpose();
        g += j * r;
    }
    (jtj, g)
}

fn sse(curve: &ExponentialDecay, years: &[f64], values: &[f64]) -> f64 {
    years
        .iter()
        .zip(values)
        .map(|(&x, &y)| (y - curve.eval(x)).powi(2))
        .sum()
}
