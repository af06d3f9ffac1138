//! Ordinary least squares.
//!
//! Every regression in the engine (trend models, per-region year trends, the
//! quadratic price curve, the linear step of the decay fit) reduces to:
//!
//! ```text
//! minimize Σ (y_i - β0 - x_i^T β)^2
//! ```
//!
//! Implementation choices:
//! - Features and target are centered before solving and the intercept is
//!   recovered afterwards. Raw calendar years (~2000) next to an intercept
//!   column make the design badly conditioned otherwise.
//! - The centered system is solved by SVD, which handles tall, wide and
//!   rank-deficient designs; directions with negligible singular values are
//!   dropped, giving the minimum-norm solution (a constant feature gets a zero
//!   coefficient).

use nalgebra::{DMatrix, DVector};

/// Relative singular-value cutoffs, tried from strict to loose.
const RCOND: [f64; 3] = [1e-12, 1e-10, 1e-8];

/// Solve a least squares problem `x β ≈ y` using SVD.
///
/// Returns `None` if no finite solution is found.
pub fn solve_least_squares(x: &DMatrix<f64>, y: &DVector<f64>) -> Option<DVector<f64>> {
    if x.nrows() != y.len() || x.ncols() == 0 {
        return None;
    }
    let svd = x.clone().svd(true, true);
    let s_max = svd.singular_values.iter().copied().fold(0.0, f64::max);
    if s_max == 0.0 {
        return Some(DVector::zeros(x.ncols()));
    }

    for &rcond in &RCOND {
        if let Ok(beta) = svd.solve(y, rcond * s_max) {
            if beta.iter().all(|v| v.is_finite()) {
                return Some(beta);
            }
        }
    }

    None
}

/// Coefficients of a fitted linear model with intercept.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearFit {
    pub intercept: f64,
    pub coefficients: Vec<f64>,
}

impl LinearFit {
    pub fn predict(&self, features: &[f64]) -> f64 {
        self.intercept
            + self
                .coefficients
                .iter()
                .zip(features)
                .map(|(b, x)| b * x)
                .sum::<f64>()
    }
}

/// Fit `y = β0 + Σ βj xj` by least squares.
///
/// `rows[i]` holds the features of observation `i`; every row must have the
/// same length. Returns `None` for empty input, ragged rows, non-finite values
/// or a failed solve.
pub fn fit_linear(rows: &[Vec<f64>], y: &[f64]) -> Option<LinearFit> {
    let n = rows.len();
    if n == 0 || n != y.len() {
        return None;
    }
    let p = rows[0].len();
    if rows.iter().any(|r| r.len() != p) {
        return None;
    }
    if rows.iter().flatten().chain(y).any(|v| !v.is_finite()) {
        return None;
    }

    let y_mean = y.iter().sum::<f64>() / n as f64;
    if p == 0 {
        return Some(LinearFit {
            intercept: y_mean,
            coefficients: Vec::new(),
        });
    }

    let means: Vec<f64> = (0..p)
        .map(|j| rows.iter().map(|r| r[j]).sum::<f64>() / n as f64)
        .collect();

    let x = DMatrix::from_fn(n, p, |i, j| rows[i][j] - means[j]);
    let yc = DVector::from_fn(n, |i, _| y[i] - y_mean);

    let beta = solve_least_squares(&x, &yc)?;
    let coefficients: Vec<f64> = beta.iter().copied().collect();
    let intercept = y_mean
        - coefficients
            .iter()
            .zip(&means)
            .map(|(b, m)| b * m)
            .sum::<f64>();

    intercept.is_finite().then_some(LinearFit {
        intercept,
        coefficients,
    })
}

/// Fit `y = a + b x` (single feature convenience).
pub fn fit_line(x: &[f64], y: &[f64]) -> Option<LinearFit> {
    let rows: Vec<Vec<f64>> = x.iter().map(|&v| vec![v]).collect();
    fit_linear(&rows, y)
}
