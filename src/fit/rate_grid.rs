//! Decay-rate grid generation.
//!
//! The decay fit seeds its non-linear refinement from a deterministic grid
//! search over the rate `b`: for a fixed `b` the curve is linear in `(a, c)`,
//! so each grid point is a plain least squares solve.

use crate::error::AppError;

/// Generate `steps` log-spaced points between `min` and `max` (inclusive).
pub fn log_space(min: f64, max: f64, steps: usize) -> Result<Vec<f64>, AppError> {
    if !(min.is_finite() && max.is_finite() && min > 0.0 && max > 0.0 && max > min) {
        return Err(AppError::invalid_input(
            "rate range",
            format!("min={min}, max={max} (must be finite, >0, and max>min)"),
        ));
    }
    if steps < 2 {
        return Err(AppError::invalid_input("rate steps", "must be >= 2"));
    }

    let ln_min = min.ln();
    let ln_max = max.ln();
    let step = (ln_max - ln_min) / (steps as f64 - 1.0);

    Ok((0..steps).map(|i| (ln_min + step * i as f64).exp()).collect())
}

/// Candidate decay rates: a log-spaced positive grid plus `0` (flat curve).
pub fn rate_grid(min: f64, max: f64, steps: usize) -> Result<Vec<f64>, AppError> {
    let mut grid = log_space(min, max, steps)?;
    grid.insert(0, 0.0);
    Ok(grid)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_space_includes_endpoints() {
        let v = log_space(0.001, 10.0, 5).unwrap();
        assert!((v[0] - 0.001).abs() < 1e-15);
        assert!((v[v.len() - 1] - 10.0).abs() < 1e-12);
    }

    #[test]
    fn rate_grid_is_sorted_and_starts_flat() {
        let g = rate_grid(0.01, 1.0, 10).unwrap();
        assert_eq!(g[0], 0.0);
        assert_eq!(g.len(), 11);
        assert!(g.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn rejects_bad_range() {
        assert!(log_space(0.0, 1.0, 10).is_err());
        assert!(log_space(1.0, 1.0, 10).is_err());
        assert!(log_space(0.1, 1.0, 1).is_err());
    }
}
