use crate::error::AppError;
use crate::math::fit_linear;
use crate::models::Quadratic;

/// Least squares degree-2 polynomial in `year - min(year)`.
pub fn fit_quadratic(years: &[f64], values: &[f64]) -> Result<Quadratic, AppError> {
    if years.len() != values.len() || years.is_empty() {
        return Err(AppError::FitFailure(format!(
            "quadratic fit needs matching, non-empty inputs ({} years, {} values)",
            years.len(),
            values.len()
        )));
    }
    let origin = years.iter().copied().fold(f64::INFINITY, f64::min);
    let rows: Vec<Vec<f64>> = years
        .iter()
        .map(|y| {
            let t = y - origin;
            vec![t, t * t]
        })
        .collect();

    let fit = fit_linear(&rows, values)
        .ok_or_else(|| AppError::FitFailure("quadratic least squares failed".to_string()))?;

    Ok(Quadratic {
        c0: fit.intercept,
        c1: fit.coefficients[0],
        c2: fit.coefficients[1],
        origin,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recovers_exact_parabola() {
        let years: Vec<f64> = (2012..=2022).map(f64::from).collect();
        let values: Vec<f64> = years
            .iter()
            .map(|y| {
                let t = y - 2012.0;
                9.5 + 0.4 * t - 0.02 * t * t
            })
            .collect();
        let q = fit_quadratic(&years, &values).unwrap();
        assert_eq!(q.origin, 2012.0);
        assert!((q.c0 - 9.5).abs() < 1e-8);
        assert!((q.c1 - 0.4).abs() < 1e-8);
        assert!((q.c2 + 0.02).abs() < 1e-8);
    }

    #[test]
    fn two_points_give_a_line_through_both() {
        let q = fit_quadratic(&[2020.0, 2021.0], &[10.0, 12.0]).unwrap();
        assert!((q.eval(2020.0) - 10.0).abs() < 1e-9);
        assert!((q.eval(2021.0) - 12.0).abs() < 1e-9);
    }

    #[test]
    fn empty_input_is_fit_failure() {
        assert!(matches!(
            fit_quadratic(&[], &[]),
            Err(AppError::FitFailure(_))
        ));
    }
}
