//! Year-over-year growth rates and compounded projection.

/// Arithmetic mean of successive ratios minus one.
///
/// Pairs where either value is missing, or where the ratio is not finite
/// (zero predecessor), are skipped. Returns `None` if no pair remains.
pub fn mean_growth_rate(series: &[Option<f64>]) -> Option<f64> {
    let rates: Vec<f64> = series
        .windows(2)
        .filter_map(|w| match (w[0], w[1]) {
            (Some(prev), Some(next)) => {
                let r = next / prev - 1.0;
                r.is_finite().then_some(r)
            }
            _ => None,
        })
        .collect();

    if rates.is_empty() {
        return None;
    }
    Some(rates.iter().sum::<f64>() / rates.len() as f64)
}

/// `last * (1 + rate)^exponent`. A negative exponent back-projects.
pub fn compound(last: f64, rate: f64, exponent: i32) -> f64 {
    last * (1.0 + rate).powi(exponent)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mean_of_successive_ratios() {
        let s = [Some(100.0), Some(110.0), Some(121.0)];
        assert!((mean_growth_rate(&s).unwrap() - 0.10).abs() < 1e-12);

        // Arithmetic mean, not geometric: +100% then -50% averages to +25%.
        let s = [Some(1.0), Some(2.0), Some(1.0)];
        assert!((mean_growth_rate(&s).unwrap() - 0.25).abs() < 1e-12);
    }

    #[test]
    fn undefined_for_fewer_than_two_points() {
        assert_eq!(mean_growth_rate(&[Some(5.0)]), None);
        assert_eq!(mean_growth_rate(&[]), None);
        assert_eq!(mean_growth_rate(&[None, Some(5.0)]), None);
    }

    #[test]
    fn zero_predecessor_is_skipped() {
        let s = [Some(0.0), Some(10.0), Some(20.0)];
        assert!((mean_growth_rate(&s).unwrap() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn compound_exponent_zero_is_identity() {
        assert_eq!(compound(123.4, 0.05, 0), 123.4);
        assert!((compound(100.0, 0.1, -1) - 100.0 / 1.1).abs() < 1e-12);
    }
}
