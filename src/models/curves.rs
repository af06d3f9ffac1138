//! Closed-form curve families used by the Investment Recommender.
//!
//! Both curves are evaluated against calendar years shifted by an origin
//! (`year - origin`) so exponents and squares stay small.

use serde::{Deserialize, Serialize};

/// `value = a * exp(-b * (year - origin)) + c`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExponentialDecay {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    /// Earliest historical year.
    pub origin: f64,
}

impl ExponentialDecay {
    pub fn eval(&self, year: f64) -> f64 {
        self.a * (-self.b * (year - self.origin)).exp() + self.c
    }

    /// Partial derivatives with respect to `(a, b, c)`.
    pub fn gradient(&self, year: f64) -> [f64; 3] {
        let t = year - self.origin;
        let e = (-self.b * t).exp();
        [e, -self.a * t * e, 1.0]
    }

    pub fn params(&self) -> [f64; 3] {
        [self.a, self.b, self.c]
    }

    pub fn with_params(&self, p: [f64; 3]) -> Self {
        Self {
            a: p[0],
            b: p[1],
            c: p[2],
            origin: self.origin,
        }
    }
}

/// `value = c0 + c1 * (year - origin) + c2 * (year - origin)^2`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quadratic {
    pub c0: f64,
    pub c1: f64,
    pub c2: f64,
    pub origin: f64,
}

impl Quadratic {
    pub fn eval(&self, year: f64) -> f64 {
        let t = year - self.origin;
        self.c0 + self.c1 * t + self.c2 * t * t
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decay_at_origin_is_a_plus_c() {
        let d = ExponentialDecay {
            a: 100.0,
            b: 0.3,
            c: 20.0,
            origin: 2010.0,
        };
        assert!((d.eval(2010.0) - 120.0).abs() < 1e-12);
        assert!(d.eval(2100.0) > 20.0 && d.eval(2100.0) < 20.001);
    }

    #[test]
    fn decay_gradient_matches_finite_difference() {
        let d = ExponentialDecay {
            a: 50.0,
            b: 0.2,
            c: 5.0,
            origin: 2000.0,
        };
        let g = d.gradient(2007.0);
        let h = 1e-6;
        let fd_b = (d.with_params([50.0, 0.2 + h, 5.0]).eval(2007.0) - d.eval(2007.0)) / h;
        assert!((g[1] - fd_b).abs() < 1e-2);
        assert_eq!(g[2], 1.0);
    }

    #[test]
    fn quadratic_eval() {
        let q = Quadratic {
            c0: 1.0,
            c1: 2.0,
            c2: 3.0,
            origin: 2000.0,
        };
        assert_eq!(q.eval(2002.0), 1.0 + 4.0 + 12.0);
    }
}
