//! Curve fitting for the Investment Recommender.
//!
//! - `rate_grid`: deterministic candidate decay rates
//! - `decay`: grid-seeded Levenberg–Marquardt fit of the cost curve
//! - `polynomial`: least squares quadratic for the price curve

pub mod decay;
pub mod polynomial;
pub mod rate_grid;

pub use decay::*;
pub use polynomial::*;
pub use rate_grid::*;
