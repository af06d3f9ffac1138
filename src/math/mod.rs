//! Mathematical utilities: least squares, growth rates, error metrics.

pub mod growth;
pub mod metrics;
pub mod ols;

pub use growth::*;
pub use metrics::*;
pub use ols::*;
