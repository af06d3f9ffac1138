//! Forecasting components over the historical dataset.
//!
//! - `trend`: per-metric linear model over year, population and baseline
//! - `regional`: per-sub-region year trends and share-based consumption

pub mod regional;
pub mod trend;
