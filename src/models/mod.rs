//! Curve families fitted by the Investment Recommender.
//!
//! Models are small value types with pure evaluation functions so the fitting
//! code can stay generic.

pub mod curves;

pub use curves::*;
