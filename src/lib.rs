//! `energy-outlook` library crate.
//!
//! The binary (`outlook`) is a thin wrapper around this library so that:
//!
//! - the forecasting engine is testable without spawning processes
//! - an HTTP layer or notebook can embed [`app::pipeline::Pipeline`] directly
//!
//! Components, leaf-first: `io` (Dataset Loader), `forecast::trend`,
//! `forecast::regional`, `recommend`, `store` (Model Store).

pub mod app;
pub mod cli;
pub mod config;
pub mod domain;
pub mod error;
pub mod fit;
pub mod forecast;
pub mod io;
pub mod math;
pub mod models;
pub mod recommend;
pub mod report;
pub mod store;
