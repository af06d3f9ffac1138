//! Domain types used throughout the pipeline.
//!
//! - the historical table (`HistoricalDataset`, `HistoricalRecord`, `Provenance`)
//! - fitted trend models and forecast points
//! - regional rows and diagnostics
//! - investment results

pub mod dataset;
pub mod types;

pub use dataset::*;
pub use types::*;
