//! Input/output helpers.
//!
//! - backing stores for historical tables (`source`)
//! - the Dataset Loader (`ingest`)
//! - result exports (CSV/JSON) (`export`)

pub mod export;
pub mod ingest;
pub mod source;

pub use export::*;
pub use ingest::*;
pub use source::*;
