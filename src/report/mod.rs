//! Human-readable output of engine results.

pub mod format;
pub mod summary;

pub use format::*;
pub use summary::*;
